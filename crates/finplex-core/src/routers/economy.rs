//! Macroeconomic series. GDP commands live under `/gdp`.

use crate::router::{Command, RegistrationContext, Router};
use crate::standard_models::{GdpForecast, GdpNominal, GdpReal};
use crate::CoreError;

pub fn router(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.include_router(gdp(ctx)?, "/gdp")?;
    Ok(router)
}

fn gdp(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    const MODULE: &str = "finplex.economy.gdp.gdp_router";

    let mut router = Router::new("");
    router.command(
        ctx,
        Command::model::<GdpForecast>(
            MODULE,
            "forecast",
            "Get forecasted GDP data.\n\nParameters\n----------\nperiod: Time period of the data.\ntype: Nominal or real GDP.",
        ),
    )?;
    router.command(
        ctx,
        Command::model::<GdpNominal>(
            MODULE,
            "nominal",
            "Get nominal GDP data.\n\nParameters\n----------\nunits: usd or usd_cap.",
        ),
    )?;
    router.command(
        ctx,
        Command::model::<GdpReal>(
            MODULE,
            "real",
            "Get real GDP data.\n\nParameters\n----------\nunits: usd or usd_cap.",
        ),
    )?;
    Ok(router)
}
