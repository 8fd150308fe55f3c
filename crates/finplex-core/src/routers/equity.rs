//! Equity commands: calendars, analyst estimates and regulatory filings.

use crate::router::{Command, RegistrationContext, Router};
use crate::standard_models::{AnalystEstimates, DiscoveryFilings, DividendCalendar};
use crate::CoreError;

pub fn router(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.include_router(calendar(ctx)?, "/calendar")?;
    router.include_router(estimates(ctx)?, "/estimates")?;
    router.include_router(discovery(ctx)?, "/discovery")?;
    Ok(router)
}

fn calendar(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.command(
        ctx,
        Command::model::<DividendCalendar>(
            "finplex.equity.calendar.calendar_router",
            "dividend",
            "Get historical and upcoming dividend payments. Includes dividend amount, ex-dividend and payment dates.\n\n\
             Parameters\n----------\nstart_date: Start date of the data.\nend_date: End date of the data.",
        ),
    )?;
    Ok(router)
}

fn estimates(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.command(
        ctx,
        Command::model::<AnalystEstimates>(
            "finplex.equity.estimates.estimates_router",
            "consensus",
            "Get consensus analyst estimates of revenue, EBITDA, net income and EPS.\n\n\
             Parameters\n----------\nsymbol: Symbol to get data for.\nperiod: Time period of the data.\nlimit: Number of results.",
        ),
    )?;
    Ok(router)
}

fn discovery(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.command(
        ctx,
        Command::model::<DiscoveryFilings>(
            "finplex.equity.discovery.discovery_router",
            "filings",
            "Get the URLs to SEC filings reported to the EDGAR database, such as 10-K, 10-Q and 8-K.\n\n\
             Parameters\n----------\nform_type: Filter by form type.\nlimit: Number of results.",
        ),
    )?;
    Ok(router)
}
