use crate::router::{Command, RegistrationContext, Router};
use crate::standard_models::CryptoSearch;
use crate::CoreError;

pub fn router(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.command(
        ctx,
        Command::model::<CryptoSearch>(
            "finplex.crypto.crypto_router",
            "search",
            "Search available cryptocurrency pairs within a provider.\n\n\
             Parameters\n----------\nquery: Search query.",
        ),
    )?;
    Ok(router)
}
