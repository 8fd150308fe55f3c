mod call;
mod coverage;
mod credentials;
mod providers;
mod routes;
mod schema;

use std::io::Write;

use finplex_core::{Platform, PlatformConfig};
use serde::Serialize;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let platform = build_platform(cli)?;
    match &cli.command {
        Command::Call(args) => call::run(args, &platform, cli.pretty).await,
        Command::Routes => routes::run(&platform, cli.pretty),
        Command::Coverage(args) => coverage::run(args, &platform, cli.pretty),
        Command::Providers => providers::run(&platform, cli.pretty),
        Command::Credentials(args) => credentials::run(args, &platform),
        Command::Schema(args) => schema::run(args, &platform, cli.pretty),
    }
}

/// Settings file and environment, then CLI flags on top.
fn build_platform(cli: &Cli) -> Result<Platform, CliError> {
    let mut config = PlatformConfig::load()?;
    if cli.debug {
        config.debug_mode = true;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.http.timeout_ms = timeout_ms;
    }
    Ok(Platform::builder().with_config(config).build()?)
}

pub(crate) fn render<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
