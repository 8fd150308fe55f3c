use finplex_core::Platform;

use crate::cli::SchemaArgs;
use crate::error::CliError;

use super::render;

pub fn run(args: &SchemaArgs, platform: &Platform, pretty: bool) -> Result<(), CliError> {
    let route = platform
        .command_map()
        .get_command(&args.path)
        .ok_or_else(|| CliError::Command(format!("route '{}' not found", args.path)))?;
    render(&route.schema(), pretty)
}
