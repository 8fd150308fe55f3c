use finplex_core::Platform;

use crate::cli::{CoverageArgs, CoverageView};
use crate::error::CliError;

use super::render;

pub fn run(args: &CoverageArgs, platform: &Platform, pretty: bool) -> Result<(), CliError> {
    let commands = platform.command_map();
    let sep = args.sep.as_deref();
    match args.by {
        CoverageView::Providers => render(&commands.provider_coverage(sep), pretty),
        CoverageView::Commands => render(&commands.command_coverage(sep), pretty),
    }
}
