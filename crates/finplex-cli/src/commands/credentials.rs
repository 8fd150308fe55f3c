use std::io::Write;

use finplex_core::Platform;

use crate::cli::CredentialsArgs;
use crate::error::CliError;

pub fn run(args: &CredentialsArgs, platform: &Platform) -> Result<(), CliError> {
    let credentials = platform.credentials();
    let rendered = if args.reveal {
        credentials.reveal()
    } else {
        credentials.describe()
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
