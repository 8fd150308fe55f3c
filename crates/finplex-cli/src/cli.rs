//! CLI argument definitions for finplex.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `call` | Invoke a route and print its envelope |
//! | `routes` | List registered routes |
//! | `coverage` | Provider and command coverage |
//! | `providers` | Installed providers with their website and request budget |
//! | `credentials` | Known credentials, masked unless `--reveal` |
//! | `schema` | JSON description of one route |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--debug` | settings | Skip routes bound to unknown models instead of failing |
//! | `--timeout-ms` | settings | Upstream request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! finplex call /equity/calendar/dividend --provider nasdaq -p start_date=2024-01-02
//! finplex coverage --sep .
//! finplex credentials --reveal
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "finplex",
    author,
    version,
    about = "Uniform command surface over financial data providers"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Skip routes bound to unknown models instead of failing startup.
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Upstream request timeout in milliseconds; overrides settings and environment.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Invoke a route.
    ///
    /// # Examples
    ///
    ///   finplex call /equity/calendar/dividend
    ///   finplex call /equity/estimates/consensus --provider fmp -p symbol=AAPL -p limit=4
    Call(CallArgs),

    /// List registered routes with their model and provider choices.
    Routes,

    /// Show which providers serve which commands.
    Coverage(CoverageArgs),

    /// List installed providers, their credentials and request budgets.
    Providers,

    /// Show known credentials and where they were declared.
    Credentials(CredentialsArgs),

    /// Print the JSON description of a route.
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Route path, e.g. /equity/calendar/dividend.
    pub path: String,

    /// Provider to use; defaults to the configured route default or the first provider.
    #[arg(long)]
    pub provider: Option<String>,

    /// Query parameter as key=value. Values are read as JSON when they parse, else as text.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Credential for this call only, as name=value.
    #[arg(long = "credential", value_name = "NAME=VALUE")]
    pub credentials: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CoverageArgs {
    /// Group by provider or by command.
    #[arg(long, value_enum, default_value_t = CoverageView::Providers)]
    pub by: CoverageView,

    /// Render command paths with this separator instead of '/'.
    #[arg(long)]
    pub sep: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoverageView {
    Providers,
    Commands,
}

#[derive(Debug, Args)]
pub struct CredentialsArgs {
    /// Print raw values instead of masks.
    #[arg(long, default_value_t = false)]
    pub reveal: bool,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Route path.
    pub path: String,
}
