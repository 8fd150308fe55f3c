//! # Finplex Core
//!
//! Provider abstraction and route composition for the finplex financial data platform.
//!
//! ## Overview
//!
//! - **Standard models** pair a query schema with a data schema; provider fetchers extend them
//! - **Registry** of installed providers and their per-model fetchers, built once per process
//! - **Query executor** resolving provider and fetcher, filtering credentials and running
//!   the three-stage fetch pipeline
//! - **Route composer** validating command signatures and binding them to a model's
//!   provider choices, parameters and result type
//! - **Credentials** aggregated from providers and extensions into one redacting holder
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Installed providers (FMP, Nasdaq, OECD) |
//! | [`config`] | Settings file and environment configuration |
//! | [`context`] | Assembled platform and its process-wide handle |
//! | [`credentials`] | Credential aggregation and masked rendering |
//! | [`envelope`] | Response envelope, warnings and error body |
//! | [`error`] | Core error types |
//! | [`executor`] | Query execution against the registry |
//! | [`fetcher`] | Fetcher pipeline contract |
//! | [`provider_interface`] | Model catalogue derived from the registry |
//! | [`registry`] | Provider registry and its loader |
//! | [`router`] | Signatures, routes, routers and the command map |
//! | [`routers`] | Installed routers |
//! | [`schema`] | Field schemas and the schema model trait |
//! | [`standard_models`] | Provider-independent model contracts |
//! | [`http_client`], [`retry`], [`throttling`] | Upstream transport |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use finplex_core::{CommandInput, Platform};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = Platform::global()?;
//!     let envelope = platform
//!         .call(
//!             "/equity/calendar/dividend",
//!             CommandInput::new().with_provider("nasdaq"),
//!         )
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! - Credential values are held as [`SecretString`], which always redacts when formatted
//! - Plain credential values exist only inside the executor, after filtering
//! - Request URLs carrying keys are never logged

pub mod adapters;
pub mod config;
pub mod context;
pub mod credentials;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod extension;
pub mod fetcher;
pub mod http_client;
pub mod provider;
pub mod provider_interface;
pub mod provider_policy;
pub mod registry;
pub mod retry;
pub mod router;
pub mod routers;
pub mod schema;
pub mod secret;
pub mod standard_models;
pub mod throttling;

// Configuration and platform assembly
pub use config::{PlatformConfig, RouteDefaults};
pub use context::{CommandResponse, Platform, PlatformBuilder};

// Credentials
pub use credentials::{CredentialOrigin, Credentials, CredentialsLoader};
pub use secret::{SecretMap, SecretString};

// Domain types
pub use domain::{IsoDate, Symbol};

// Envelope types
pub use envelope::{Envelope, EnvelopeMetadata, ErrorResponse, Warning};

// Error types
pub use error::{CoreError, ValidationError};

// Execution
pub use executor::QueryExecutor;
pub use fetcher::{AnyFetcher, FetchError, FetchErrorKind, FetchOptions, Fetcher};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient, StubHttpClient};
pub use retry::{Backoff, RetryConfig, RetryingHttpClient};

// Providers and registry
pub use provider::Provider;
pub use provider_interface::ProviderInterface;
pub use registry::{ProviderExtension, Registry, RegistryLoader};

// Routing
pub use router::{Command, CommandInput, CommandMap, Route, Router, RouterExtension};

// Schemas
pub use schema::{Field, FieldKind, Schema, SchemaModel};
