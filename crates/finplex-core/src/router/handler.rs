use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::envelope::{Envelope, EnvelopeMetadata};
use crate::fetcher::FetchError;
use crate::router::command_context::CommandContext;
use crate::router::query::Query;
use crate::router::Route;
use crate::schema::{Params, SchemaModel};
use crate::secret::{SecretMap, SecretString};
use crate::standard_models::{ResultShape, StandardModel};
use crate::CoreError;

/// Boxed future returned by command handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Envelope<Value>, CoreError>> + Send + 'a>>;

/// One invocation of a route.
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
    pub provider: Option<String>,
    /// Standard and extra parameters as one flat set.
    pub params: Params,
    /// Per-call credentials, layered over the platform's.
    pub credentials: Option<SecretMap>,
    pub passthrough: Params,
}

impl CommandInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_owned());
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_owned(), value.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_credential(mut self, name: &str, value: impl Into<SecretString>) -> Self {
        self.credentials
            .get_or_insert_with(SecretMap::new)
            .insert(name.to_owned(), value.into());
        self
    }

    pub fn with_passthrough(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.passthrough.insert(name.to_owned(), value.into());
        self
    }
}

/// Runs a registered route.
pub trait CommandHandler: Send + Sync {
    fn call<'a>(&'a self, cc: &'a CommandContext, route: &'a Route, input: CommandInput) -> HandlerFuture<'a>;
}

/// Generic handler for every command bound to a standard model.
///
/// Builds a [`Query`], validates the standard parameters against `M::Query`, runs it,
/// validates each record against `M::Data`, and wraps the results in an envelope
/// shaped by `M::SHAPE`.
pub struct ModelCommand<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M> ModelCommand<M> {
    pub fn new() -> Self {
        Self { _model: PhantomData }
    }
}

impl<M> Default for ModelCommand<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: StandardModel> CommandHandler for ModelCommand<M> {
    fn call<'a>(&'a self, cc: &'a CommandContext, route: &'a Route, input: CommandInput) -> HandlerFuture<'a> {
        Box::pin(async move {
            let started = Instant::now();
            let query = Query::new(cc, route, M::NAME, input)?;
            M::Query::from_record(query.standard_params())?;
            let provider = query.provider().to_owned();

            let (records, warnings) = query.execute().await?;
            if records.is_empty() {
                return Err(CoreError::EmptyResults);
            }
            for record in &records {
                check_record::<M>(&provider, record)?;
            }

            let results = shape_results::<M>(&provider, records)?;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            debug!(route = %route.path, provider = %provider, duration_ms, "command completed");

            let metadata = EnvelopeMetadata::new(&route.path, Some(&provider), duration_ms);
            Envelope::new(results)
                .with_provider(provider)
                .with_warnings(warnings)?
                .with_metadata(&metadata)
        })
    }
}

fn check_record<M: StandardModel>(provider: &str, record: &Value) -> Result<(), CoreError> {
    let invalid = |source: FetchError| CoreError::Provider {
        provider: provider.to_owned(),
        model: M::NAME.to_owned(),
        source,
    };
    let Value::Object(map) = record else {
        return Err(invalid(FetchError::parse("provider returned a non-object record")));
    };
    M::Data::from_record(map)
        .map(|_| ())
        .map_err(|error| invalid(FetchError::invalid_record(&error)))
}

/// A single-record model never silently drops extra records.
fn shape_results<M: StandardModel>(provider: &str, mut records: Vec<Value>) -> Result<Value, CoreError> {
    match M::SHAPE {
        ResultShape::List => Ok(Value::Array(records)),
        ResultShape::Single | ResultShape::SingleOrList if records.len() == 1 => Ok(records.remove(0)),
        ResultShape::SingleOrList => Ok(Value::Array(records)),
        ResultShape::Single => Err(CoreError::Provider {
            provider: provider.to_owned(),
            model: M::NAME.to_owned(),
            source: FetchError::internal(format!(
                "{} returns one record but the provider sent {}",
                M::NAME,
                records.len()
            )),
        }),
    }
}

/// Handler backed by a synchronous function, for commands that compute from platform state.
pub struct FnCommand<F> {
    func: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&CommandContext, &Route, CommandInput) -> Result<Envelope<Value>, CoreError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> CommandHandler for FnCommand<F>
where
    F: Fn(&CommandContext, &Route, CommandInput) -> Result<Envelope<Value>, CoreError> + Send + Sync,
{
    fn call<'a>(&'a self, cc: &'a CommandContext, route: &'a Route, input: CommandInput) -> HandlerFuture<'a> {
        Box::pin(async move { (self.func)(cc, route, input) })
    }
}
