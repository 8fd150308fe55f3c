//! Provider fetcher contract: transform query, extract raw data, transform data.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use crate::http_client::HttpError;
use crate::schema::{Data, Params, QueryParams, Schema, SchemaModel};
use crate::ValidationError;

/// Raw upstream record before typing.
pub type RawRecord = Map<String, Value>;

/// Credential name to plain value, as handed to `extract_data`.
pub type PlainCredentials = BTreeMap<String, String>;

/// Boxed future returned by fetcher stages.
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Per-request options that are not part of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub timeout_ms: u64,
    /// Free-form options passed through to the fetcher untouched.
    pub passthrough: Params,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            passthrough: Params::new(),
        }
    }
}

/// Classifies fetcher failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    InvalidQuery,
    Unauthorized,
    Transport,
    UpstreamStatus,
    RateLimited,
    Parse,
    InvalidRecord,
    Internal,
}

/// Structured failure raised inside a fetcher stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    retryable: bool,
}

impl FetchError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::InvalidQuery,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Unauthorized,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn transport(error: &HttpError) -> Self {
        Self {
            kind: FetchErrorKind::Transport,
            message: format!("transport error: {}", error.message()),
            retryable: error.retryable(),
        }
    }

    pub fn upstream_status(status: u16) -> Self {
        Self {
            kind: FetchErrorKind::UpstreamStatus,
            message: format!("upstream returned status {status}"),
            retryable: status == 429 || status >= 500,
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::UpstreamStatus,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Parse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_record(error: &ValidationError) -> Self {
        Self {
            kind: FetchErrorKind::InvalidRecord,
            message: error.to_string(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::InvalidQuery => "fetch.invalid_query",
            FetchErrorKind::Unauthorized => "fetch.unauthorized",
            FetchErrorKind::Transport => "fetch.transport",
            FetchErrorKind::UpstreamStatus => "fetch.upstream_status",
            FetchErrorKind::RateLimited => "fetch.rate_limited",
            FetchErrorKind::Parse => "fetch.parse",
            FetchErrorKind::InvalidRecord => "fetch.invalid_record",
            FetchErrorKind::Internal => "fetch.internal",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

impl From<ValidationError> for FetchError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_query(value.to_string())
    }
}

/// Typed fetcher for one standard model of one provider.
///
/// The three stages run strictly in order for every request:
/// `transform_query` validates and defaults the caller's parameters,
/// `extract_data` talks to the upstream and returns raw records, and
/// `transform_data` turns raw records into typed `Data`.
/// Implementations hold only immutable configuration (HTTP client, limits).
pub trait Fetcher: Send + Sync + 'static {
    type Query: QueryParams;
    type Data: Data;

    /// Whether a missing provider credential aborts the request before `extract_data`.
    fn require_credentials(&self) -> bool {
        true
    }

    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError>;

    fn extract_data<'a>(
        &'a self,
        query: &'a Self::Query,
        credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>>;

    fn transform_data(
        &self,
        query: &Self::Query,
        data: Vec<RawRecord>,
        options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError>;
}

/// Object-safe view of a [`Fetcher`], stored by providers.
pub trait AnyFetcher: Send + Sync {
    fn require_credentials(&self) -> bool;

    fn query_schema(&self) -> Schema;

    fn data_schema(&self) -> Schema;

    /// Runs `transform_query` only, returning the serialized query.
    fn check_query(&self, params: Params) -> Result<Value, FetchError>;

    /// Runs the full pipeline and returns serialized records.
    fn fetch_data<'a>(
        &'a self,
        params: Params,
        credentials: PlainCredentials,
        options: FetchOptions,
    ) -> FetchFuture<'a, Vec<Value>>;
}

impl<F: Fetcher> AnyFetcher for F {
    fn require_credentials(&self) -> bool {
        Fetcher::require_credentials(self)
    }

    fn query_schema(&self) -> Schema {
        F::Query::schema()
    }

    fn data_schema(&self) -> Schema {
        F::Data::schema()
    }

    fn check_query(&self, params: Params) -> Result<Value, FetchError> {
        let query = self.transform_query(params)?;
        serde_json::to_value(&query).map_err(|error| FetchError::internal(error.to_string()))
    }

    fn fetch_data<'a>(
        &'a self,
        params: Params,
        credentials: PlainCredentials,
        options: FetchOptions,
    ) -> FetchFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let query = self.transform_query(params)?;
            let raw = self.extract_data(&query, &credentials, &options).await?;
            let data = self.transform_data(&query, raw, &options)?;
            data.iter()
                .map(|record| {
                    record
                        .to_record()
                        .map(Value::Object)
                        .map_err(|error| FetchError::invalid_record(&error))
                })
                .collect()
        })
    }
}

/// Typed records from raw upstream maps.
pub fn records_into<D: SchemaModel>(data: Vec<RawRecord>) -> Result<Vec<D>, FetchError> {
    data.iter()
        .map(|record| D::from_record(record).map_err(|error| FetchError::invalid_record(&error)))
        .collect()
}

/// Reads a required credential from the filtered credential map.
pub fn credential<'a>(credentials: &'a PlainCredentials, name: &str) -> Result<&'a str, FetchError> {
    credentials
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| FetchError::unauthorized(format!("credential '{name}' is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_retryability_follows_status_class() {
        assert!(FetchError::upstream_status(503).retryable());
        assert!(FetchError::upstream_status(429).retryable());
        assert!(!FetchError::upstream_status(404).retryable());
        assert_eq!(FetchError::upstream_status(404).code(), "fetch.upstream_status");
    }

    #[test]
    fn validation_errors_become_invalid_query() {
        let error: FetchError = ValidationError::MissingField {
            field: String::from("symbol"),
        }
        .into();
        assert_eq!(error.kind(), FetchErrorKind::InvalidQuery);
        assert!(error.to_string().contains("symbol"));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let mut credentials = PlainCredentials::new();
        credentials.insert(String::from("fmp_api_key"), String::from("  "));

        let error = credential(&credentials, "fmp_api_key").expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::Unauthorized);
        assert!(credential(&PlainCredentials::new(), "fmp_api_key").is_err());
    }
}
