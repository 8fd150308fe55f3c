use thiserror::Error;

use crate::fetcher::FetchError;

/// Validation and contract errors exposed by `finplex-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    #[error("field '{field}' expected {expected}, got {found}")]
    InvalidFieldType {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("field '{field}' has invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },
    #[error("field '{field}': {message}")]
    InvalidValue { field: String, message: String },
    #[error("start_date {start} must not be after end_date {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },
    #[error("unknown credential '{name}'")]
    UnknownCredential { name: String },

    #[error("provider name must be lowercase ascii letters, digits or '_': '{value}'")]
    InvalidProviderName { value: String },
    #[error("provider '{provider}' declares an empty model name")]
    EmptyModelName { provider: String },
    #[error("provider '{provider}' declares an empty credential name")]
    EmptyCredentialName { provider: String },
    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },
    #[error("schema '{schema}' does not extend '{standard}': {reason}")]
    IncompatibleSchema {
        schema: String,
        standard: String,
        reason: String,
    },

    #[error("error detail cannot be empty")]
    EmptyErrorDetail,
    #[error("warning message cannot be empty")]
    EmptyWarning,
}

/// Top-level error taxonomy for registry loading, route registration and query execution.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid extension '{extension}': {reason}")]
    Loading { extension: String, reason: String },

    #[error("provider '{name}' not found in the registry; available providers: [{}]", available.join(", "))]
    ProviderNotFound { name: String, available: Vec<String> },
    #[error("fetcher not found for model '{model}' in provider '{provider}'")]
    FetcherNotFound { provider: String, model: String },
    #[error("missing credential '{name}'")]
    MissingCredential { name: String },

    #[error("invalid signature: parameter `{parameter}` {message}\nmodule    = {module}\nfunction  = {function}")]
    Signature {
        module: String,
        function: String,
        parameter: String,
        message: String,
    },
    #[error("invalid parameter type `{type_name}` for `{parameter}`, please provide a serializable type (scalar, schema model or command context)\nmodule    = {module}\nfunction  = {function}")]
    InvalidParameterType {
        module: String,
        function: String,
        parameter: String,
        type_name: String,
    },
    #[error("invalid return type `{type_name}`, allowed: {function}(...) -> Envelope[T] with a serializable T\nmodule    = {module}\nfunction  = {function}")]
    InvalidReturnType {
        module: String,
        function: String,
        type_name: String,
    },
    #[error("model '{model}' used by route '{path}' is not known to the provider interface")]
    UnknownModel { model: String, path: String },
    #[error("route '{path}' is already registered")]
    DuplicateRoute { path: String },

    #[error("route '{path}' not found")]
    RouteNotFound { path: String },
    #[error("no results found")]
    EmptyResults,

    #[error("provider '{provider}' failed for model '{model}': {source}")]
    Provider {
        provider: String,
        model: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Stable machine-readable error kind used in error responses.
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::Loading { .. } => "LoadingError",
            Self::ProviderNotFound { .. } => "ProviderNotFound",
            Self::FetcherNotFound { .. } => "FetcherNotFound",
            Self::MissingCredential { .. } => "MissingCredential",
            Self::Signature { .. } => "SignatureError",
            Self::InvalidParameterType { .. } => "InvalidParameterType",
            Self::InvalidReturnType { .. } => "InvalidReturnType",
            Self::UnknownModel { .. } => "UnknownModel",
            Self::DuplicateRoute { .. } => "DuplicateRoute",
            Self::RouteNotFound { .. } => "RouteNotFound",
            Self::EmptyResults => "EmptyResults",
            Self::Provider { .. } => "ProviderError",
            Self::Validation(_) => "ValidationError",
            Self::Config(_) => "ConfigError",
            Self::Serialization(_) => "SerializationError",
        }
    }

    /// HTTP-shaped status for per-request errors.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::EmptyResults
            | Self::Validation(_)
            | Self::MissingCredential { .. }
            | Self::ProviderNotFound { .. }
            | Self::FetcherNotFound { .. } => 400,
            Self::RouteNotFound { .. } => 404,
            _ => 500,
        }
    }

    pub(crate) fn loading(extension: impl Into<String>, reason: impl ToString) -> Self {
        Self::Loading {
            extension: extension.into(),
            reason: reason.to_string(),
        }
    }
}
