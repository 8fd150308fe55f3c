//! Installed data providers.
//!
//! Each provider module exposes a `load` function building its [`Provider`](crate::provider::Provider)
//! descriptor; [`INSTALLED_PROVIDERS`] is the registration table the registry reads.

pub mod fmp;
pub mod nasdaq;
pub mod oecd;

use serde_json::Value;
use tracing::debug;

use crate::fetcher::{FetchError, RawRecord};
use crate::http_client::{HttpClient, HttpRequest};
use crate::registry::ProviderExtension;
use crate::throttling::ThrottlingQueue;

/// Providers compiled into this build.
pub const INSTALLED_PROVIDERS: &[ProviderExtension] = &[
    ProviderExtension::new("fmp", fmp::load),
    ProviderExtension::new("nasdaq", nasdaq::load),
    ProviderExtension::new("oecd", oecd::load),
];

/// Takes one unit of the provider's request budget.
pub(crate) fn throttle(queue: &ThrottlingQueue, provider: &str) -> Result<(), FetchError> {
    queue.acquire().map_err(|delay| {
        FetchError::rate_limited(format!(
            "{provider} request budget exhausted; retry in {:.2}s",
            delay.as_secs_f64()
        ))
    })
}

/// Sends `request` and returns the body of a successful response.
///
/// `endpoint` is what gets logged; request URLs may carry credentials.
pub(crate) async fn fetch_body(
    client: &dyn HttpClient,
    provider: &str,
    endpoint: &str,
    request: HttpRequest,
) -> Result<String, FetchError> {
    debug!(provider, endpoint, "requesting upstream");
    let response = client
        .execute(request)
        .await
        .map_err(|error| FetchError::transport(&error))?;
    if !response.is_success() {
        debug!(provider, endpoint, status = response.status, "upstream returned an error status");
        return Err(FetchError::upstream_status(response.status));
    }
    Ok(response.body)
}

pub(crate) fn parse_json(provider: &str, body: &str) -> Result<Value, FetchError> {
    serde_json::from_str(body)
        .map_err(|error| FetchError::parse(format!("failed to parse {provider} response: {error}")))
}

/// Objects of a JSON array; anything else in the array is a parse error.
pub(crate) fn object_rows(provider: &str, rows: Vec<Value>) -> Result<Vec<RawRecord>, FetchError> {
    rows.into_iter()
        .map(|row| match row {
            Value::Object(record) => Ok(record),
            other => Err(FetchError::parse(format!(
                "{provider} returned a non-object row: {other}"
            ))),
        })
        .collect()
}

/// Replaces empty and placeholder strings with null.
pub(crate) fn blank_to_null(record: &mut RawRecord) {
    for value in record.values_mut() {
        if let Value::String(raw) = value {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
                *value = Value::Null;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn placeholders_become_null() {
        let mut record = json!({"a": "", "b": "N/A", "c": "x", "d": 1})
            .as_object()
            .cloned()
            .expect("object");
        blank_to_null(&mut record);
        assert_eq!(Value::Object(record), json!({"a": null, "b": null, "c": "x", "d": 1}));
    }

    #[test]
    fn non_object_rows_are_parse_errors() {
        let err = object_rows("fmp", vec![json!(1)]).expect_err("must fail");
        assert_eq!(err.code(), "fetch.parse");
    }
}
