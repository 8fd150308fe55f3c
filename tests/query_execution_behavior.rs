//! Behavior-driven tests for query execution
//!
//! These tests verify how the executor resolves providers and fetchers, which
//! credentials reach a fetcher, and how pipeline failures surface to callers.

#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use finplex_core::adapters::INSTALLED_PROVIDERS;
use finplex_core::registry::ProviderContext;
use finplex_core::{
    CommandInput, CoreError, FetchOptions, HttpResponse, QueryExecutor, RegistryLoader, SecretMap,
    SecretString, StubHttpClient,
};
use serde_json::{json, Map, Value};

use common::{FMP_KEY, NASDAQ_DAY};

fn executor_with(stub: Arc<StubHttpClient>) -> QueryExecutor {
    let registry = RegistryLoader::from_extensions(
        INSTALLED_PROVIDERS,
        &ProviderContext { http_client: stub },
    )
    .expect("installed providers should load");
    QueryExecutor::new(Arc::new(registry))
}

fn secrets(pairs: &[(&str, &str)]) -> SecretMap {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), SecretString::new(*value)))
        .collect()
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("params should be an object")
}

// =============================================================================
// Provider and fetcher resolution
// =============================================================================

#[test]
fn when_provider_is_unknown_error_lists_the_installed_providers() {
    // Given: An executor over the installed providers
    let executor = executor_with(common::stub_upstreams().into_shared());

    // When: A provider nobody installed is requested
    let err = executor.get_provider("none_such").expect_err("must fail");

    // Then: The error names the request and every installed provider
    assert_eq!(err.error_kind(), "ProviderNotFound");
    assert_eq!(err.status_code(), 400);
    let message = err.to_string();
    assert!(message.contains("none_such"));
    assert!(message.contains("fmp, nasdaq, oecd"), "unexpected message: {message}");
}

#[test]
fn provider_lookup_ignores_case() {
    let executor = executor_with(common::stub_upstreams().into_shared());

    let provider = executor.get_provider("FMP").expect("fmp is installed");

    assert_eq!(provider.name(), "fmp");
}

#[test]
fn when_provider_lacks_the_model_fetcher_is_not_found() {
    // Given: Nasdaq, which serves only the dividend calendar
    let executor = executor_with(common::stub_upstreams().into_shared());
    let nasdaq = executor.get_provider("nasdaq").expect("installed");

    // When: A GDP fetcher is requested from it
    let err = executor.get_fetcher(&nasdaq, "GdpReal").err().expect("must fail");

    // Then: FetcherNotFound names both provider and model
    assert!(matches!(
        err,
        CoreError::FetcherNotFound { ref provider, ref model } if provider == "nasdaq" && model == "GdpReal"
    ));
}

// =============================================================================
// Credential filtering
// =============================================================================

#[test]
fn only_declared_credentials_reach_the_fetcher() {
    // Given: Credentials for fmp and for an unrelated service
    let executor = executor_with(common::stub_upstreams().into_shared());
    let fmp = executor.get_provider("fmp").expect("installed");
    let supplied = secrets(&[("fmp_api_key", "X"), ("other_token", "Y")]);

    // When: They are filtered for fmp
    let filtered = QueryExecutor::filter_credentials(Some(&supplied), &fmp, true).expect("key is present");

    // Then: Exactly fmp's prefixed key survives, unwrapped
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered.get("fmp_api_key").map(String::as_str), Some("X"));
}

#[test]
fn filtering_is_deterministic() {
    let executor = executor_with(common::stub_upstreams().into_shared());
    let fmp = executor.get_provider("fmp").expect("installed");
    let supplied = secrets(&[("fmp_api_key", "X")]);

    let first = QueryExecutor::filter_credentials(Some(&supplied), &fmp, true).expect("first");
    let second = QueryExecutor::filter_credentials(Some(&supplied), &fmp, true).expect("second");

    assert_eq!(first, second);
}

#[test]
fn blank_credentials_count_as_missing() {
    let executor = executor_with(common::stub_upstreams().into_shared());
    let fmp = executor.get_provider("fmp").expect("installed");
    let supplied = secrets(&[("fmp_api_key", "   ")]);

    let err = QueryExecutor::filter_credentials(Some(&supplied), &fmp, true).expect_err("blank is missing");
    assert_eq!(err.error_kind(), "MissingCredential");

    let lenient = QueryExecutor::filter_credentials(Some(&supplied), &fmp, false).expect("not required");
    assert!(lenient.is_empty());
}

#[tokio::test]
async fn when_required_credential_is_missing_no_request_is_sent() {
    // Given: An executor and no credentials at all
    let stub = common::stub_upstreams().into_shared();
    let executor = executor_with(Arc::clone(&stub));

    // When: An fmp query runs
    let err = executor
        .execute("fmp", "DividendCalendar", Map::new(), None, FetchOptions::default())
        .await
        .expect_err("fmp requires a key");

    // Then: The call fails before reaching the upstream
    assert!(matches!(err, CoreError::MissingCredential { ref name } if name == "fmp_api_key"));
    assert_eq!(err.status_code(), 400);
    assert_eq!(stub.request_count(), 0);
}

// =============================================================================
// Pipeline execution
// =============================================================================

#[tokio::test]
async fn fmp_dividend_query_returns_normalized_records() {
    // Given: The fmp key among unrelated credentials
    let stub = common::stub_upstreams().into_shared();
    let executor = executor_with(Arc::clone(&stub));
    let supplied = secrets(&[("fmp_api_key", FMP_KEY), ("other_token", "Y")]);

    // When: The dividend calendar is queried for two days
    let records = executor
        .execute(
            "fmp",
            "DividendCalendar",
            params(json!({"start_date": "2024-01-02", "end_date": "2024-01-03"})),
            Some(&supplied),
            FetchOptions::default(),
        )
        .await
        .expect("query succeeds");

    // Then: Records carry the standard fields and only the fmp key went out
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["date"], json!("2024-01-02"));
    assert_eq!(records[0]["symbol"], json!("AAPL"));
    assert_eq!(records[0]["amount"], json!(0.24));
    assert_eq!(records[1]["record_date"], Value::Null);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("from=2024-01-02"));
    assert!(requests[0].url.contains("to=2024-01-03"));
    assert!(requests[0].url.contains(&format!("apikey={FMP_KEY}")));
    assert!(!requests[0].url.contains("other_token"));
}

#[tokio::test]
async fn keyless_provider_runs_without_credentials() {
    let stub = StubHttpClient::new().with_json("api.nasdaq.com", NASDAQ_DAY).into_shared();
    let executor = executor_with(Arc::clone(&stub));

    let records = executor
        .execute(
            "nasdaq",
            "DividendCalendar",
            params(json!({"start_date": "2024-01-02"})),
            None,
            FetchOptions::default(),
        )
        .await
        .expect("nasdaq needs no key");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], json!("Apple Inc."));
    assert_eq!(stub.request_count(), 1);
}

#[tokio::test]
async fn when_upstream_fails_error_wraps_the_fetch_failure() {
    // Given: An upstream answering with a server error
    let stub = StubHttpClient::new()
        .with_response("stock_dividend_calendar", HttpResponse::with_status(500, "oops"))
        .into_shared();
    let executor = executor_with(stub);
    let supplied = secrets(&[("fmp_api_key", FMP_KEY)]);

    // When: The query runs
    let err = executor
        .execute("fmp", "DividendCalendar", Map::new(), Some(&supplied), FetchOptions::default())
        .await
        .expect_err("upstream failed");

    // Then: A provider error naming provider and model, without the key
    match &err {
        CoreError::Provider { provider, model, source } => {
            assert_eq!(provider, "fmp");
            assert_eq!(model, "DividendCalendar");
            assert_eq!(source.code(), "fetch.upstream_status");
            assert!(source.retryable());
        }
        other => panic!("expected a provider error, got {other:?}"),
    }
    assert_eq!(err.status_code(), 500);
    assert!(!err.to_string().contains(FMP_KEY));
}

#[tokio::test]
async fn invalid_query_parameters_fail_inside_the_pipeline() {
    let executor = executor_with(common::stub_upstreams().into_shared());
    let supplied = secrets(&[("fmp_api_key", FMP_KEY)]);

    let err = executor
        .execute(
            "fmp",
            "DividendCalendar",
            params(json!({"start_date": "2024-02-01", "end_date": "2024-01-01"})),
            Some(&supplied),
            FetchOptions::default(),
        )
        .await
        .expect_err("inverted range");

    assert!(matches!(
        err,
        CoreError::Provider { ref source, .. } if source.code() == "fetch.invalid_query"
    ));
}

#[tokio::test]
async fn concurrent_executions_share_one_executor() {
    let stub = common::stub_upstreams().into_shared();
    let executor = executor_with(Arc::clone(&stub));
    let supplied = secrets(&[("fmp_api_key", FMP_KEY)]);

    let (dividends, estimates) = tokio::join!(
        executor.execute("nasdaq", "DividendCalendar", Map::new(), None, FetchOptions::default()),
        executor.execute(
            "fmp",
            "AnalystEstimates",
            params(json!({"symbol": "AAPL"})),
            Some(&supplied),
            FetchOptions::default(),
        ),
    );

    assert_eq!(dividends.expect("nasdaq succeeds").len(), 1);
    assert_eq!(estimates.expect("fmp succeeds")[0]["symbol"], json!("AAPL"));
    assert_eq!(stub.request_count(), 2);
}

// =============================================================================
// Results through a route
// =============================================================================

#[tokio::test]
async fn when_provider_returns_nothing_caller_gets_empty_results() {
    // Given: A Nasdaq calendar day without distributions
    let stub = StubHttpClient::new()
        .with_json("api.nasdaq.com", r#"{"data": {"calendar": {"rows": null}}}"#)
        .into_shared();
    let platform = common::platform_with(stub, common::test_config());

    // When: The dividend route is called for that day
    let response = platform
        .respond(
            "/equity/calendar/dividend",
            CommandInput::new()
                .with_provider("nasdaq")
                .with_param("start_date", "2024-01-06"),
        )
        .await;

    // Then: 400 with the EmptyResults kind
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error_kind"], json!("EmptyResults"));
    assert_eq!(response.body["detail"], json!("no results found"));
}
