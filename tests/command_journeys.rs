//! End-to-end journeys through the assembled platform
//!
//! Each test calls a route the way the CLI does and checks the rendered response:
//! provider selection, parameter handling, warnings, coverage and error bodies.

#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use finplex_core::adapters::INSTALLED_PROVIDERS;
use finplex_core::fetcher::{records_into, FetchFuture, PlainCredentials, RawRecord};
use finplex_core::provider::Provider;
use finplex_core::registry::ProviderContext;
use finplex_core::router::{Command, RegistrationContext, Router};
use finplex_core::routers::INSTALLED_ROUTERS;
use finplex_core::schema::Params;
use finplex_core::standard_models::{
    self, GdpReal, GdpRealQuery, GdpValueData, ResultShape, StandardModel,
};
use finplex_core::{
    CommandInput, CoreError, FetchError, FetchOptions, Fetcher, Platform, ProviderExtension, RouterExtension,
    SchemaModel, ValidationError,
};
use serde_json::{json, Value};

/// Serves `rows` fixed yearly GDP observations without touching the network.
struct FixedGdpFetcher {
    rows: usize,
}

impl Fetcher for FixedGdpFetcher {
    type Query = GdpRealQuery;
    type Data = GdpValueData;

    fn require_credentials(&self) -> bool {
        false
    }

    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError> {
        Ok(GdpRealQuery::from_record(&params)?)
    }

    fn extract_data<'a>(
        &'a self,
        _query: &'a Self::Query,
        _credentials: &'a PlainCredentials,
        _options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            let rows = (0..self.rows)
                .filter_map(|offset| {
                    let row = json!({"date": format!("{}-01-01", 2023 - offset), "value": 1.5});
                    row.as_object().cloned()
                })
                .collect();
            Ok::<_, FetchError>(rows)
        })
    }

    fn transform_data(
        &self,
        _query: &Self::Query,
        data: Vec<RawRecord>,
        _options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError> {
        records_into(data)
    }
}

fn load_fixed(_: &ProviderContext) -> Result<Provider, ValidationError> {
    Provider::builder("fixed")
        .description("Fixed observations.")
        .fetcher(GdpReal::NAME, FixedGdpFetcher { rows: 1 })
        .build()
}

/// Latest real GDP observation: a model answering with exactly one record.
struct LatestGdp;

impl StandardModel for LatestGdp {
    const NAME: &'static str = "LatestGdp";
    const DESCRIPTION: &'static str = "Most recent real GDP observation.";
    const SHAPE: ResultShape = ResultShape::Single;

    type Query = GdpRealQuery;
    type Data = GdpValueData;
}

fn latest_provider(name: &str, rows: usize) -> Result<Provider, ValidationError> {
    Provider::builder(name)
        .description("Fixed latest observations.")
        .fetcher(LatestGdp::NAME, FixedGdpFetcher { rows })
        .build()
}

fn load_no_rows(_: &ProviderContext) -> Result<Provider, ValidationError> {
    latest_provider("no_rows", 0)
}

fn load_one_row(_: &ProviderContext) -> Result<Provider, ValidationError> {
    latest_provider("one_row", 1)
}

fn load_two_rows(_: &ProviderContext) -> Result<Provider, ValidationError> {
    latest_provider("two_rows", 2)
}

fn latest_router(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.command(
        ctx,
        Command::model::<LatestGdp>("finplex.latest.latest_router", "gdp", "Get the latest real GDP."),
    )?;
    Ok(router)
}

fn platform_with_latest_gdp() -> Platform {
    let mut providers = INSTALLED_PROVIDERS.to_vec();
    providers.extend([
        ProviderExtension::new("no_rows", load_no_rows),
        ProviderExtension::new("one_row", load_one_row),
        ProviderExtension::new("two_rows", load_two_rows),
    ]);
    let mut routers = INSTALLED_ROUTERS.to_vec();
    routers.push(RouterExtension::new("latest", latest_router));
    let mut models = standard_models::catalogue();
    models.push(LatestGdp::info());

    Platform::builder()
        .with_config(common::test_config())
        .with_http_client(common::stub_upstreams().into_shared())
        .with_provider_extensions(&providers)
        .with_router_extensions(&routers)
        .with_models(models)
        .with_env_lookup(common::empty_env())
        .build()
        .expect("platform should build")
}

fn platform_with_fixed_gdp() -> Platform {
    let mut providers = INSTALLED_PROVIDERS.to_vec();
    providers.push(ProviderExtension::new("fixed", load_fixed));
    Platform::builder()
        .with_config(common::test_config())
        .with_http_client(common::stub_upstreams().into_shared())
        .with_provider_extensions(&providers)
        .with_env_lookup(common::empty_env())
        .build()
        .expect("platform should build")
}

// =============================================================================
// Model commands
// =============================================================================

#[tokio::test]
async fn user_lists_dividends_from_nasdaq() {
    // Given: The offline platform
    let (platform, stub) = common::offline_platform();

    // When: The dividend calendar is requested from nasdaq for one day
    let response = platform
        .respond(
            "/equity/calendar/dividend",
            CommandInput::new()
                .with_provider("nasdaq")
                .with_param("start_date", "2024-01-02"),
        )
        .await;

    // Then: A list envelope attributed to nasdaq with its extra field
    assert_eq!(response.status, 200);
    let body = &response.body;
    assert_eq!(body["provider"], json!("nasdaq"));
    assert_eq!(body["results"][0]["symbol"], json!("AAPL"));
    assert_eq!(body["results"][0]["date"], json!("2024-01-02"));
    assert_eq!(body["results"][0]["annualized_amount"], json!(0.96));
    assert_eq!(body["warnings"], json!([]));
    assert_eq!(body["extra"]["metadata"]["route"], json!("/equity/calendar/dividend"));
    assert!(stub.requests()[0].url.contains("date=2024-01-02"));
}

#[tokio::test]
async fn first_provider_serves_when_none_is_chosen() {
    let (platform, stub) = common::offline_platform();

    let envelope = platform
        .call("/equity/calendar/dividend", CommandInput::new())
        .await
        .expect("fmp answers");

    assert_eq!(envelope.provider.as_deref(), Some("fmp"));
    assert_eq!(envelope.results.as_array().map(Vec::len), Some(2));
    assert!(stub.requests()[0].url.contains("stock_dividend_calendar"));
}

#[tokio::test]
async fn configured_route_default_picks_the_provider() {
    // Given: Settings naming nasdaq as the dividend calendar default
    let stub = common::stub_upstreams().into_shared();
    let mut config = common::test_config();
    config.set_default_provider("/equity/calendar/dividend", "nasdaq");
    let platform = common::platform_with(Arc::clone(&stub), config);

    // When: The route is called without a provider
    let envelope = platform
        .call("/equity/calendar/dividend", CommandInput::new())
        .await
        .expect("nasdaq answers");

    // Then: Nasdaq served it
    assert_eq!(envelope.provider.as_deref(), Some("nasdaq"));
    assert!(stub.requests()[0].url.contains("api.nasdaq.com"));
}

#[tokio::test]
async fn explicit_provider_beats_the_configured_default() {
    let stub = common::stub_upstreams().into_shared();
    let mut config = common::test_config();
    config.set_default_provider("/equity/calendar/dividend", "nasdaq");
    let platform = common::platform_with(Arc::clone(&stub), config);

    let envelope = platform
        .call("/equity/calendar/dividend", CommandInput::new().with_provider("fmp"))
        .await
        .expect("fmp answers");

    assert_eq!(envelope.provider.as_deref(), Some("fmp"));
}

#[tokio::test]
async fn user_reads_real_gdp_for_a_country() {
    // Given: The offline platform
    let (platform, stub) = common::offline_platform();

    // When: Real GDP is requested with the provider-specific country
    let envelope = platform
        .call(
            "/economy/gdp/real",
            CommandInput::new().with_param("country", "united_states"),
        )
        .await
        .expect("oecd answers");

    // Then: Observations come back oldest first, for the United States
    assert_eq!(envelope.provider.as_deref(), Some("oecd"));
    let results = envelope.results.as_array().expect("list results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["date"], json!("2021-01-01"));
    assert_eq!(results[1]["date"], json!("2022-01-01"));
    assert!(envelope.warnings.is_empty());
    assert!(stub.requests()[0].url.contains(".USA."));
}

#[tokio::test]
async fn unsupported_extra_parameter_is_dropped_with_a_warning() {
    // Given: Two providers for real GDP, only oecd knowing `country`
    let platform = platform_with_fixed_gdp();

    // When: The other provider is asked with `country`
    let envelope = platform
        .call(
            "/economy/gdp/real",
            CommandInput::new()
                .with_provider("fixed")
                .with_param("country", "japan"),
        )
        .await
        .expect("fixed answers");

    // Then: Results arrive with a platform warning naming the parameter
    assert_eq!(envelope.provider.as_deref(), Some("fixed"));
    assert_eq!(envelope.results[0]["value"], json!(1.5));
    assert_eq!(envelope.warnings.len(), 1);
    assert_eq!(envelope.warnings[0].category, "FinplexWarning");
    assert_eq!(
        envelope.warnings[0].message,
        "Parameter 'country' is not supported by provider 'fixed'. It will be ignored."
    );
}

#[test]
fn extra_providers_join_the_route_choices() {
    let platform = platform_with_fixed_gdp();

    let route = platform
        .command_map()
        .get_command("/economy/gdp/real")
        .expect("registered");

    assert_eq!(route.provider_choices(), vec!["fixed", "oecd"]);
}

#[tokio::test]
async fn single_record_model_returns_an_object() {
    let platform = platform_with_latest_gdp();

    let envelope = platform
        .call("/latest/gdp", CommandInput::new().with_provider("one_row"))
        .await
        .expect("one row answers");

    assert_eq!(envelope.results["date"], json!("2023-01-01"));
    assert_eq!(envelope.results["value"], json!(1.5));
}

#[tokio::test]
async fn single_record_model_without_rows_answers_empty_results() {
    let platform = platform_with_latest_gdp();

    let response = platform
        .respond("/latest/gdp", CommandInput::new().with_provider("no_rows"))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["error_kind"], json!("EmptyResults"));
}

#[tokio::test]
async fn single_record_model_rejects_several_rows() {
    // Given: A provider answering a single-record model with two rows
    let platform = platform_with_latest_gdp();

    // When: The route is called
    let response = platform
        .respond("/latest/gdp", CommandInput::new().with_provider("two_rows"))
        .await;

    // Then: A provider error instead of a silently truncated result
    assert_eq!(response.status, 500);
    assert_eq!(response.body["error_kind"], json!("ProviderError"));
    assert!(response.body["detail"]
        .as_str()
        .is_some_and(|detail| detail.contains("LatestGdp returns one record but the provider sent 2")));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn unknown_route_answers_404() {
    let (platform, _) = common::offline_platform();

    let response = platform.respond("/equity/price/quote", CommandInput::new()).await;

    assert_eq!(response.status, 404);
    assert_eq!(response.body["error_kind"], json!("RouteNotFound"));
}

#[tokio::test]
async fn unknown_parameter_answers_400() {
    let (platform, stub) = common::offline_platform();

    let response = platform
        .respond(
            "/equity/calendar/dividend",
            CommandInput::new().with_param("limit", 5),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["error_kind"], json!("ValidationError"));
    assert!(response.body["detail"]
        .as_str()
        .is_some_and(|detail| detail.contains("limit")));
    assert_eq!(stub.request_count(), 0);
}

#[tokio::test]
async fn provider_outside_the_route_choices_answers_400() {
    let (platform, _) = common::offline_platform();

    let response = platform
        .respond(
            "/equity/calendar/dividend",
            CommandInput::new().with_provider("oecd"),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["error_kind"], json!("ProviderNotFound"));
    assert!(response.body["detail"]
        .as_str()
        .is_some_and(|detail| detail.contains("fmp, nasdaq")));
}

#[tokio::test]
async fn malformed_date_answers_400() {
    let (platform, _) = common::offline_platform();

    let response = platform
        .respond(
            "/equity/calendar/dividend",
            CommandInput::new()
                .with_provider("nasdaq")
                .with_param("start_date", "02/01/2024"),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["error_kind"], json!("ValidationError"));
}

// =============================================================================
// Coverage
// =============================================================================

#[tokio::test]
async fn coverage_maps_providers_to_commands_with_a_separator() {
    // Given: The offline platform
    let (platform, stub) = common::offline_platform();

    // When: Provider coverage is requested with "." as separator
    let envelope = platform
        .call("/coverage/providers", CommandInput::new().with_param("sep", "."))
        .await
        .expect("coverage answers");

    // Then: Command names use the separator and no upstream is contacted
    let nasdaq = envelope.results["nasdaq"].as_array().expect("nasdaq entry");
    assert_eq!(nasdaq, &vec![json!(".equity.calendar.dividend")]);
    let oecd = envelope.results["oecd"].as_array().expect("oecd entry");
    assert_eq!(oecd.len(), 3);
    assert_eq!(stub.request_count(), 0);
}

#[tokio::test]
async fn coverage_maps_commands_to_providers() {
    let (platform, _) = common::offline_platform();

    let envelope = platform
        .call("/coverage/commands", CommandInput::new())
        .await
        .expect("coverage answers");

    assert_eq!(
        envelope.results["/equity/calendar/dividend"],
        json!(["fmp", "nasdaq"])
    );
    assert_eq!(envelope.results["/crypto/search"], json!(["fmp"]));
    assert!(envelope.results.get("/coverage/commands").is_none());
    assert_eq!(envelope.results.as_object().map(|map| map.len()), Some(7));
    assert_eq!(envelope.provider, None::<String>);
    assert_eq!(envelope.results["/economy/gdp/real"], Value::from(vec!["oecd"]));
}
