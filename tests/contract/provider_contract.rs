//! Contract tests every installed provider must satisfy.
//!
//! These run offline: fetchers are exercised up to `transform_query`, or through
//! canned upstream payloads.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use finplex_core::adapters::INSTALLED_PROVIDERS;
use finplex_core::fetcher::PlainCredentials;
use finplex_core::registry::ProviderContext;
use finplex_core::standard_models::{self, ModelInfo};
use finplex_core::{
    FetchOptions, FieldKind, IsoDate, NoopHttpClient, ProviderInterface, Registry, RegistryLoader, Schema,
};
use serde_json::{json, Map, Value};

fn load_registry() -> Registry {
    RegistryLoader::from_extensions(
        INSTALLED_PROVIDERS,
        &ProviderContext {
            http_client: Arc::new(NoopHttpClient),
        },
    )
    .expect("installed providers should load")
}

/// Required fields of `schema` filled with a plausible value of their kind.
fn minimal_params(schema: &Schema) -> Map<String, Value> {
    schema
        .fields
        .iter()
        .filter(|field| field.required)
        .map(|field| {
            let sample = match field.kind {
                FieldKind::String => json!("AAPL"),
                FieldKind::Integer => json!(1),
                FieldKind::Float => json!(1.0),
                FieldKind::Boolean => json!(true),
                FieldKind::Date => json!("2024-01-02"),
            };
            (field.name.clone(), sample)
        })
        .collect()
}

fn catalogue_entry(model: &str) -> ModelInfo {
    standard_models::catalogue()
        .into_iter()
        .find(|info| info.name == model)
        .unwrap_or_else(|| panic!("model '{model}' should be catalogued"))
}

#[test]
fn every_fetcher_accepts_the_minimal_standard_parameters() {
    let registry = load_registry();
    for provider in registry.providers() {
        for (model, fetcher) in provider.fetchers() {
            let params = minimal_params(&catalogue_entry(model).query);
            let checked = fetcher.check_query(params.clone());
            assert!(
                checked.is_ok(),
                "{}/{model} rejected {params:?}: {:?}",
                provider.name(),
                checked.err()
            );
        }
    }
}

#[test]
fn every_provider_schema_extends_its_standard_model() {
    let registry = load_registry();
    for provider in registry.providers() {
        for (model, fetcher) in provider.fetchers() {
            let info = catalogue_entry(model);
            fetcher
                .query_schema()
                .check_extends(&info.query)
                .unwrap_or_else(|err| panic!("{}/{model} query: {err}", provider.name()));
            fetcher
                .data_schema()
                .check_extends(&info.data)
                .unwrap_or_else(|err| panic!("{}/{model} data: {err}", provider.name()));
        }
    }
    assert!(ProviderInterface::new(&registry, &standard_models::catalogue()).is_ok());
}

#[test]
fn registry_loads_are_deterministic() {
    let first = load_registry();
    let second = load_registry();

    assert_eq!(first.model_map(), second.model_map());
    assert_eq!(first.provider_names(), vec!["fmp", "nasdaq", "oecd"]);
    assert_eq!(
        first.model_map()["oecd"],
        vec!["GdpForecast", "GdpNominal", "GdpReal"]
    );
}

#[test]
fn provider_credentials_are_prefixed_with_the_provider_name() {
    let registry = load_registry();
    let declared = registry.credentials().into_iter().collect::<Vec<_>>();
    assert_eq!(declared, vec![String::from("fmp_api_key")]);

    let fmp = registry.get_provider("FMP").expect("case-insensitive lookup");
    assert!(fmp.fetcher("DividendCalendar").map(|f| f.require_credentials()).unwrap_or(false));
    let nasdaq = registry.get_provider("nasdaq").expect("nasdaq is installed");
    assert!(!nasdaq
        .fetcher("DividendCalendar")
        .map(|f| f.require_credentials())
        .unwrap_or(true));
}

#[test]
fn fmp_dividend_calendar_defaults_to_a_four_day_window() {
    let registry = load_registry();
    let fmp = registry.get_provider("fmp").expect("fmp is installed");
    let fetcher = registry
        .get_fetcher(&fmp, "DividendCalendar")
        .expect("fmp serves the dividend calendar");

    let query = fetcher.check_query(Map::new()).expect("empty params are valid");

    let today = IsoDate::today();
    let end = today.checked_add_days(3).expect("in range");
    assert_eq!(query["start_date"], json!(today.to_string()));
    assert_eq!(query["end_date"], json!(end.to_string()));
}

#[tokio::test]
async fn fetched_records_satisfy_the_standard_data_schema() {
    let stub = common::stub_upstreams().into_shared();
    let registry = RegistryLoader::from_extensions(
        INSTALLED_PROVIDERS,
        &ProviderContext {
            http_client: stub.clone(),
        },
    )
    .expect("installed providers should load");
    let credentials: PlainCredentials = [(String::from("fmp_api_key"), String::from(common::FMP_KEY))]
        .into_iter()
        .collect();

    for (provider, model) in [("fmp", "DividendCalendar"), ("nasdaq", "DividendCalendar"), ("oecd", "GdpReal")] {
        let provider = registry.get_provider(provider).expect("installed");
        let fetcher = registry.get_fetcher(&provider, model).expect("served");
        let records = fetcher
            .fetch_data(Map::new(), credentials.clone(), FetchOptions::default())
            .await
            .unwrap_or_else(|err| panic!("{}/{model} failed: {err}", provider.name()));

        assert!(!records.is_empty(), "{}/{model} returned nothing", provider.name());
        let standard = catalogue_entry(model).data;
        for record in &records {
            let record = record.as_object().expect("records are objects");
            standard
                .validate_record(record)
                .unwrap_or_else(|err| panic!("{}/{model}: {err}", provider.name()));
        }
    }
}
