//! Financial Modeling Prep.
//!
//! Every endpoint takes the `fmp_api_key` credential as an `apikey` query parameter.
//! Error payloads arrive with status 200 as `{"Error Message": "..."}`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{blank_to_null, fetch_body, object_rows, parse_json, throttle};
use crate::domain::IsoDate;
use crate::fetcher::{credential, records_into, FetchError, FetchFuture, FetchOptions, Fetcher, PlainCredentials, RawRecord};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::Provider;
use crate::provider_policy::ProviderPolicy;
use crate::registry::ProviderContext;
use crate::schema::{Data, Field, FieldKind, Params, QueryParams, Schema, SchemaModel};
use crate::standard_models::{
    AnalystEstimates, AnalystEstimatesData, AnalystEstimatesQuery, CryptoSearch, CryptoSearchData,
    CryptoSearchQuery, DiscoveryFilings, DiscoveryFilingsData, DiscoveryFilingsQuery, DividendCalendar,
    DividendCalendarData, DividendCalendarQuery, StandardModel,
};
use crate::throttling::ThrottlingQueue;
use crate::ValidationError;

const PROVIDER: &str = "fmp";
const BASE_URL: &str = "https://financialmodelingprep.com/api";
const API_KEY: &str = "fmp_api_key";

pub fn load(context: &ProviderContext) -> Result<Provider, ValidationError> {
    let policy = ProviderPolicy::fmp_default();
    let client = FmpClient::new(Arc::clone(&context.http_client), &policy);
    Provider::builder(PROVIDER)
        .description("Financial Modeling Prep: fundamentals, calendars, estimates and SEC filings.")
        .website("https://financialmodelingprep.com")
        .credential("api_key")
        .policy(policy)
        .fetcher(AnalystEstimates::NAME, FmpAnalystEstimatesFetcher::new(client.clone()))
        .fetcher(CryptoSearch::NAME, FmpCryptoSearchFetcher::new(client.clone()))
        .fetcher(DiscoveryFilings::NAME, FmpDiscoveryFilingsFetcher::new(client.clone()))
        .fetcher(DividendCalendar::NAME, FmpDividendCalendarFetcher::new(client))
        .build()
}

/// Shared transport for every FMP fetcher: one HTTP client, one request budget.
#[derive(Clone)]
pub struct FmpClient {
    http_client: Arc<dyn HttpClient>,
    throttling: ThrottlingQueue,
}

impl FmpClient {
    pub fn new(http_client: Arc<dyn HttpClient>, policy: &ProviderPolicy) -> Self {
        Self {
            http_client,
            throttling: ThrottlingQueue::from_policy(policy),
        }
    }

    /// GETs `endpoint` (path and query, without the key) and returns its rows.
    async fn get_many(
        &self,
        endpoint: &str,
        credentials: &PlainCredentials,
        options: &FetchOptions,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let api_key = credential(credentials, API_KEY)?;
        throttle(&self.throttling, PROVIDER)?;

        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!(
            "{BASE_URL}{endpoint}{separator}apikey={}",
            urlencoding::encode(api_key)
        );
        let request = HttpRequest::get(url).with_timeout_ms(options.timeout_ms);
        let body = fetch_body(self.http_client.as_ref(), PROVIDER, endpoint, request).await?;

        match parse_json(PROVIDER, &body)? {
            Value::Array(rows) => object_rows(PROVIDER, rows),
            Value::Object(object) => match object.get("Error Message").and_then(Value::as_str) {
                Some(message) => Err(FetchError::upstream(format!("fmp: {message}"))),
                None => Ok(vec![object]),
            },
            other => Err(FetchError::parse(format!("unexpected fmp payload: {other}"))),
        }
    }
}

fn query_string(pairs: &[(&str, Option<String>)]) -> String {
    pairs
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|value| format!("{key}={}", urlencoding::encode(value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Dividend calendar. Defaults to today through three days from now.
pub struct FmpDividendCalendarFetcher {
    client: FmpClient,
}

impl FmpDividendCalendarFetcher {
    pub fn new(client: FmpClient) -> Self {
        Self { client }
    }
}

/// FMP wire names of standard dividend calendar fields.
const DIVIDEND_ALIASES: &[(&str, &str)] = &[
    ("record_date", "recordDate"),
    ("payment_date", "paymentDate"),
    ("declaration_date", "declarationDate"),
    ("amount", "dividend"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmpDividendCalendarData {
    #[serde(flatten)]
    pub base: DividendCalendarData,
    #[serde(default, alias = "adjDividend")]
    pub adjusted_amount: Option<f64>,
    /// Ex-dividend date formatted for display.
    #[serde(default)]
    pub label: Option<String>,
}

impl SchemaModel for FmpDividendCalendarData {
    fn schema() -> Schema {
        Schema::new(
            "FmpDividendCalendarData",
            DividendCalendarData::fields()
                .into_iter()
                .map(|field| match DIVIDEND_ALIASES.iter().find(|(name, _)| *name == field.name) {
                    Some((_, wire)) => field.alias(wire),
                    None => field,
                })
                .chain([
                    Field::optional("adjusted_amount", FieldKind::Float, "The adjusted-dividend amount.")
                        .alias("adjDividend"),
                    Field::optional("label", FieldKind::String, "Ex-dividend date formatted for display."),
                ])
                .collect(),
        )
    }
}

impl Data for FmpDividendCalendarData {}

impl Fetcher for FmpDividendCalendarFetcher {
    type Query = DividendCalendarQuery;
    type Data = FmpDividendCalendarData;

    fn transform_query(&self, mut params: Params) -> Result<Self::Query, FetchError> {
        let today = IsoDate::today();
        if params.get("start_date").map_or(true, Value::is_null) {
            params.insert(String::from("start_date"), Value::String(today.to_string()));
        }
        if params.get("end_date").map_or(true, Value::is_null) {
            let end = today
                .checked_add_days(3)
                .ok_or_else(|| FetchError::invalid_query("end_date out of range"))?;
            params.insert(String::from("end_date"), Value::String(end.to_string()));
        }
        Ok(DividendCalendarQuery::from_record(&params)?)
    }

    fn extract_data<'a>(
        &'a self,
        query: &'a Self::Query,
        credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            let endpoint = format!(
                "/v3/stock_dividend_calendar?{}",
                query_string(&[
                    ("from", query.start_date.map(|date| date.to_string())),
                    ("to", query.end_date.map(|date| date.to_string())),
                ])
            );
            self.client.get_many(&endpoint, credentials, options).await
        })
    }

    fn transform_data(
        &self,
        _query: &Self::Query,
        mut data: Vec<RawRecord>,
        _options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError> {
        for record in &mut data {
            blank_to_null(record);
            rename_wire_fields(record, DIVIDEND_ALIASES);
        }
        records_into(data)
    }
}

/// Moves `wire` keys to their standard `name`, keeping a standard key already present.
fn rename_wire_fields(record: &mut RawRecord, aliases: &[(&str, &str)]) {
    for (name, wire) in aliases {
        if let Some(value) = record.remove(*wire) {
            record.entry(*name).or_insert(value);
        }
    }
}

/// Consensus analyst estimates for one symbol.
pub struct FmpAnalystEstimatesFetcher {
    client: FmpClient,
}

impl FmpAnalystEstimatesFetcher {
    pub fn new(client: FmpClient) -> Self {
        Self { client }
    }
}

impl Fetcher for FmpAnalystEstimatesFetcher {
    type Query = AnalystEstimatesQuery;
    type Data = AnalystEstimatesData;

    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError> {
        Ok(AnalystEstimatesQuery::from_record(&params)?)
    }

    fn extract_data<'a>(
        &'a self,
        query: &'a Self::Query,
        credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            let endpoint = format!(
                "/v3/analyst-estimates/{}?{}",
                urlencoding::encode(query.symbol.as_str()),
                query_string(&[
                    ("period", Some(query.period.as_str().to_owned())),
                    ("limit", Some(query.limit.to_string())),
                ])
            );
            self.client.get_many(&endpoint, credentials, options).await
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

/// Available crypto pairs, filtered locally by the search text.
pub struct FmpCryptoSearchFetcher {
    client: FmpClient,
}

impl FmpCryptoSearchFetcher {
    pub fn new(client: FmpClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmpCryptoSearchData {
    #[serde(flatten)]
    pub base: CryptoSearchData,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, alias = "stockExchange")]
    pub stock_exchange: Option<String>,
    #[serde(default, alias = "exchangeShortName")]
    pub exchange_name: Option<String>,
}

impl SchemaModel for FmpCryptoSearchData {
    fn schema() -> Schema {
        Schema::extend(
            "FmpCryptoSearchData",
            CryptoSearchData::schema(),
            vec![
                Field::optional("currency", FieldKind::String, "The currency the crypto trades for."),
                Field::optional("stock_exchange", FieldKind::String, "The exchange code the crypto trades on.")
                    .alias("stockExchange"),
                Field::optional("exchange_name", FieldKind::String, "The short name of the exchange the crypto trades on.")
                    .alias("exchangeShortName"),
            ],
        )
    }
}

impl Data for FmpCryptoSearchData {}

impl Fetcher for FmpCryptoSearchFetcher {
    type Query = CryptoSearchQuery;
    type Data = FmpCryptoSearchData;

    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError> {
        Ok(CryptoSearchQuery::from_record(&params)?)
    }

    fn extract_data<'a>(
        &'a self,
        _query: &'a Self::Query,
        credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            self.client
                .get_many("/v3/symbol/available-cryptocurrencies", credentials, options)
                .await
        })
    }

    fn transform_data(
        &self,
        query: &Self::Query,
        data: Vec<RawRecord>,
        _options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError> {
        let needle = query.query.trim().to_lowercase();
        let matches = |record: &RawRecord| {
            needle.is_empty()
                || ["symbol", "name"].iter().any(|key| {
                    record
                        .get(*key)
                        .and_then(Value::as_str)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
        };
        records_into(data.into_iter().filter(matches).collect())
    }
}

/// Latest SEC filings from the FMP RSS feed.
pub struct FmpDiscoveryFilingsFetcher {
    client: FmpClient,
}

impl FmpDiscoveryFilingsFetcher {
    pub fn new(client: FmpClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmpDiscoveryFilingsQuery {
    #[serde(flatten)]
    pub base: DiscoveryFilingsQuery,
    /// Whether the filing has been fully processed.
    #[serde(default)]
    pub is_done: Option<bool>,
}

impl SchemaModel for FmpDiscoveryFilingsQuery {
    fn schema() -> Schema {
        Schema::new(
            "FmpDiscoveryFilingsQuery",
            DiscoveryFilingsQuery::fields()
                .into_iter()
                .chain([Field::optional(
                    "is_done",
                    FieldKind::Boolean,
                    "Flag for whether or not the filing is done.",
                )])
                .collect(),
        )
    }

    fn check(&self) -> Result<(), ValidationError> {
        self.base.check()
    }
}

impl QueryParams for FmpDiscoveryFilingsQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmpDiscoveryFilingsData {
    #[serde(flatten)]
    pub base: DiscoveryFilingsData,
    #[serde(default, alias = "done")]
    pub is_done: Option<bool>,
}

impl SchemaModel for FmpDiscoveryFilingsData {
    fn schema() -> Schema {
        Schema::new(
            "FmpDiscoveryFilingsData",
            DiscoveryFilingsData::fields()
                .into_iter()
                .chain([Field::optional(
                    "is_done",
                    FieldKind::Boolean,
                    "Whether the filing has been processed.",
                )
                .alias("done")])
                .collect(),
        )
    }
}

impl Data for FmpDiscoveryFilingsData {}

impl Fetcher for FmpDiscoveryFilingsFetcher {
    type Query = FmpDiscoveryFilingsQuery;
    type Data = FmpDiscoveryFilingsData;

    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError> {
        Ok(FmpDiscoveryFilingsQuery::from_record(&params)?)
    }

    fn extract_data<'a>(
        &'a self,
        query: &'a Self::Query,
        credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            let base = &query.base;
            let endpoint = format!(
                "/v4/rss_feed?{}",
                query_string(&[
                    ("limit", Some(base.limit.to_string())),
                    ("type", base.form_type.clone()),
                    ("from", base.start_date.map(|date| date.to_string())),
                    ("to", base.end_date.map(|date| date.to_string())),
                    ("isDone", query.is_done.map(|done| done.to_string())),
                ])
            );
            self.client.get_many(&endpoint, credentials, options).await
        })
    }

    fn transform_data(
        &self,
        _query: &Self::Query,
        data: Vec<RawRecord>,
        _options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError> {
        let renamed = data
            .into_iter()
            .map(|mut record| {
                blank_to_null(&mut record);
                if let Some(ticker) = record.remove("ticker") {
                    record.entry("symbol").or_insert(ticker);
                }
                record
            })
            .collect();
        records_into(renamed)
    }
}
