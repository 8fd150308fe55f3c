//! Nasdaq public calendar API. No credentials; one request per calendar day.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adapters::{blank_to_null, fetch_body, object_rows, parse_json, throttle};
use crate::domain::IsoDate;
use crate::fetcher::{records_into, FetchError, FetchFuture, FetchOptions, Fetcher, PlainCredentials, RawRecord};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::Provider;
use crate::provider_policy::ProviderPolicy;
use crate::registry::ProviderContext;
use crate::schema::{Data, Field, FieldKind, Params, Schema, SchemaModel};
use crate::standard_models::{DividendCalendar, DividendCalendarData, DividendCalendarQuery, StandardModel};
use crate::throttling::ThrottlingQueue;
use crate::ValidationError;

const PROVIDER: &str = "nasdaq";
const CALENDAR_URL: &str = "https://api.nasdaq.com/api/calendar/dividends";
/// The API rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const MAX_RANGE_DAYS: i64 = 31;

pub fn load(context: &ProviderContext) -> Result<Provider, ValidationError> {
    let policy = ProviderPolicy::nasdaq_default();
    let fetcher = NasdaqDividendCalendarFetcher::new(Arc::clone(&context.http_client), &policy);
    Provider::builder(PROVIDER)
        .description("Nasdaq public market calendars.")
        .website("https://www.nasdaq.com")
        .policy(policy)
        .fetcher(DividendCalendar::NAME, fetcher)
        .build()
}

pub struct NasdaqDividendCalendarFetcher {
    http_client: Arc<dyn HttpClient>,
    throttling: ThrottlingQueue,
}

impl NasdaqDividendCalendarFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, policy: &ProviderPolicy) -> Self {
        Self {
            http_client,
            throttling: ThrottlingQueue::from_policy(policy),
        }
    }

    async fn fetch_day(&self, day: IsoDate, options: &FetchOptions) -> Result<Vec<RawRecord>, FetchError> {
        throttle(&self.throttling, PROVIDER)?;
        let endpoint = format!("{CALENDAR_URL}?date={day}");
        let request = HttpRequest::get(endpoint.clone())
            .with_header("User-Agent", USER_AGENT)
            .with_header("Accept", "application/json")
            .with_timeout_ms(options.timeout_ms);
        let body = fetch_body(self.http_client.as_ref(), PROVIDER, &endpoint, request).await?;

        // Days without distributions come back with `rows: null` or no calendar at all.
        match parse_json(PROVIDER, &body)?.pointer_mut("/data/calendar/rows").map(Value::take) {
            Some(Value::Array(rows)) => object_rows(PROVIDER, rows),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NasdaqDividendCalendarData {
    #[serde(flatten)]
    pub base: DividendCalendarData,
    /// Annualized dividend amount at the current rate.
    #[serde(default)]
    pub annualized_amount: Option<f64>,
}

impl SchemaModel for NasdaqDividendCalendarData {
    fn schema() -> Schema {
        Schema::new(
            "NasdaqDividendCalendarData",
            DividendCalendarData::fields()
                .into_iter()
                .chain([Field::optional(
                    "annualized_amount",
                    FieldKind::Float,
                    "The indicated annualized dividend amount.",
                )])
                .collect(),
        )
    }
}

impl Data for NasdaqDividendCalendarData {}

impl Fetcher for NasdaqDividendCalendarFetcher {
    type Query = DividendCalendarQuery;
    type Data = NasdaqDividendCalendarData;

    fn require_credentials(&self) -> bool {
        false
    }

    /// Start defaults to today and end to start; the range may span at most 31 days.
    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError> {
        let mut query = DividendCalendarQuery::from_record(&params)?;
        let start = query.start_date.unwrap_or_else(IsoDate::today);
        let end = query.end_date.unwrap_or(start);
        if start > end {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            }
            .into());
        }
        if start.days_until(end) > MAX_RANGE_DAYS {
            return Err(FetchError::invalid_query(format!(
                "nasdaq dividend calendar spans at most {MAX_RANGE_DAYS} days"
            )));
        }
        query.start_date = Some(start);
        query.end_date = Some(end);
        Ok(query)
    }

    fn extract_data<'a>(
        &'a self,
        query: &'a Self::Query,
        _credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
                return Err(FetchError::invalid_query("dividend calendar range is not set"));
            };
            let mut rows = Vec::new();
            let mut day = Some(start);
            while let Some(current) = day.filter(|current| *current <= end) {
                rows.extend(self.fetch_day(current, options).await?);
                day = current.next_day();
            }
            Ok(rows)
        })
    }

    fn transform_data(
        &self,
        _query: &Self::Query,
        data: Vec<RawRecord>,
        _options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError> {
        let normalized = data
            .into_iter()
            .map(normalize_row)
            .collect::<Result<Vec<_>, _>>()?;
        records_into(normalized)
    }
}

/// Renames Nasdaq's keys and converts `MM/DD/YYYY` dates to ISO.
fn normalize_row(mut row: RawRecord) -> Result<RawRecord, FetchError> {
    blank_to_null(&mut row);
    let mapping = [
        ("dividend_Ex_Date", "date"),
        ("symbol", "symbol"),
        ("companyName", "name"),
        ("record_Date", "record_date"),
        ("payment_Date", "payment_date"),
        ("announcement_Date", "declaration_date"),
        ("dividend_Rate", "amount"),
        ("indicated_Annual_Dividend", "annualized_amount"),
    ];

    let mut record = Map::new();
    for (from, to) in mapping {
        let value = row.remove(from).unwrap_or(Value::Null);
        let value = match (to, value) {
            ("date" | "record_date" | "payment_date" | "declaration_date", Value::String(raw)) => {
                Value::String(us_date(to, &raw)?.to_string())
            }
            (_, value) => value,
        };
        record.insert(to.to_owned(), value);
    }
    Ok(record)
}

fn us_date(field: &str, raw: &str) -> Result<IsoDate, FetchError> {
    let invalid = || {
        FetchError::invalid_record(&ValidationError::InvalidDate {
            field: field.to_owned(),
            value: raw.to_owned(),
        })
    };
    let mut parts = raw.trim().split('/');
    let (Some(month), Some(day), Some(year), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let month = month.parse::<u8>().map_err(|_| invalid())?;
    let day = day.parse::<u8>().map_err(|_| invalid())?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    IsoDate::from_ymd(year, month, day).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fetcher::AnyFetcher;
    use crate::http_client::{NoopHttpClient, StubHttpClient};

    fn fetcher_with(stub: StubHttpClient) -> (NasdaqDividendCalendarFetcher, Arc<StubHttpClient>) {
        let stub = stub.into_shared();
        let policy = ProviderPolicy::nasdaq_default();
        (NasdaqDividendCalendarFetcher::new(stub.clone(), &policy), stub)
    }

    #[test]
    fn end_defaults_to_start_and_range_is_capped() {
        let policy = ProviderPolicy::nasdaq_default();
        let fetcher = NasdaqDividendCalendarFetcher::new(Arc::new(NoopHttpClient), &policy);
        let params = json!({"start_date": "2024-01-02"});
        let query = fetcher
            .transform_query(params.as_object().cloned().expect("object"))
            .expect("valid");
        assert_eq!(query.end_date, query.start_date);

        let params = json!({"start_date": "2024-01-01", "end_date": "2024-03-01"});
        let err = fetcher
            .transform_query(params.as_object().cloned().expect("object"))
            .expect_err("too wide");
        assert_eq!(err.code(), "fetch.invalid_query");
    }

    #[tokio::test]
    async fn requests_each_day_and_normalizes_rows() {
        let (fetcher, stub) = fetcher_with(
            StubHttpClient::new()
                .with_json(
                    "date=2024-01-02",
                    r#"{"data":{"calendar":{"rows":[{"companyName":"Apple Inc.","symbol":"AAPL",
                        "dividend_Ex_Date":"01/02/2024","payment_Date":"1/15/2024","record_Date":"N/A",
                        "dividend_Rate":0.24,"announcement_Date":"12/20/2023","indicated_Annual_Dividend":0.96}]}}}"#,
                )
                .with_json("date=2024-01-03", r#"{"data":{"calendar":{"rows":null}}}"#),
        );
        let params = json!({"start_date": "2024-01-02", "end_date": "2024-01-03"});

        let records = fetcher
            .fetch_data(
                params.as_object().cloned().expect("object"),
                PlainCredentials::new(),
                FetchOptions::default(),
            )
            .await
            .expect("fetch succeeds");

        assert_eq!(stub.request_count(), 2);
        assert_eq!(
            stub.requests()[0].headers.get("user-agent").map(String::as_str),
            Some(USER_AGENT)
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["date"], json!("2024-01-02"));
        assert_eq!(records[0]["payment_date"], json!("2024-01-15"));
        assert_eq!(records[0]["record_date"], Value::Null);
        assert_eq!(records[0]["name"], json!("Apple Inc."));
        assert_eq!(records[0]["annualized_amount"], json!(0.96));
    }

    #[tokio::test]
    async fn requests_draw_from_the_declared_budget() {
        let stub = StubHttpClient::new()
            .with_json("api.nasdaq.com", r#"{"data":{"calendar":{"rows":null}}}"#)
            .into_shared();
        let policy = ProviderPolicy::new(PROVIDER, std::time::Duration::from_secs(60), 1);
        let fetcher = NasdaqDividendCalendarFetcher::new(stub.clone(), &policy);
        let params = json!({"start_date": "2024-01-02", "end_date": "2024-01-03"});

        let err = fetcher
            .fetch_data(
                params.as_object().cloned().expect("object"),
                PlainCredentials::new(),
                FetchOptions::default(),
            )
            .await
            .expect_err("second day exceeds a budget of one");

        assert_eq!(err.code(), "fetch.rate_limited");
        assert_eq!(stub.request_count(), 1);
    }

    #[test]
    fn malformed_dates_fail_the_record() {
        let err = us_date("date", "2024-01-02").expect_err("not a US date");
        assert_eq!(err.code(), "fetch.invalid_record");
    }
}
