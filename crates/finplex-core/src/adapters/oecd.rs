//! OECD SDMX data API.
//!
//! Series are requested as SDMX-CSV and read by column name (`REF_AREA`,
//! `TIME_PERIOD`, `OBS_VALUE`), so extra dimension columns are ignored.
//! Observation periods (`2023`, `2023-Q2`, `2023-05`) resolve to the first day
//! of the period.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::adapters::{fetch_body, throttle};
use crate::domain::IsoDate;
use crate::fetcher::{records_into, FetchError, FetchFuture, FetchOptions, Fetcher, PlainCredentials, RawRecord};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::Provider;
use crate::provider_policy::ProviderPolicy;
use crate::registry::ProviderContext;
use crate::schema::{Data, Field, FieldKind, Params, QueryParams, Schema, SchemaModel};
use crate::standard_models::{
    GdpForecast, GdpForecastQuery, GdpKind, GdpNominal, GdpNominalQuery, GdpReal, GdpRealQuery, GdpUnits,
    GdpValueData, Period, StandardModel,
};
use crate::throttling::ThrottlingQueue;
use crate::ValidationError;

const PROVIDER: &str = "oecd";
const BASE_URL: &str = "https://sdmx.oecd.org/public/rest/data";
const SDMX_CSV: &str = "application/vnd.sdmx.data+csv; charset=utf-8";
const DEFAULT_COUNTRY: &str = "united_states";

/// Country names accepted by the `country` parameter and their ISO 3166 alpha-3 codes.
/// `all` maps to the SDMX wildcard.
const COUNTRIES: &[(&str, &str)] = &[
    ("all", ""),
    ("australia", "AUS"),
    ("brazil", "BRA"),
    ("canada", "CAN"),
    ("china", "CHN"),
    ("france", "FRA"),
    ("germany", "DEU"),
    ("india", "IND"),
    ("italy", "ITA"),
    ("japan", "JPN"),
    ("korea", "KOR"),
    ("mexico", "MEX"),
    ("spain", "ESP"),
    ("united_kingdom", "GBR"),
    ("united_states", "USA"),
];

pub fn load(context: &ProviderContext) -> Result<Provider, ValidationError> {
    let policy = ProviderPolicy::oecd_default();
    let client = OecdClient::new(Arc::clone(&context.http_client), &policy);
    Provider::builder(PROVIDER)
        .description("Organisation for Economic Co-operation and Development statistics.")
        .website("https://data-explorer.oecd.org")
        .policy(policy)
        .fetcher(GdpForecast::NAME, OecdGdpForecastFetcher::new(client.clone()))
        .fetcher(GdpNominal::NAME, OecdGdpNominalFetcher::new(client.clone()))
        .fetcher(GdpReal::NAME, OecdGdpRealFetcher::new(client))
        .build()
}

fn country_code(country: &str) -> Result<&'static str, ValidationError> {
    let normalized = country.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    COUNTRIES
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, code)| *code)
        .ok_or_else(|| ValidationError::InvalidValue {
            field: String::from("country"),
            message: format!(
                "unknown country '{country}'; choose one of: {}",
                COUNTRIES.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
            ),
        })
}

fn country_name(code: &str) -> String {
    COUNTRIES
        .iter()
        .find(|(_, known)| !known.is_empty() && known.eq_ignore_ascii_case(code))
        .map_or_else(|| code.to_owned(), |(name, _)| (*name).to_owned())
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_owned()
}

fn country_field() -> Field {
    Field::optional("country", FieldKind::String, "Country to get GDP for, or 'all'.")
        .default_value(DEFAULT_COUNTRY)
}

/// Transport shared by the GDP fetchers.
#[derive(Clone)]
pub struct OecdClient {
    http_client: Arc<dyn HttpClient>,
    throttling: ThrottlingQueue,
}

impl OecdClient {
    pub fn new(http_client: Arc<dyn HttpClient>, policy: &ProviderPolicy) -> Self {
        Self {
            http_client,
            throttling: ThrottlingQueue::from_policy(policy),
        }
    }

    /// Fetches one dataflow key as SDMX-CSV and returns `{date, value, country}` rows.
    async fn get_series(
        &self,
        series: &str,
        start: Option<IsoDate>,
        end: Option<IsoDate>,
        options: &FetchOptions,
    ) -> Result<Vec<RawRecord>, FetchError> {
        throttle(&self.throttling, PROVIDER)?;
        let mut url = format!("{BASE_URL}/{series}?dimensionAtObservation=AllDimensions");
        if let Some(start) = start {
            url.push_str(&format!("&startPeriod={}", start.into_inner().year()));
        }
        if let Some(end) = end {
            url.push_str(&format!("&endPeriod={}", end.into_inner().year()));
        }
        let request = HttpRequest::get(url.clone())
            .with_header("Accept", SDMX_CSV)
            .with_timeout_ms(options.timeout_ms);
        let body = fetch_body(self.http_client.as_ref(), PROVIDER, &url, request).await?;
        let rows = parse_sdmx_csv(&body)?;
        debug!(provider = PROVIDER, series, rows = rows.len(), "parsed series");
        Ok(rows)
    }
}

fn parse_sdmx_csv(body: &str) -> Result<Vec<RawRecord>, FetchError> {
    let invalid = |error: csv::Error| FetchError::parse(format!("failed to parse oecd response: {error}"));
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let headers = reader.headers().map_err(invalid)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| FetchError::parse(format!("oecd response has no {name} column")))
    };
    let (area, period, value) = (column("REF_AREA")?, column("TIME_PERIOD")?, column("OBS_VALUE")?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(invalid)?;
        let date = observation_date(record.get(period).unwrap_or_default())?;
        let value = record
            .get(value)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<f64>()
                    .map_err(|_| FetchError::parse(format!("oecd observation '{raw}' is not a number")))
            })
            .transpose()?;
        let row = json!({
            "date": date.to_string(),
            "value": value,
            "country": country_name(record.get(area).unwrap_or_default()),
        });
        if let Value::Object(row) = row {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn observation_date(raw: &str) -> Result<IsoDate, FetchError> {
    let invalid = || FetchError::parse(format!("unrecognized oecd time period '{raw}'"));
    let (year, rest) = raw.split_once('-').map_or((raw, None), |(year, rest)| (year, Some(rest)));
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = match rest {
        None => 1,
        Some(quarter) if quarter.starts_with('Q') => match quarter[1..].parse::<u8>() {
            Ok(q @ 1..=4) => (q - 1) * 3 + 1,
            _ => return Err(invalid()),
        },
        Some(month) => month.parse::<u8>().map_err(|_| invalid())?,
    };
    IsoDate::from_ymd(year, month, 1).map_err(|_| invalid())
}

/// A GDP query extended with the OECD `country` parameter.
pub trait OecdSeriesQuery: QueryParams {
    fn country(&self) -> &str;

    fn date_range(&self) -> (Option<IsoDate>, Option<IsoDate>);

    /// SDMX `dataflow/key` path for `area` (an ISO3 code, or empty for all areas).
    fn series(&self, area: &str) -> String;
}

macro_rules! oecd_query {
    ($name:ident, $base:ty) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(flatten)]
            pub base: $base,
            #[serde(default = "default_country")]
            pub country: String,
        }

        impl SchemaModel for $name {
            fn schema() -> Schema {
                Schema::new(
                    stringify!($name),
                    <$base>::fields().into_iter().chain([country_field()]).collect(),
                )
            }

            fn check(&self) -> Result<(), ValidationError> {
                self.base.check()?;
                country_code(&self.country).map(|_| ())
            }
        }

        impl QueryParams for $name {}
    };
}

oecd_query!(OecdGdpNominalQuery, GdpNominalQuery);
oecd_query!(OecdGdpRealQuery, GdpRealQuery);
oecd_query!(OecdGdpForecastQuery, GdpForecastQuery);

fn national_accounts_key(area: &str, units: GdpUnits, price_base: &str) -> String {
    let unit = match units {
        GdpUnits::Usd => "USD_PPP",
        GdpUnits::UsdCap => "USD_PPP_PS",
    };
    format!("OECD.SDD.NAD,DSD_NAMAIN10@DF_TABLE1_EXPENDITURE,1.0/A.{area}.S1..B1GQ._Z..{unit}.{price_base}.N.T0102")
}

impl OecdSeriesQuery for OecdGdpNominalQuery {
    fn country(&self) -> &str {
        &self.country
    }

    fn date_range(&self) -> (Option<IsoDate>, Option<IsoDate>) {
        (self.base.start_date, self.base.end_date)
    }

    fn series(&self, area: &str) -> String {
        national_accounts_key(area, self.base.units, "V")
    }
}

impl OecdSeriesQuery for OecdGdpRealQuery {
    fn country(&self) -> &str {
        &self.country
    }

    fn date_range(&self) -> (Option<IsoDate>, Option<IsoDate>) {
        (self.base.start_date, self.base.end_date)
    }

    fn series(&self, area: &str) -> String {
        national_accounts_key(area, self.base.units, "LR")
    }
}

impl OecdSeriesQuery for OecdGdpForecastQuery {
    fn country(&self) -> &str {
        &self.country
    }

    fn date_range(&self) -> (Option<IsoDate>, Option<IsoDate>) {
        (self.base.start_date, self.base.end_date)
    }

    /// Economic Outlook projections: `GDP` is nominal, `GDPV` is volume.
    fn series(&self, area: &str) -> String {
        let measure = match self.base.kind {
            GdpKind::Nominal => "GDP",
            GdpKind::Real => "GDPV",
        };
        let frequency = match self.base.period {
            Period::Annual => "A",
            Period::Quarter => "Q",
        };
        format!("OECD.ECO.MAD,DSD_EO@DF_EO,1.1/{area}.{measure}.{frequency}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OecdGdpData {
    #[serde(flatten)]
    pub base: GdpValueData,
    #[serde(default)]
    pub country: Option<String>,
}

impl SchemaModel for OecdGdpData {
    fn schema() -> Schema {
        Schema::new(
            "OecdGdpData",
            GdpValueData::fields()
                .into_iter()
                .chain([Field::optional("country", FieldKind::String, "The country represented by the data.")])
                .collect(),
        )
    }
}

impl Data for OecdGdpData {}

/// Fetcher for one OECD GDP series; the query type selects the dataflow.
pub struct OecdGdpFetcher<Q> {
    client: OecdClient,
    query: PhantomData<fn() -> Q>,
}

impl<Q> OecdGdpFetcher<Q> {
    pub fn new(client: OecdClient) -> Self {
        Self {
            client,
            query: PhantomData,
        }
    }
}

pub type OecdGdpNominalFetcher = OecdGdpFetcher<OecdGdpNominalQuery>;
pub type OecdGdpRealFetcher = OecdGdpFetcher<OecdGdpRealQuery>;
pub type OecdGdpForecastFetcher = OecdGdpFetcher<OecdGdpForecastQuery>;

impl<Q: OecdSeriesQuery> Fetcher for OecdGdpFetcher<Q> {
    type Query = Q;
    type Data = OecdGdpData;

    fn require_credentials(&self) -> bool {
        false
    }

    fn transform_query(&self, params: Params) -> Result<Self::Query, FetchError> {
        Ok(Q::from_record(&params)?)
    }

    fn extract_data<'a>(
        &'a self,
        query: &'a Self::Query,
        _credentials: &'a PlainCredentials,
        options: &'a FetchOptions,
    ) -> FetchFuture<'a, Vec<RawRecord>> {
        Box::pin(async move {
            let area = country_code(query.country())?;
            let (start, end) = query.date_range();
            self.client
                .get_series(&query.series(area), start, end, options)
                .await
        })
    }

    /// Drops observations outside the requested range and orders by date.
    fn transform_data(
        &self,
        query: &Self::Query,
        data: Vec<RawRecord>,
        _options: &FetchOptions,
    ) -> Result<Vec<Self::Data>, FetchError> {
        let (start, end) = query.date_range();
        let mut records = records_into::<OecdGdpData>(data)?
            .into_iter()
            .filter(|record| start.map_or(true, |start| record.base.date >= start))
            .filter(|record| end.map_or(true, |end| record.base.date <= end))
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            a.base
                .date
                .cmp(&b.base.date)
                .then_with(|| a.country.cmp(&b.country))
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::AnyFetcher;
    use crate::http_client::{NoopHttpClient, StubHttpClient};

    const NOMINAL_CSV: &str = "DATAFLOW,REF_AREA,FREQ,TIME_PERIOD,OBS_VALUE\n\
        OECD.SDD.NAD:DSD_NAMAIN10@DF_TABLE1_EXPENDITURE(1.0),USA,A,2022,25744108.0\n\
        OECD.SDD.NAD:DSD_NAMAIN10@DF_TABLE1_EXPENDITURE(1.0),USA,A,2020,21354105.0\n\
        OECD.SDD.NAD:DSD_NAMAIN10@DF_TABLE1_EXPENDITURE(1.0),USA,A,2021,\n";

    fn client_over(http_client: Arc<dyn HttpClient>) -> OecdClient {
        OecdClient::new(http_client, &ProviderPolicy::oecd_default())
    }

    fn params(value: Value) -> Params {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn periods_resolve_to_their_first_day() {
        assert_eq!(observation_date("2023").expect("year").to_string(), "2023-01-01");
        assert_eq!(observation_date("2023-Q3").expect("quarter").to_string(), "2023-07-01");
        assert_eq!(observation_date("2023-05").expect("month").to_string(), "2023-05-01");
        assert!(observation_date("2023-Q5").is_err());
        assert!(observation_date("soon").is_err());
    }

    #[test]
    fn country_defaults_and_unknown_countries_are_rejected() {
        let fetcher = OecdGdpRealFetcher::new(client_over(Arc::new(NoopHttpClient)));
        let query = fetcher.transform_query(Params::new()).expect("defaults apply");
        assert_eq!(query.country, "united_states");

        let err = fetcher
            .transform_query(params(json!({"country": "atlantis"})))
            .expect_err("unknown country");
        assert_eq!(err.code(), "fetch.invalid_query");
    }

    #[test]
    fn extended_queries_keep_the_standard_schema() {
        OecdGdpForecastQuery::schema()
            .check_extends(&GdpForecastQuery::schema())
            .expect("forecast extends");
        OecdGdpData::schema()
            .check_extends(&GdpValueData::schema())
            .expect("data extends");
    }

    #[tokio::test]
    async fn nominal_series_is_filtered_and_sorted() {
        let stub = StubHttpClient::new()
            .with_json("DF_TABLE1_EXPENDITURE", NOMINAL_CSV)
            .into_shared();
        let fetcher = OecdGdpNominalFetcher::new(client_over(stub.clone()));

        let records = fetcher
            .fetch_data(
                params(json!({"start_date": "2021-01-01", "country": "united_states"})),
                PlainCredentials::new(),
                FetchOptions::default(),
            )
            .await
            .expect("fetch succeeds");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.contains("/A.USA.S1..B1GQ._Z..USD_PPP.V."));
        assert!(requests[0].url.contains("startPeriod=2021"));
        assert_eq!(
            records,
            vec![
                json!({"date": "2021-01-01", "value": null, "country": "united_states"}),
                json!({"date": "2022-01-01", "value": 25744108.0, "country": "united_states"}),
            ]
        );
    }

    #[tokio::test]
    async fn forecast_key_follows_kind_and_period() {
        let stub = StubHttpClient::new()
            .with_json("DF_EO", "REF_AREA,TIME_PERIOD,OBS_VALUE\nDEU,2025-Q1,1.5\n")
            .into_shared();
        let fetcher = OecdGdpForecastFetcher::new(client_over(stub.clone()));

        let records = fetcher
            .fetch_data(
                params(json!({"country": "germany", "type": "nominal", "period": "quarter"})),
                PlainCredentials::new(),
                FetchOptions::default(),
            )
            .await
            .expect("fetch succeeds");

        assert!(stub.requests()[0].url.contains("DF_EO,1.1/DEU.GDP.Q"));
        assert_eq!(records[0]["country"], json!("germany"));
        assert_eq!(records[0]["date"], json!("2025-01-01"));
    }
}
