//! Shared fixtures for the behavior suites: canned upstream payloads and an
//! offline platform wired to a [`StubHttpClient`].

#![allow(dead_code)]

use std::sync::Arc;

use finplex_core::config::EnvLookup;
use finplex_core::{Platform, PlatformConfig, SecretString, StubHttpClient};

pub const FMP_KEY: &str = "fmp-test-key-0001";

pub const FMP_DIVIDENDS: &str = r#"[
    {"date": "2024-01-02", "label": "January 02, 24", "adjDividend": 0.24, "symbol": "AAPL",
     "dividend": 0.24, "recordDate": "2024-01-03", "paymentDate": "2024-01-15", "declarationDate": ""},
    {"date": "2024-01-03", "label": "January 03, 24", "adjDividend": 0.75, "symbol": "MSFT",
     "dividend": 0.75, "recordDate": "", "paymentDate": "2024-03-14", "declarationDate": "2023-11-28"}
]"#;

pub const FMP_ESTIMATES: &str = r#"[
    {"symbol": "AAPL", "date": "2024-09-28", "estimatedRevenueLow": 380000000000,
     "estimatedRevenueHigh": 400000000000, "estimatedRevenueAvg": 390000000000,
     "estimatedEpsAvg": 6.7, "numberAnalystsEstimatedEps": 30}
]"#;

pub const NASDAQ_DAY: &str = r#"{"data": {"calendar": {"rows": [
    {"companyName": "Apple Inc.", "symbol": "AAPL", "dividend_Ex_Date": "01/02/2024",
     "payment_Date": "01/15/2024", "record_Date": "01/03/2024", "dividend_Rate": 0.24,
     "indicated_Annual_Dividend": 0.96, "announcement_Date": "12/20/2023"}
]}}}"#;

pub const OECD_REAL: &str = "DATAFLOW,REF_AREA,TIME_PERIOD,OBS_VALUE\n\
    OECD.SDD.NAD:DSD_NAMAIN10@DF_TABLE1_EXPENDITURE(1.0),USA,2022,21822037.0\n\
    OECD.SDD.NAD:DSD_NAMAIN10@DF_TABLE1_EXPENDITURE(1.0),USA,2021,21407693.0\n";

/// Canned responses for every installed provider.
pub fn stub_upstreams() -> StubHttpClient {
    StubHttpClient::new()
        .with_json("stock_dividend_calendar", FMP_DIVIDENDS)
        .with_json("analyst-estimates", FMP_ESTIMATES)
        .with_json("api.nasdaq.com", NASDAQ_DAY)
        .with_json("sdmx.oecd.org", OECD_REAL)
}

/// An environment with no variables set.
pub fn empty_env() -> EnvLookup {
    Arc::new(|_| None)
}

/// Configuration with the FMP key set and nothing read from disk.
pub fn test_config() -> PlatformConfig {
    let mut config = PlatformConfig::default();
    config
        .credentials
        .insert(String::from("fmp_api_key"), SecretString::new(FMP_KEY));
    config.http.retry.max_retries = 0;
    config
}

pub fn platform_with(stub: Arc<StubHttpClient>, config: PlatformConfig) -> Platform {
    Platform::builder()
        .with_config(config)
        .with_http_client(stub)
        .with_env_lookup(empty_env())
        .build()
        .expect("platform should build")
}

pub fn offline_platform() -> (Platform, Arc<StubHttpClient>) {
    let stub = stub_upstreams().into_shared();
    (platform_with(Arc::clone(&stub), test_config()), stub)
}
