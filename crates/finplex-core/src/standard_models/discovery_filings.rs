use serde::{Deserialize, Serialize};

use crate::domain::{ensure_date_range, IsoDate};
use crate::schema::{Data, Field, FieldKind, QueryParams, Schema, SchemaModel};
use crate::standard_models::StandardModel;
use crate::ValidationError;

const fn default_limit() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryFilingsQuery {
    #[serde(default)]
    pub start_date: Option<IsoDate>,
    #[serde(default)]
    pub end_date: Option<IsoDate>,
    #[serde(default)]
    pub form_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl DiscoveryFilingsQuery {
    pub(crate) fn fields() -> Vec<Field> {
        vec![
            Field::optional("start_date", FieldKind::Date, "Start date of the data, in YYYY-MM-DD format."),
            Field::optional("end_date", FieldKind::Date, "End date of the data, in YYYY-MM-DD format."),
            Field::optional("form_type", FieldKind::String, "Filter by form type, e.g. 10-K, 8-K."),
            Field::optional("limit", FieldKind::Integer, "The number of data entries to return.")
                .default_value(100),
        ]
    }
}

impl SchemaModel for DiscoveryFilingsQuery {
    fn schema() -> Schema {
        Schema::new("DiscoveryFilingsQuery", Self::fields())
    }

    fn check(&self) -> Result<(), ValidationError> {
        ensure_date_range(self.start_date, self.end_date)
    }
}

impl QueryParams for DiscoveryFilingsQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryFilingsData {
    #[serde(default)]
    pub symbol: Option<String>,
    pub cik: String,
    pub title: String,
    pub date: IsoDate,
    pub form_type: String,
    pub link: String,
}

impl DiscoveryFilingsData {
    pub(crate) fn fields() -> Vec<Field> {
        vec![
            Field::optional("symbol", FieldKind::String, "Symbol representing the entity requested in the data."),
            Field::required("cik", FieldKind::String, "Central Index Key (CIK) for the requested entity."),
            Field::required("title", FieldKind::String, "Title of the filing."),
            Field::required("date", FieldKind::Date, "Date of the filing."),
            Field::required("form_type", FieldKind::String, "The form type of the filing."),
            Field::required("link", FieldKind::String, "URL to the filing page on the SEC site."),
        ]
    }
}

impl SchemaModel for DiscoveryFilingsData {
    fn schema() -> Schema {
        Schema::new("DiscoveryFilingsData", Self::fields())
    }
}

impl Data for DiscoveryFilingsData {}

/// Recent regulatory filings across all companies.
pub struct DiscoveryFilings;

impl StandardModel for DiscoveryFilings {
    const NAME: &'static str = "DiscoveryFilings";
    const DESCRIPTION: &'static str = "Search for the most recent SEC filings, optionally filtered by form type and date range.";

    type Query = DiscoveryFilingsQuery;
    type Data = DiscoveryFilingsData;
}
