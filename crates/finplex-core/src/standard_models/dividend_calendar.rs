use serde::{Deserialize, Serialize};

use crate::domain::{ensure_date_range, IsoDate};
use crate::schema::{Data, Field, FieldKind, QueryParams, Schema, SchemaModel};
use crate::standard_models::StandardModel;
use crate::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendCalendarQuery {
    #[serde(default)]
    pub start_date: Option<IsoDate>,
    #[serde(default)]
    pub end_date: Option<IsoDate>,
}

impl DividendCalendarQuery {
    pub(crate) fn fields() -> Vec<Field> {
        vec![
            Field::optional("start_date", FieldKind::Date, "Start date of the data, in YYYY-MM-DD format."),
            Field::optional("end_date", FieldKind::Date, "End date of the data, in YYYY-MM-DD format."),
        ]
    }
}

impl SchemaModel for DividendCalendarQuery {
    fn schema() -> Schema {
        Schema::new("DividendCalendarQuery", Self::fields())
    }

    fn check(&self) -> Result<(), ValidationError> {
        ensure_date_range(self.start_date, self.end_date)
    }
}

impl QueryParams for DividendCalendarQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendCalendarData {
    /// Ex-dividend date.
    pub date: IsoDate,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub record_date: Option<IsoDate>,
    #[serde(default)]
    pub payment_date: Option<IsoDate>,
    #[serde(default)]
    pub declaration_date: Option<IsoDate>,
    #[serde(default)]
    pub amount: Option<f64>,
}

impl DividendCalendarData {
    pub(crate) fn fields() -> Vec<Field> {
        vec![
            Field::required("date", FieldKind::Date, "The ex-dividend date."),
            Field::required("symbol", FieldKind::String, "Symbol representing the entity requested in the data."),
            Field::optional("name", FieldKind::String, "Name of the entity."),
            Field::optional("record_date", FieldKind::Date, "The record date of ownership for eligibility."),
            Field::optional("payment_date", FieldKind::Date, "The payment date of the dividend."),
            Field::optional("declaration_date", FieldKind::Date, "Declaration date of the dividend."),
            Field::optional("amount", FieldKind::Float, "Dividend amount, per-share."),
        ]
    }
}

impl SchemaModel for DividendCalendarData {
    fn schema() -> Schema {
        Schema::new("DividendCalendarData", Self::fields())
    }
}

impl Data for DividendCalendarData {}

/// Upcoming and historical dividend distributions by ex-date.
pub struct DividendCalendar;

impl StandardModel for DividendCalendar {
    const NAME: &'static str = "DividendCalendar";
    const DESCRIPTION: &'static str = "Get historical and upcoming dividend payments. Includes dividend amount, ex-dividend and payment dates.";

    type Query = DividendCalendarQuery;
    type Data = DividendCalendarData;
}
