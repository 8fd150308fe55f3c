use serde::{Deserialize, Serialize};

use crate::domain::{ensure_date_range, IsoDate};
use crate::schema::{Data, Field, FieldKind, QueryParams, Schema, SchemaModel};
use crate::standard_models::{Period, StandardModel};
use crate::ValidationError;

/// Unit of a GDP series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdpUnits {
    /// US dollars, current or constant prices.
    #[default]
    Usd,
    /// US dollars per capita.
    UsdCap,
}

/// Which GDP series a forecast is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdpKind {
    Nominal,
    #[default]
    Real,
}

fn date_fields() -> Vec<Field> {
    vec![
        Field::optional("start_date", FieldKind::Date, "Start date of the data, in YYYY-MM-DD format."),
        Field::optional("end_date", FieldKind::Date, "End date of the data, in YYYY-MM-DD format."),
    ]
}

fn units_field() -> Field {
    Field::optional("units", FieldKind::String, "The unit of measurement for the data: usd or usd_cap.")
        .default_value("usd")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdpNominalQuery {
    #[serde(default)]
    pub units: GdpUnits,
    #[serde(default)]
    pub start_date: Option<IsoDate>,
    #[serde(default)]
    pub end_date: Option<IsoDate>,
}

impl GdpNominalQuery {
    pub(crate) fn fields() -> Vec<Field> {
        let mut fields = vec![units_field()];
        fields.extend(date_fields());
        fields
    }
}

impl SchemaModel for GdpNominalQuery {
    fn schema() -> Schema {
        Schema::new("GdpNominalQuery", Self::fields())
    }

    fn check(&self) -> Result<(), ValidationError> {
        ensure_date_range(self.start_date, self.end_date)
    }
}

impl QueryParams for GdpNominalQuery {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdpRealQuery {
    #[serde(default)]
    pub units: GdpUnits,
    #[serde(default)]
    pub start_date: Option<IsoDate>,
    #[serde(default)]
    pub end_date: Option<IsoDate>,
}

impl GdpRealQuery {
    pub(crate) fn fields() -> Vec<Field> {
        GdpNominalQuery::fields()
    }
}

impl SchemaModel for GdpRealQuery {
    fn schema() -> Schema {
        Schema::new("GdpRealQuery", Self::fields())
    }

    fn check(&self) -> Result<(), ValidationError> {
        ensure_date_range(self.start_date, self.end_date)
    }
}

impl QueryParams for GdpRealQuery {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdpForecastQuery {
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub start_date: Option<IsoDate>,
    #[serde(default)]
    pub end_date: Option<IsoDate>,
    #[serde(default, rename = "type")]
    pub kind: GdpKind,
}

impl GdpForecastQuery {
    pub(crate) fn fields() -> Vec<Field> {
        let mut fields = vec![Field::optional(
            "period",
            FieldKind::String,
            "Time period of the data to return: quarter or annual.",
        )
        .default_value("annual")];
        fields.extend(date_fields());
        fields.push(
            Field::optional("type", FieldKind::String, "Type of GDP to forecast: nominal or real.")
                .default_value("real"),
        );
        fields
    }
}

impl SchemaModel for GdpForecastQuery {
    fn schema() -> Schema {
        Schema::new("GdpForecastQuery", Self::fields())
    }

    fn check(&self) -> Result<(), ValidationError> {
        ensure_date_range(self.start_date, self.end_date)
    }
}

impl QueryParams for GdpForecastQuery {}

/// Dated observation shared by all GDP models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdpValueData {
    pub date: IsoDate,
    #[serde(default)]
    pub value: Option<f64>,
}

impl GdpValueData {
    pub(crate) fn fields() -> Vec<Field> {
        vec![
            Field::required("date", FieldKind::Date, "The date of the data."),
            Field::optional("value", FieldKind::Float, "GDP value for the period."),
        ]
    }
}

impl SchemaModel for GdpValueData {
    fn schema() -> Schema {
        Schema::new("GdpData", Self::fields())
    }
}

impl Data for GdpValueData {}

pub struct GdpNominal;

impl StandardModel for GdpNominal {
    const NAME: &'static str = "GdpNominal";
    const DESCRIPTION: &'static str = "Get nominal gross domestic product, at current prices.";

    type Query = GdpNominalQuery;
    type Data = GdpValueData;
}

pub struct GdpReal;

impl StandardModel for GdpReal {
    const NAME: &'static str = "GdpReal";
    const DESCRIPTION: &'static str = "Get real gross domestic product, at constant prices.";

    type Query = GdpRealQuery;
    type Data = GdpValueData;
}

pub struct GdpForecast;

impl StandardModel for GdpForecast {
    const NAME: &'static str = "GdpForecast";
    const DESCRIPTION: &'static str = "Get forecasted gross domestic product.";

    type Query = GdpForecastQuery;
    type Data = GdpValueData;
}
