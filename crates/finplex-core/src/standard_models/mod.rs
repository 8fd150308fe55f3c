//! Provider-independent model contracts.
//!
//! Each standard model pairs a query schema with a data schema. Provider fetchers
//! extend these schemas and routes are bound to them by name.

mod analyst_estimates;
mod crypto_search;
mod discovery_filings;
mod dividend_calendar;
mod gdp;

use serde::{Deserialize, Serialize};

use crate::schema::{Data, QueryParams, Schema};

pub use analyst_estimates::{AnalystEstimates, AnalystEstimatesData, AnalystEstimatesQuery};
pub use crypto_search::{CryptoSearch, CryptoSearchData, CryptoSearchQuery};
pub use discovery_filings::{DiscoveryFilings, DiscoveryFilingsData, DiscoveryFilingsQuery};
pub use dividend_calendar::{DividendCalendar, DividendCalendarData, DividendCalendarQuery};
pub use gdp::{
    GdpForecast, GdpForecastQuery, GdpKind, GdpNominal, GdpNominalQuery, GdpReal, GdpRealQuery,
    GdpUnits, GdpValueData,
};

/// Cardinality of a model's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    Single,
    List,
    /// A single record, or a list when the query matches several.
    SingleOrList,
}

/// Reporting period shared by several queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Quarter,
    #[default]
    Annual,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quarter => "quarter",
            Self::Annual => "annual",
        }
    }
}

/// Runtime description of one standard model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
    pub shape: ResultShape,
    pub query: Schema,
    pub data: Schema,
}

/// Compile-time contract of a standard model.
pub trait StandardModel: Send + Sync + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const SHAPE: ResultShape = ResultShape::List;

    type Query: QueryParams;
    type Data: Data;

    fn info() -> ModelInfo {
        ModelInfo {
            name: Self::NAME.to_owned(),
            description: Self::DESCRIPTION.to_owned(),
            shape: Self::SHAPE,
            query: <Self::Query as crate::schema::SchemaModel>::schema(),
            data: <Self::Data as crate::schema::SchemaModel>::schema(),
        }
    }
}

/// Every standard model known to this build.
pub fn catalogue() -> Vec<ModelInfo> {
    vec![
        AnalystEstimates::info(),
        CryptoSearch::info(),
        DiscoveryFilings::info(),
        DividendCalendar::info(),
        GdpForecast::info(),
        GdpNominal::info(),
        GdpReal::info(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_schemas_are_well_formed() {
        for info in catalogue() {
            info.query.validate().expect("query schema should be valid");
            info.data.validate().expect("data schema should be valid");
            assert!(!info.description.is_empty(), "{} needs a description", info.name);
        }
    }

    #[test]
    fn catalogue_names_are_unique() {
        let mut names = catalogue().into_iter().map(|info| info.name).collect::<Vec<_>>();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
