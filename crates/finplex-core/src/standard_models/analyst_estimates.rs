use serde::{Deserialize, Serialize};

use crate::domain::{IsoDate, Symbol};
use crate::schema::{Data, Field, FieldKind, QueryParams, Schema, SchemaModel};
use crate::standard_models::{Period, StandardModel};

const fn default_limit() -> u32 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystEstimatesQuery {
    pub symbol: Symbol,
    #[serde(default)]
    pub period: Period,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl SchemaModel for AnalystEstimatesQuery {
    fn schema() -> Schema {
        Schema::new(
            "AnalystEstimatesQuery",
            vec![
                Field::required("symbol", FieldKind::String, "Symbol to get data for."),
                Field::optional("period", FieldKind::String, "Time period of the data to return: quarter or annual.")
                    .default_value("annual"),
                Field::optional("limit", FieldKind::Integer, "The number of data entries to return.")
                    .default_value(30),
            ],
        )
    }
}

impl QueryParams for AnalystEstimatesQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystEstimatesData {
    pub symbol: String,
    pub date: IsoDate,
    #[serde(default, alias = "estimatedRevenueLow")]
    pub estimated_revenue_low: Option<i64>,
    #[serde(default, alias = "estimatedRevenueHigh")]
    pub estimated_revenue_high: Option<i64>,
    #[serde(default, alias = "estimatedRevenueAvg")]
    pub estimated_revenue_avg: Option<i64>,
    #[serde(default, alias = "estimatedEbitdaLow")]
    pub estimated_ebitda_low: Option<i64>,
    #[serde(default, alias = "estimatedEbitdaHigh")]
    pub estimated_ebitda_high: Option<i64>,
    #[serde(default, alias = "estimatedEbitdaAvg")]
    pub estimated_ebitda_avg: Option<i64>,
    #[serde(default, alias = "estimatedEbitAvg")]
    pub estimated_ebit_avg: Option<i64>,
    #[serde(default, alias = "estimatedNetIncomeAvg")]
    pub estimated_net_income_avg: Option<i64>,
    #[serde(default, alias = "estimatedSgaExpenseAvg")]
    pub estimated_sga_expense_avg: Option<i64>,
    #[serde(default, alias = "estimatedEpsAvg")]
    pub estimated_eps_avg: Option<f64>,
    #[serde(default, alias = "estimatedEpsHigh")]
    pub estimated_eps_high: Option<f64>,
    #[serde(default, alias = "estimatedEpsLow")]
    pub estimated_eps_low: Option<f64>,
    #[serde(default, alias = "numberAnalystEstimatedRevenue")]
    pub number_analyst_estimated_revenue: Option<i64>,
    #[serde(default, alias = "numberAnalystsEstimatedEps")]
    pub number_analysts_estimated_eps: Option<i64>,
}

impl SchemaModel for AnalystEstimatesData {
    fn schema() -> Schema {
        let int = |name: &str, description: &str| Field::optional(name, FieldKind::Integer, description);
        let float = |name: &str, description: &str| Field::optional(name, FieldKind::Float, description);
        Schema::new(
            "AnalystEstimatesData",
            vec![
                Field::required("symbol", FieldKind::String, "Symbol representing the entity requested in the data."),
                Field::required("date", FieldKind::Date, "The date of the estimate."),
                int("estimated_revenue_low", "Estimated revenue low."),
                int("estimated_revenue_high", "Estimated revenue high."),
                int("estimated_revenue_avg", "Estimated revenue average."),
                int("estimated_ebitda_low", "Estimated EBITDA low."),
                int("estimated_ebitda_high", "Estimated EBITDA high."),
                int("estimated_ebitda_avg", "Estimated EBITDA average."),
                int("estimated_ebit_avg", "Estimated EBIT average."),
                int("estimated_net_income_avg", "Estimated net income average."),
                int("estimated_sga_expense_avg", "Estimated SGA expense average."),
                float("estimated_eps_avg", "Estimated EPS average."),
                float("estimated_eps_high", "Estimated EPS high."),
                float("estimated_eps_low", "Estimated EPS low."),
                int("number_analyst_estimated_revenue", "Number of analysts who estimated revenue."),
                int("number_analysts_estimated_eps", "Number of analysts who estimated EPS."),
            ],
        )
    }
}

impl Data for AnalystEstimatesData {}

/// Consensus analyst estimates per fiscal period.
pub struct AnalystEstimates;

impl StandardModel for AnalystEstimates {
    const NAME: &'static str = "AnalystEstimates";
    const DESCRIPTION: &'static str = "Get historical analyst estimates for earnings and revenue.";

    type Query = AnalystEstimatesQuery;
    type Data = AnalystEstimatesData;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_upper_cases_symbol_and_applies_defaults() {
        let record = json!({"symbol": "msft"});
        let query = AnalystEstimatesQuery::from_record(record.as_object().expect("object"))
            .expect("query should parse");

        assert_eq!(query.symbol.as_str(), "MSFT");
        assert_eq!(query.period, Period::Annual);
        assert_eq!(query.limit, 30);
    }

    #[test]
    fn query_rejects_unknown_period() {
        let record = json!({"symbol": "MSFT", "period": "weekly"});
        assert!(AnalystEstimatesQuery::from_record(record.as_object().expect("object")).is_err());
    }
}
