use serde::{Deserialize, Serialize};

use crate::schema::{Data, Field, FieldKind, QueryParams, Schema, SchemaModel};
use crate::standard_models::StandardModel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoSearchQuery {
    /// Case-insensitive substring; empty matches everything.
    #[serde(default)]
    pub query: String,
}

impl SchemaModel for CryptoSearchQuery {
    fn schema() -> Schema {
        Schema::new(
            "CryptoSearchQuery",
            vec![Field::optional("query", FieldKind::String, "Search query.").default_value("")],
        )
    }
}

impl QueryParams for CryptoSearchQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoSearchData {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SchemaModel for CryptoSearchData {
    fn schema() -> Schema {
        Schema::new(
            "CryptoSearchData",
            vec![
                Field::required("symbol", FieldKind::String, "Symbol representing the entity requested in the data. (Crypto)"),
                Field::optional("name", FieldKind::String, "Name of the crypto."),
            ],
        )
    }
}

impl Data for CryptoSearchData {}

pub struct CryptoSearch;

impl StandardModel for CryptoSearch {
    const NAME: &'static str = "CryptoSearch";
    const DESCRIPTION: &'static str = "Search available cryptocurrency pairs within a provider.";

    type Query = CryptoSearchQuery;
    type Data = CryptoSearchData;
}
