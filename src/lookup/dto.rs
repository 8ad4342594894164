use serde::{Deserialize, Serialize};

use super::client::FoodCandidate;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct BarcodeParams {
    #[serde(default)]
    pub barcode: String,
}

/// Search never fails the request; an upstream problem is reported in `error`.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<FoodCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct BarcodeResponse {
    pub result: FoodCandidate,
}
