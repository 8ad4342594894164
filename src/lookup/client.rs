//! Client for an OpenFoodFacts compatible food database.
//!
//! Products come back with loosely typed `nutriments`: values may be numbers or
//! numeric strings and several keys are tried per nutrient. Anything that does
//! not read as a finite non-zero number falls through to the next key, then to 0.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{config::FoodLookupConfig, error::AppError, nutrition::Nutrients};

/// Upper bound on search results, also sent as the page size.
pub const MAX_SEARCH_RESULTS: usize = 12;

/// A product baseline offered by the food database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodCandidate {
    pub name: String,
    #[serde(flatten)]
    pub per100: Nutrients,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

#[async_trait]
pub trait FoodLookup: Send + Sync {
    /// At most [`MAX_SEARCH_RESULTS`] named products.
    async fn search(&self, query: &str) -> Result<Vec<FoodCandidate>, AppError>;
    /// `NotFound` when the database does not know the code.
    async fn by_barcode(&self, barcode: &str) -> Result<FoodCandidate, AppError>;
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default)]
    product_name: Value,
    #[serde(default)]
    generic_name: Value,
    #[serde(default)]
    brands: Value,
    #[serde(default)]
    nutriments: Value,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct BarcodeResponse {
    #[serde(default)]
    status: Value,
    #[serde(default)]
    product: Option<RawProduct>,
}

fn text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (n.is_finite() && n != 0.0).then_some(n)
}

fn first_number(nutriments: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| nutriments.get(key).and_then(number))
        .unwrap_or(0.0)
}

impl RawProduct {
    fn name(&self) -> Option<&str> {
        text(&self.product_name)
            .or_else(|| text(&self.generic_name))
            .or_else(|| text(&self.brands))
    }

    fn per100(&self) -> Nutrients {
        let n = &self.nutriments;
        Nutrients::new(
            first_number(n, &["energy-kcal_100g", "energy_100g"]),
            first_number(n, &["proteins_100g", "proteins"]),
            first_number(n, &["fat_100g", "fat"]),
            first_number(n, &["carbohydrates_100g", "carbohydrates"]),
        )
    }

    fn into_candidate(self, barcode: Option<String>) -> FoodCandidate {
        FoodCandidate {
            name: self.name().unwrap_or_default().to_string(),
            per100: self.per100(),
            barcode,
        }
    }
}

fn parse_search(body: SearchResponse) -> Vec<FoodCandidate> {
    body.products
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .filter(|p| p.name().is_some())
        .map(|p| p.into_candidate(None))
        .collect()
}

fn parse_barcode(body: BarcodeResponse, barcode: &str) -> Result<FoodCandidate, AppError> {
    if body.status.as_i64() != Some(1) {
        return Err(AppError::NotFound("product"));
    }
    Ok(body
        .product
        .unwrap_or_default()
        .into_candidate(Some(barcode.to_string())))
}

pub struct OpenFoodFactsClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(config: &FoodLookupConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url).context("FOOD_LOOKUP_BASE_URL")?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "FOOD_LOOKUP_BASE_URL must be an http(s) base url"
        );
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "food lookup request failed");
            AppError::Upstream(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "food lookup returned an error status");
            return Err(AppError::Upstream(format!("HTTP {status}")));
        }
        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "food lookup returned unreadable json");
            AppError::Upstream(format!("JSON parse error: {e}"))
        })
    }
}

#[async_trait]
impl FoodLookup for OpenFoodFactsClient {
    async fn search(&self, query: &str) -> Result<Vec<FoodCandidate>, AppError> {
        let page_size = MAX_SEARCH_RESULTS.to_string();
        let request = self.http_client.get(self.url(&["cgi", "search.pl"])).query(&[
            ("search_terms", query),
            ("search_simple", "1"),
            ("action", "process"),
            ("json", "1"),
            ("page_size", page_size.as_str()),
        ]);
        let body: SearchResponse = self.get_json(request).await?;
        let results = parse_search(body);
        debug!(query, count = results.len(), "food search");
        Ok(results)
    }

    async fn by_barcode(&self, barcode: &str) -> Result<FoodCandidate, AppError> {
        let file = format!("{barcode}.json");
        let request = self
            .http_client
            .get(self.url(&["api", "v0", "product", file.as_str()]));
        let body: BarcodeResponse = self.get_json(request).await?;
        parse_barcode(body, barcode)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search(body: Value) -> Vec<FoodCandidate> {
        parse_search(serde_json::from_value(body).expect("search body"))
    }

    #[test]
    fn name_falls_back_through_fields() {
        let results = search(json!({
            "products": [
                { "product_name": "Skyr", "brands": "Acme" },
                { "product_name": "", "generic_name": "Yoghurt" },
                { "brands": "Acme" },
                { "product_name": null, "nutriments": { "energy_100g": 10 } }
            ]
        }));
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Skyr", "Yoghurt", "Acme"]);
    }

    #[test]
    fn nutrients_accept_numbers_and_numeric_strings() {
        let results = search(json!({
            "products": [{
                "product_name": "Oat drink",
                "nutriments": {
                    "energy-kcal_100g": 0,
                    "energy_100g": "46",
                    "proteins": 1.0,
                    "fat_100g": "1.5",
                    "carbohydrates_100g": "n/a"
                }
            }]
        }));
        assert_eq!(results[0].per100, Nutrients::new(46.0, 1.0, 1.5, 0.0));
    }

    #[test]
    fn search_is_capped() {
        let products: Vec<Value> = (0..20)
            .map(|i| json!({ "product_name": format!("p{i}") }))
            .collect();
        assert_eq!(search(json!({ "products": products })).len(), MAX_SEARCH_RESULTS);
        assert!(search(json!({})).is_empty());
    }

    #[test]
    fn barcode_status_other_than_one_is_not_found() {
        let body: BarcodeResponse =
            serde_json::from_value(json!({ "status": 0, "status_verbose": "product not found" }))
                .expect("body");
        assert!(matches!(
            parse_barcode(body, "123"),
            Err(AppError::NotFound("product"))
        ));
    }

    #[test]
    fn barcode_hit_carries_code() {
        let body: BarcodeResponse = serde_json::from_value(json!({
            "status": 1,
            "product": {
                "product_name": "Rye bread",
                "nutriments": { "energy-kcal_100g": 259, "proteins_100g": 8.5 }
            }
        }))
        .expect("body");
        let hit = parse_barcode(body, "4750000000000").expect("hit");
        assert_eq!(hit.name, "Rye bread");
        assert_eq!(hit.per100.kcal, 259.0);
        assert_eq!(hit.barcode.as_deref(), Some("4750000000000"));

        let json = serde_json::to_value(&hit).expect("serialize");
        assert_eq!(json["protein"], 8.5);
        assert_eq!(json["barcode"], "4750000000000");
    }

    #[test]
    fn urls_are_built_from_segments() {
        let client = OpenFoodFactsClient::new(&FoodLookupConfig {
            base_url: "https://food.example/".into(),
            timeout_secs: 1,
        })
        .expect("client");
        assert_eq!(
            client.url(&["api", "v0", "product", "12/34.json"]).as_str(),
            "https://food.example/api/v0/product/12%2F34.json"
        );
    }
}
