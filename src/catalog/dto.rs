use serde::{Deserialize, Serialize};

use crate::{input::NumberInput, nutrition::CatalogItem};

#[derive(Debug, Default, Deserialize)]
pub struct CreateCatalogItemRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kcal_per100: Option<NumberInput>,
    #[serde(default)]
    pub protein_per100: Option<NumberInput>,
    #[serde(default)]
    pub fat_per100: Option<NumberInput>,
    #[serde(default)]
    pub carbs_per100: Option<NumberInput>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub items: Vec<CatalogItem>,
}
