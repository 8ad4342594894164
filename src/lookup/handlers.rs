use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{BarcodeParams, BarcodeResponse, SearchParams, SearchResponse};
use crate::{
    error::{AppError, ValidationError},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/lookup/search", get(search))
        .route("/lookup/barcode", get(barcode))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let query = params.q.trim();
    if query.is_empty() {
        return Json(SearchResponse {
            results: Vec::new(),
            error: None,
        });
    }
    match state.lookup.search(query).await {
        Ok(results) => Json(SearchResponse {
            results,
            error: None,
        }),
        Err(e) => {
            warn!(error = %e, "food search degraded to empty result");
            Json(SearchResponse {
                results: Vec::new(),
                error: Some(e.code()),
            })
        }
    }
}

#[instrument(skip(state))]
pub async fn barcode(
    State(state): State<AppState>,
    Query(params): Query<BarcodeParams>,
) -> Result<Json<BarcodeResponse>, AppError> {
    let code = params.barcode.trim();
    if code.is_empty() {
        return Err(ValidationError::MissingBarcode.into());
    }
    let result = state.lookup.by_barcode(code).await?;
    Ok(Json(BarcodeResponse { result }))
}
