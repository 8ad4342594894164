pub mod client;
mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub use client::{FoodLookup, OpenFoodFactsClient};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::read_routes())
}
