//! Ranking as JSON.

use axum::{extract::State, Json};
use echelon_core::RankingRow;

use crate::error::ApiResult;
use crate::AppState;

/// Current ranking, highest rating first.
///
/// # Endpoint
///
/// `GET /api/items`
pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<Vec<RankingRow>>> {
    Ok(Json(state.echelon.ranking_report()?))
}
