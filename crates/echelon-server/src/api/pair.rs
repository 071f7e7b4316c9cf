//! Pair selection handler.

use axum::{extract::State, Json};
use echelon_core::{Item, ItemView};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::AppState;

/// One side of a pair, with the URL the image is served from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairEntry {
    /// Stored item fields.
    #[serde(flatten)]
    pub item: ItemView,
    /// Path under `/images` serving this item, percent-encoded.
    pub url: String,
}

impl From<Item> for PairEntry {
    fn from(item: Item) -> Self {
        let url = image_url(&item.name);
        Self {
            item: item.into(),
            url,
        }
    }
}

/// URL of the image called `name` under the `/images` mount.
pub fn image_url(name: &str) -> String {
    format!("/images/{}", urlencoding::encode(name))
}

/// Response body of `GET /api/pair`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairResponse {
    /// Two distinct items to compare.
    pub pair: [PairEntry; 2],
}

/// Draw two distinct items for the next comparison.
///
/// # Endpoint
///
/// `GET /api/pair`
///
/// # Response
///
/// - `200 OK`: `{ "pair": [a, b] }`
/// - `409 Conflict`: fewer than two items exist
pub async fn get_pair(State(state): State<AppState>) -> ApiResult<Json<PairResponse>> {
    let (a, b) = {
        let mut rng = state.rng.lock().unwrap_or_else(|p| p.into_inner());
        state.echelon.select_pair(&mut *rng)?
    };

    Ok(Json(PairResponse {
        pair: [a.into(), b.into()],
    }))
}
