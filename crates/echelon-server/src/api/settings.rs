//! Prompt text and reference images for the front-end.

use axum::{extract::State, Json};
use echelon_core::{DisplayConfig, ReferenceImage};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Routes serving the first and second reference image.
pub const REFERENCE_ROUTES: [&str; 2] = ["/defaultimage1", "/defaultimage2"];

/// A reference image as the front-end sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceView {
    pub label: String,
    pub text: String,
    pub width: u32,
    pub height: u32,
    /// Where the image is served, absent when none is configured.
    pub url: Option<String>,
}

impl ReferenceView {
    fn new(image: &ReferenceImage, route: &str) -> Self {
        Self {
            label: image.label.clone(),
            text: image.text.clone(),
            width: image.width,
            height: image.height,
            url: image.default_image.as_ref().map(|_| route.to_string()),
        }
    }
}

/// Response body of `GET /api/settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub head_text: String,
    pub full_description: String,
    pub references: [ReferenceView; 2],
}

impl From<&DisplayConfig> for SettingsResponse {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            head_text: display.head_text.clone(),
            full_description: display.full_description.clone(),
            references: [
                ReferenceView::new(&display.image_1, REFERENCE_ROUTES[0]),
                ReferenceView::new(&display.image_2, REFERENCE_ROUTES[1]),
            ],
        }
    }
}

/// Display settings from the configuration file.
///
/// # Endpoint
///
/// `GET /api/settings`
///
/// Server-side file paths are not exposed; each reference image carries the
/// route it is served from instead.
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse::from(&state.config.display))
}
