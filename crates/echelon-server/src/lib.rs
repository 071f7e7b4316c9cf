//! HTTP front-end for Image Echelon.
//!
//! Serves pairs of images to compare, records decisions, exposes the ranking
//! as JSON and CSV, and pushes recorded outcomes to WebSocket clients.

pub mod api;
pub mod commands;
pub mod error;
pub mod middleware;
pub mod ws;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use echelon_core::{DbPool, DisplayConfig, Echelon, EchelonConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ranking core over the store.
    pub echelon: Echelon,
    /// Random source for pair selection.
    pub rng: Arc<Mutex<StdRng>>,
    /// Loaded configuration.
    pub config: Arc<EchelonConfig>,
    /// WebSocket broadcast channel for recorded outcomes.
    pub ws_broadcast: ws::WsBroadcast,
}

impl AppState {
    /// State with an entropy-seeded random source.
    pub fn new(db: DbPool, config: EchelonConfig) -> Self {
        Self::with_rng(db, config, StdRng::from_entropy())
    }

    /// State with a caller-provided random source.
    pub fn with_rng(db: DbPool, config: EchelonConfig, rng: StdRng) -> Self {
        Self {
            echelon: Echelon::new(db, &config.rating),
            rng: Arc::new(Mutex::new(rng)),
            config: Arc::new(config),
            ws_broadcast: ws::create_broadcast(),
        }
    }
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Serves each configured reference image at its route.
fn reference_routes(display: &DisplayConfig) -> Router {
    let images = [&display.image_1, &display.image_2];
    images
        .into_iter()
        .zip(api::settings::REFERENCE_ROUTES)
        .fold(Router::new(), |router, (image, route)| {
            match &image.default_image {
                Some(path) => router.route_service(route, ServeFile::new(path)),
                None => router,
            }
        })
}

/// Builds the full application router.
///
/// Images are served from `image_dir` under `/images`; anything not matched
/// falls through to the front-end assets in `static_dir`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ws_router = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state.ws_broadcast.clone());

    let references = reference_routes(&state.config.display);
    let images = ServeDir::new(&state.config.image_dir);
    let assets =
        ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/health", get(health))
        .route("/api/pair", get(api::pair::get_pair))
        .route("/api/outcome", post(api::outcome::record_outcome))
        .route("/update/:decision", get(api::outcome::legacy_update))
        .route("/api/items", get(api::items::list_items))
        .route("/report", get(api::reports::ranking_csv))
        .route("/detail", get(api::reports::detail_csv))
        .route("/api/settings", get(api::settings::get_settings))
        .with_state(state)
        .merge(ws_router)
        .merge(references)
        .nest_service("/images", images)
        .layer(from_fn(middleware::timing_layer))
        .layer(cors)
        .fallback_service(assets)
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_router_round_trip() {
        let state = test_support::state_with(&["a.png", "b.jpg"]);
        let app = build_router(state.clone());

        let (status, body) = send(app.clone(), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        let (status, body) = send(app.clone(), get_req("/api/pair")).await;
        assert_eq!(status, StatusCode::OK);
        let pair: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(pair["pair"].as_array().unwrap().len(), 2);

        let request = Request::builder()
            .method("POST")
            .uri("/api/outcome")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"winner":{"name":"a.png"},"loser":{"name":"b.jpg"}}"#,
            ))
            .unwrap();
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app.clone(), get_req("/report")).await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(body).unwrap();
        assert!(csv.starts_with("image,rating,matches,wins,losses\n"));
        assert!(csv.contains("a.png,1216,1,1,0"));
    }

    #[tokio::test]
    async fn test_router_legacy_update() {
        let state = test_support::state_with(&["a.png", "b.jpg"]);
        let app = build_router(state.clone());

        let (status, _) = send(app, get_req("/update/winner=b.jpg;loser=a.png")).await;
        assert_eq!(status, StatusCode::OK);
        let b = state.echelon.items().get_by_name("b.jpg").unwrap();
        assert_eq!(b.wins, 1);
    }

    #[tokio::test]
    async fn test_router_pair_conflict_with_one_item() {
        let state = test_support::state_with(&["a.png"]);
        let (status, _) = send(build_router(state), get_req("/api/pair")).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_router_serves_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png bytes").unwrap();

        let mut state = test_support::state_with(&[]);
        let mut config = (*state.config).clone();
        config.image_dir = dir.path().to_path_buf();
        state.config = Arc::new(config);

        let (status, body) = send(build_router(state), get_req("/images/a.png")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"png bytes");
    }

    #[tokio::test]
    async fn test_router_serves_encoded_image_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cell #1.png"), b"cell").unwrap();

        let mut state = test_support::state_with(&[]);
        let mut config = (*state.config).clone();
        config.image_dir = dir.path().to_path_buf();
        state.config = Arc::new(config);

        let url = api::pair::image_url("cell #1.png");
        let (status, body) = send(build_router(state), get_req(&url)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"cell");
    }

    #[tokio::test]
    async fn test_router_serves_reference_images() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("1.png");
        std::fs::write(&reference, b"wild type").unwrap();

        let mut state = test_support::state_with(&[]);
        let mut config = (*state.config).clone();
        config.display.image_1.default_image = Some(reference);
        config.display.image_2.default_image = Some(dir.path().join("missing.png"));
        config.static_dir = dir.path().join("static");
        state.config = Arc::new(config);
        let app = build_router(state);

        let (status, body) = send(app.clone(), get_req("/defaultimage1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"wild type");

        let (status, _) = send(app.clone(), get_req("/defaultimage2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(app, get_req("/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        let settings: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(settings["references"][0]["url"], "/defaultimage1");
    }

    #[tokio::test]
    async fn test_router_without_reference_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_support::state_with(&[]);
        let mut config = (*state.config).clone();
        config.static_dir = dir.path().to_path_buf();
        state.config = Arc::new(config);

        let (status, _) = send(build_router(state), get_req("/defaultimage1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
