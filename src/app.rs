use axum::{
    extract::{DefaultBodyLimit, State},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderName, Method,
    },
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes;
use crate::state::AppState;

// Room for the text fields next to a maximum-size image.
const FORM_FIELDS_ALLOWANCE: usize = 64 * 1024;

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
        ])
}

/// Builds the full application router. `main` hands it to `axum::serve`;
/// integration tests serve it on an ephemeral port.
pub fn build_router(app_state: AppState) -> Router {
    let posts = if app_state.config.legacy_routes {
        tracing::warn!("Serving legacy post routes without authentication");
        routes::posts::legacy_routes()
    } else {
        routes::posts::routes(&app_state)
    };
    let body_limit = app_state.config.max_image_bytes + FORM_FIELDS_ALLOWANCE;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/posts", posts)
        .nest("/api/user", routes::user::routes())
        .nest("/images", routes::posts::image_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.posts.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Health check ping failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
