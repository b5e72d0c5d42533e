use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{legacy, posts, upload};
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route("/", get(posts::get_posts))
        .route("/", post(posts::create_post).route_layer(auth.clone()))
        .route("/:post_id", get(posts::get_post_by_id))
        .route("/:post_id", put(posts::update_post).route_layer(auth.clone()))
        .route("/:post_id", delete(posts::delete_post).route_layer(auth))
}

/// Unauthenticated first-generation handlers, see [`legacy`].
pub fn legacy_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(legacy::get_posts))
        .route("/", post(legacy::create_post))
        .route("/:post_id", put(legacy::update_post))
        .route("/:post_id", delete(legacy::delete_post))
}

pub fn image_routes() -> Router<AppState> {
    Router::new().route("/:file_name", get(upload::serve_image))
}
