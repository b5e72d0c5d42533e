use axum::{routing::post, Router};

use crate::handlers::user;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(user::signup))
        .route("/login", post(user::login))
}
