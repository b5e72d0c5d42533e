//! Inline post handlers from the first version of the API: no auth, no
//! pagination, no images, and update/delete match on the id alone. Only
//! mounted when `LEGACY_ROUTES` is enabled.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use crate::dtos::post_dtos::PostForm;
use crate::errors::{AppError, Result};
use crate::models::post::{NewPost, PostChanges, PostResponse};
use crate::state::AppState;

pub async fn create_post(
    State(state): State<AppState>,
    form: PostForm,
) -> Result<(StatusCode, Json<Value>)> {
    let post = state
        .posts
        .insert(NewPost {
            title: form.title,
            content: form.content,
            image_path: None,
            creator: None,
        })
        .await
        .map_err(AppError::database("Creating a post failed"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post added correctly",
            "postId": post.id.to_hex(),
        })),
    ))
}

pub async fn get_posts(State(state): State<AppState>) -> Result<Json<Value>> {
    let posts = state
        .posts
        .list(None)
        .await
        .map_err(AppError::database("Fetching posts failed"))?;
    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();

    Ok(Json(json!({
        "message": "Posts fetched successfully",
        "posts": posts,
    })))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    form: PostForm,
) -> Result<Json<Value>> {
    if let Ok(object_id) = ObjectId::parse_str(&post_id) {
        let matched = state
            .posts
            .update(
                &object_id,
                None,
                PostChanges {
                    title: form.title,
                    content: form.content,
                    image_path: None,
                },
            )
            .await
            .map_err(AppError::database("Editing a post failed"))?;
        tracing::debug!("Legacy update of {} matched {}", post_id, matched);
    }

    Ok(Json(json!({ "message": "Update successful!" })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    if let Ok(object_id) = ObjectId::parse_str(&post_id) {
        state
            .posts
            .delete(&object_id, None)
            .await
            .map_err(AppError::database("Deleting a post failed"))?;
    }

    Ok(Json(json!({ "message": "Post deleted" })))
}
