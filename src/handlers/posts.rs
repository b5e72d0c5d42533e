use axum::{
    extract::{Host, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use axum_extra::extract::WithRejection;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};
use validator::Validate;

use crate::dtos::post_dtos::{ListQuery, PostForm};
use crate::errors::{AppError, Result};
use crate::models::post::{NewPost, PostChanges, PostResponse};
use crate::models::user::Claims;
use crate::state::AppState;

/// `<scheme>://<host>` the client used to reach us, unless `PUBLIC_URL` is set.
/// `host` comes from `Forwarded`, `X-Forwarded-Host`, `Host` or the URI authority.
fn request_base_url(state: &AppState, headers: &HeaderMap, host: Option<&str>) -> String {
    if let Some(url) = &state.config.public_url {
        return url.clone();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = host
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.bind_address());

    format!("{}://{}", scheme, host)
}

fn image_url(base_url: &str, file_name: &str) -> String {
    format!("{}/images/{}", base_url, file_name)
}

/// Writes the uploaded image, if any, returning its file name and public URL.
async fn store_upload(
    state: &AppState,
    headers: &HeaderMap,
    host: Option<&str>,
    form: &PostForm,
) -> Result<Option<(String, String)>> {
    let Some(upload) = &form.image else {
        return Ok(None);
    };
    let file_name = state.images.save(upload).await?;
    let url = image_url(&request_base_url(state, headers, host), &file_name);
    Ok(Some((file_name, url)))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    host: Option<Host>,
    headers: HeaderMap,
    form: PostForm,
) -> Result<(StatusCode, Json<Value>)> {
    form.validate()?;

    let host = host.map(|Host(h)| h);
    let stored = store_upload(&state, &headers, host.as_deref(), &form).await?;

    let new_post = NewPost {
        title: form.title,
        content: form.content,
        image_path: stored.as_ref().map(|(_, url)| url.clone()),
        creator: Some(claims.user_id),
    };

    let post = match state.posts.insert(new_post).await {
        Ok(post) => post,
        Err(e) => {
            if let Some((file_name, _)) = &stored {
                state.images.remove(file_name).await;
            }
            return Err(AppError::database("Creating a post failed")(e));
        }
    };

    tracing::info!("Created post {}", post.id.to_hex());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post added correctly",
            "post": {
                "id": post.id.to_hex(),
                "title": post.title,
                "content": post.content,
                "imagePath": post.image_path,
                "creator": post.creator,
            }
        })),
    ))
}

pub async fn get_posts(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
) -> Result<Json<Value>> {
    let posts = state
        .posts
        .list(query.page())
        .await
        .map_err(AppError::database("Fetching posts failed"))?;
    let count = state
        .posts
        .count()
        .await
        .map_err(AppError::database("Fetching posts failed"))?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();

    Ok(Json(json!({
        "message": "Posts fetched successfully",
        "posts": posts,
        "maxPosts": count,
    })))
}

pub async fn get_post_by_id(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostResponse>> {
    let object_id = ObjectId::parse_str(&post_id).map_err(|_| AppError::PostNotFound)?;

    let post = state
        .posts
        .find_by_id(&object_id)
        .await
        .map_err(AppError::database("Fetching post failed"))?;

    match post {
        Some(post) => Ok(Json(PostResponse::from(post))),
        None => Err(AppError::PostNotFound),
    }
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<String>,
    host: Option<Host>,
    headers: HeaderMap,
    form: PostForm,
) -> Result<Json<Value>> {
    form.validate()?;

    // Malformed ids cannot match, same answer as a post owned by someone else.
    let object_id = ObjectId::parse_str(&post_id).map_err(|_| AppError::NotAuthorised)?;

    let host = host.map(|Host(h)| h);
    let stored = store_upload(&state, &headers, host.as_deref(), &form).await?;
    let changes = PostChanges {
        title: form.title,
        content: form.content,
        image_path: stored
            .as_ref()
            .map(|(_, url)| url.clone())
            .or(form.image_path),
    };

    let result = state
        .posts
        .update(&object_id, Some(&claims.user_id), changes)
        .await;

    let outcome = match result {
        Ok(0) => Err(AppError::NotAuthorised),
        Ok(_) => Ok(()),
        Err(e) => Err(AppError::database("Editing a post failed")(e)),
    };

    if let Err(e) = outcome {
        if let Some((file_name, _)) = &stored {
            state.images.remove(file_name).await;
        }
        return Err(e);
    }

    tracing::info!("Updated post {}", post_id);
    Ok(Json(json!({ "message": "Update successful!" })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let object_id = ObjectId::parse_str(&post_id).map_err(|_| AppError::NotAuthorised)?;

    let deleted = state
        .posts
        .delete(&object_id, Some(&claims.user_id))
        .await
        .map_err(AppError::database("Deleting a post failed"))?;

    if deleted == 0 {
        return Err(AppError::NotAuthorised);
    }

    tracing::info!("Deleted post {}", post_id);
    Ok(Json(json!({ "message": "Deletion successful!" })))
}
