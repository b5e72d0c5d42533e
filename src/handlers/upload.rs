use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::errors::{AppError, Result};
use crate::services::image_store::content_type_for;
use crate::state::AppState;

pub async fn serve_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response> {
    let file_path = state
        .images
        .path_for(&file_name)
        .ok_or(AppError::ImageNotFound)?;

    let file = match tokio::fs::File::open(&file_path).await {
        Ok(file) => file,
        Err(_) => return Err(AppError::ImageNotFound),
    };
    let is_file = file
        .metadata()
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(AppError::ImageNotFound);
    }

    let stream = ReaderStream::new(file);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&file_name).to_string()),
            (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
