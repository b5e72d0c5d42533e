use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use validator::Validate;

use crate::database::Page;
use crate::errors::{AppError, Result};
use crate::services::image_store::{extension_for, ImageUpload};
use crate::state::AppState;

/// Query string of the post listing. Values arrive as strings so that
/// non-numeric input falls back to the unpaginated listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub pagesize: Option<String>,
    pub page: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> Option<Page> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<u64>().ok());
        Page::new(parse(&self.pagesize)?, parse(&self.page)?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PostPayload {
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "imagePath")]
    image_path: Option<String>,
}

/// Body of create and update requests: multipart with an optional `image`
/// part, or JSON / urlencoded fields without an image.
#[derive(Debug, Default, Validate)]
pub struct PostForm {
    /// Sent by clients on update, never used as a filter.
    pub id: Option<String>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub image_path: Option<String>,
    pub image: Option<ImageUpload>,
}

impl From<PostPayload> for PostForm {
    fn from(payload: PostPayload) -> Self {
        PostForm {
            id: payload.id,
            title: payload.title,
            content: payload.content,
            image_path: payload.image_path.filter(|p| !p.is_empty()),
            image: None,
        }
    }
}

impl PostForm {
    async fn from_multipart(mut multipart: Multipart, max_image_bytes: usize) -> Result<Self> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "id" => form.id = Some(field.text().await?),
                "title" => form.title = field.text().await?,
                "content" => form.content = field.text().await?,
                "imagePath" => {
                    let path = field.text().await?;
                    form.image_path = Some(path).filter(|p| !p.is_empty());
                }
                "image" => {
                    // Checked before the bytes are read so a rejected upload
                    // never reaches the image store.
                    let extension = field
                        .content_type()
                        .and_then(extension_for)
                        .ok_or(AppError::InvalidMimeType)?;
                    let original_name = field.file_name().unwrap_or("image").to_string();
                    let data = field.bytes().await?;

                    if data.len() > max_image_bytes {
                        return Err(AppError::ImageTooLarge);
                    }

                    form.image = Some(ImageUpload {
                        original_name,
                        extension,
                        data,
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

#[async_trait]
impl FromRequest<AppState> for PostForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await?;
            Self::from_multipart(multipart, state.config.max_image_bytes).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(payload) = Form::<PostPayload>::from_request(req, state).await?;
            Ok(payload.into())
        } else {
            let Json(payload) = Json::<PostPayload>::from_request(req, state).await?;
            Ok(payload.into())
        }
    }
}
