#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use posts_api::config::{AppConfig, StorageBackend};
use posts_api::database::{InMemoryPostStore, InMemoryUserStore};
use posts_api::models::user::Claims;
use posts_api::{build_router, AppState};
use reqwest::multipart::{Form, Part};
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret";

pub struct TestServer {
    pub base_url: String,
    pub posts: Arc<InMemoryPostStore>,
    pub images_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    pub async fn spawn_legacy() -> Self {
        Self::spawn_with(true).await
    }

    async fn spawn_with(legacy_routes: bool) -> Self {
        let images_dir = tempfile::tempdir().expect("failed to create images dir");
        let config = test_config(&images_dir, legacy_routes);

        // Same router as prod, in-memory stores, ephemeral port.
        let posts = Arc::new(InMemoryPostStore::new());
        let state = AppState::new(config, posts.clone(), Arc::new(InMemoryUserStore::new()));
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            posts,
            images_dir,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn stored_images(&self) -> Vec<String> {
        std::fs::read_dir(self.images_dir.path())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn test_config(images_dir: &TempDir, legacy_routes: bool) -> AppConfig {
    AppConfig {
        storage_backend: StorageBackend::Memory,
        database_url: None,
        database_name: "test".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expires_in: 3600,
        bcrypt_cost: 4,
        host: "127.0.0.1".to_string(),
        port: 0,
        images_dir: images_dir.path().to_path_buf(),
        max_image_bytes: 64 * 1024,
        public_url: None,
        legacy_routes,
    }
}

pub fn mint_jwt(user_id: &str) -> String {
    let claims = Claims {
        email: format!("{}@example.com", user_id),
        user_id: user_id.to_string(),
        exp: (Utc::now() + ChronoDuration::minutes(10)).timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

pub fn post_form(title: &str, content: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("content", content.to_string())
}

pub fn image_part(file_name: &str, mime: &str, data: &'static [u8]) -> Part {
    Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime")
}

/// Creates a post through the API and returns its id.
pub async fn create_post(
    client: &reqwest::Client,
    srv: &TestServer,
    token: &str,
    title: &str,
) -> String {
    let res = client
        .post(srv.url("/api/posts"))
        .bearer_auth(token)
        .multipart(post_form(title, &format!("{} content", title)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    body["post"]["id"].as_str().unwrap().to_string()
}
