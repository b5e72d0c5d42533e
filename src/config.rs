// config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{AppError, Result};

const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024; // 10MB

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::configuration(format!(
                "STORAGE_BACKEND must be 'mongo' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_expires_in: u64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
    pub images_dir: PathBuf,
    pub max_image_bytes: usize,
    /// Overrides the scheme and host used in uploaded image URLs.
    pub public_url: Option<String>,
    pub legacy_routes: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "mongo".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Mongo && database_url.is_none() {
            return Err(AppError::configuration("DATABASE_URL must be set"));
        }

        Ok(AppConfig {
            storage_backend,
            database_url,
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "node-angular".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::configuration("JWT_SECRET must be set"))?,
            jwt_expires_in: parse_var("JWT_EXPIRES_IN", 3600)?,
            bcrypt_cost: parse_var("BCRYPT_COST", 10)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 3000)?,
            images_dir: env::var("IMAGES_DIR")
                .unwrap_or_else(|_| "images".to_string())
                .into(),
            max_image_bytes: parse_var("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            public_url: env::var("PUBLIC_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            legacy_routes: parse_flag(env::var("LEGACY_ROUTES").ok().as_deref())?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::configuration(format!("{} has an invalid value '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: Option<&str>) -> Result<bool> {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            _ => Err(AppError::configuration(format!(
                "expected a boolean flag, got '{}'",
                v
            ))),
        },
    }
}
