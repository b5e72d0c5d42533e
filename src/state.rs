use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{InMemoryPostStore, InMemoryUserStore, PostStore, UserStore};
use crate::services::image_store::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostStore>,
    pub users: Arc<dyn UserStore>,
    pub images: Arc<ImageStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        posts: Arc<dyn PostStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let images = Arc::new(ImageStore::new(config.images_dir.clone()));
        AppState {
            posts,
            users,
            images,
            config: Arc::new(config),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryPostStore::new()),
            Arc::new(InMemoryUserStore::new()),
        )
    }
}
