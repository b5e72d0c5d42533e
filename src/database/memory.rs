//! In-memory stores, used by the test suite and by `STORAGE_BACKEND=memory`.
//! Data is lost on process restart.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{Page, PostStore, StoreError, UserStore};
use crate::models::post::{NewPost, Post, PostChanges};
use crate::models::user::{NewUser, User};

/// Posts kept in insertion order, which matches the `createdAt, _id` sort.
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
    available: AtomicBool,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    fn matches(post: &Post, id: &ObjectId, owner: Option<&str>) -> bool {
        post.id == *id && owner.map_or(true, |owner| post.is_owned_by(owner))
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        self.check_available()?;
        let post = Post::new(post);
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn list(&self, page: Option<Page>) -> Result<Vec<Post>, StoreError> {
        self.check_available()?;
        let posts = self.posts.read().await;
        let selected = match page {
            Some(page) => {
                let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
                let take = usize::try_from(page.size).unwrap_or(usize::MAX);
                posts.iter().skip(skip).take(take).cloned().collect()
            }
            None => posts.clone(),
        };
        Ok(selected)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.posts.read().await.len() as u64)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        self.check_available()?;
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == *id).cloned())
    }

    async fn update(
        &self,
        id: &ObjectId,
        owner: Option<&str>,
        changes: PostChanges,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|p| Self::matches(p, id, owner)) else {
            return Ok(0);
        };

        post.title = changes.title;
        post.content = changes.content;
        if let Some(image_path) = changes.image_path {
            post.image_path = Some(image_path);
        }
        Ok(1)
    }

    async fn delete(&self, id: &ObjectId, owner: Option<&str>) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut posts = self.posts.write().await;
        match posts.iter().position(|p| Self::matches(p, id, owner)) {
            Some(index) => {
                posts.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey);
        }

        let user = User {
            id: ObjectId::new(),
            email: user.email,
            password: user.password_hash,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }
}
