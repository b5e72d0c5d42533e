use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::post::{NewPost, Post, PostChanges};
use crate::models::user::{NewUser, User};

pub mod connection;
pub mod memory;
pub mod mongo;

pub use memory::{InMemoryPostStore, InMemoryUserStore};
pub use mongo::{MongoPostStore, MongoUserStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Duplicate key")]
    DuplicateKey,

    #[error("Store unavailable")]
    Unavailable,
}

/// A page of the post listing: skip `size * (number - 1)`, take `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub size: u64,
    pub number: u64,
}

impl Page {
    /// Both values must be positive, otherwise there is no page.
    pub fn new(size: u64, number: u64) -> Option<Self> {
        (size > 0 && number > 0).then_some(Page { size, number })
    }

    pub fn skip(&self) -> u64 {
        self.size.saturating_mul(self.number - 1)
    }
}

/// Storage for posts. Listing order is `createdAt` ascending, then `_id`.
///
/// `owner` filters mutate only documents whose `creator` equals it; `None`
/// matches on id alone. Both mutating calls return the number of matched
/// documents.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn list(&self, page: Option<Page>) -> Result<Vec<Post>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StoreError>;

    /// Returns the number of *matched* documents, so re-saving unchanged
    /// values still counts as a success.
    async fn update(
        &self,
        id: &ObjectId,
        owner: Option<&str>,
        changes: PostChanges,
    ) -> Result<u64, StoreError>;

    async fn delete(&self, id: &ObjectId, owner: Option<&str>) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateKey`] when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
