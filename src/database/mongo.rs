use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use super::{Page, PostStore, StoreError, UserStore};
use crate::models::post::{NewPost, Post, PostChanges};
use crate::models::user::{NewUser, User};

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn ownership_filter(id: &ObjectId, owner: Option<&str>) -> Document {
    let mut filter = doc! { "_id": *id };
    if let Some(owner) = owner {
        filter.insert("creator", owner);
    }
    filter
}

#[derive(Clone)]
pub struct MongoPostStore {
    db: Database,
    posts: Collection<Post>,
}

impl MongoPostStore {
    pub fn new(db: Database) -> Self {
        let posts = db.collection("posts");
        MongoPostStore { db, posts }
    }

    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "createdAt": 1, "_id": 1 })
            .build();
        self.posts.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = Post::new(post);
        self.posts.insert_one(&post).await?;
        Ok(post)
    }

    async fn list(&self, page: Option<Page>) -> Result<Vec<Post>, StoreError> {
        let mut query = self
            .posts
            .find(doc! {})
            .sort(doc! { "createdAt": 1, "_id": 1 });

        if let Some(page) = page {
            let limit = i64::try_from(page.size).unwrap_or(i64::MAX);
            query = query.skip(page.skip()).limit(limit);
        }

        let cursor = query.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.posts.count_documents(doc! {}).await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.find_one(doc! { "_id": *id }).await?)
    }

    async fn update(
        &self,
        id: &ObjectId,
        owner: Option<&str>,
        changes: PostChanges,
    ) -> Result<u64, StoreError> {
        let mut set = doc! {
            "title": changes.title,
            "content": changes.content,
        };
        if let Some(image_path) = changes.image_path {
            set.insert("imagePath", image_path);
        }

        let result = self
            .posts
            .update_one(ownership_filter(id, owner), doc! { "$set": set })
            .await?;

        tracing::debug!(
            matched = result.matched_count,
            modified = result.modified_count,
            "post update"
        );
        Ok(result.matched_count)
    }

    async fn delete(&self, id: &ObjectId, owner: Option<&str>) -> Result<u64, StoreError> {
        let result = self.posts.delete_one(ownership_filter(id, owner)).await?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        MongoUserStore {
            users: db.collection("users"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: ObjectId::new(),
            email: user.email,
            password: user.password_hash,
        };

        match self.users.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateKey),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }
}
