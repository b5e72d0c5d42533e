use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,

    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    // Legacy-created posts have no creator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: BsonDateTime,
}

impl Post {
    pub fn new(post: NewPost) -> Self {
        Post {
            id: ObjectId::new(),
            title: post.title,
            content: post.content,
            image_path: post.image_path,
            creator: post.creator,
            created_at: BsonDateTime::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.creator.as_deref() == Some(user_id)
    }
}

/// Fields accepted when inserting a post; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
    pub creator: Option<String>,
}

/// Replacement fields for an update. `image_path: None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "imagePath", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        PostResponse {
            id: post.id.to_hex(),
            title: post.title,
            content: post.content,
            image_path: post.image_path,
            creator: post.creator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_uses_hex_id_and_camel_case_image_path() {
        let post = Post::new(NewPost {
            title: "Title".to_string(),
            content: "Body".to_string(),
            image_path: Some("http://localhost/images/a.png".to_string()),
            creator: Some("user-1".to_string()),
        });
        let hex = post.id.to_hex();

        let value = serde_json::to_value(PostResponse::from(post)).unwrap();
        assert_eq!(value["_id"], hex);
        assert_eq!(value["imagePath"], "http://localhost/images/a.png");
        assert_eq!(value["creator"], "user-1");
    }

    #[test]
    fn ownership_requires_matching_creator() {
        let mut post = Post::new(NewPost {
            title: "t".to_string(),
            content: "c".to_string(),
            image_path: None,
            creator: Some("owner".to_string()),
        });
        assert!(post.is_owned_by("owner"));
        assert!(!post.is_owned_by("someone-else"));

        post.creator = None;
        assert!(!post.is_owned_by("owner"));
    }
}
