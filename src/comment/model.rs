use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A comment on a post; `parent_id` threads replies as an adjacency list
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub post_id: ObjectId,
    pub user_id: ObjectId,
    pub body: String,
    pub parent_id: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub comment: String,
    pub parent_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: String,
}
