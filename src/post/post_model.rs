use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub body: Option<String>,
    pub user_id: ObjectId,
    pub group_id: Option<ObjectId>,
    pub deleted_by: Option<ObjectId>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata row for a stored upload; the bytes live in the storage backend
/// under `path`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PostAttachment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub post_id: ObjectId,
    pub name: String,
    pub path: String,
    pub mime: String,
    pub size: i64,
    pub created_by: ObjectId,
    pub created_at: DateTime<Utc>,
}
