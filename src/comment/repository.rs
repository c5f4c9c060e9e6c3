use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::comment::model::Comment;
use crate::database::DATABASE_NAME;
use crate::utils::error::CustomError;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<(), CustomError>;
    async fn find(&self, id: ObjectId) -> Result<Option<Comment>, CustomError>;
    async fn update_body(&self, id: ObjectId, body: &str) -> Result<bool, CustomError>;
    async fn delete(&self, id: ObjectId) -> Result<bool, CustomError>;
    async fn top_level_for_post(&self, post_id: ObjectId) -> Result<Vec<Comment>, CustomError>;
    async fn children_of(&self, parent_id: ObjectId) -> Result<Vec<Comment>, CustomError>;
    async fn count_for_post(&self, post_id: ObjectId) -> Result<u64, CustomError>;
}

pub struct MongoCommentRepository {
    collection: Collection<Comment>,
}

impl MongoCommentRepository {
    pub fn new(client: &Client) -> Self {
        let collection = client
            .database(DATABASE_NAME)
            .collection::<Comment>("comments");
        MongoCommentRepository { collection }
    }

    async fn collect(
        &self,
        filter: mongodb::bson::Document,
    ) -> Result<Vec<Comment>, CustomError> {
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to fetch comments: {}", e))
            })?;

        cursor.try_collect().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to collect comments: {}", e))
        })
    }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<(), CustomError> {
        self.collection.insert_one(comment).await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to add comment: {}", e))
        })?;
        Ok(())
    }

    async fn find(&self, id: ObjectId) -> Result<Option<Comment>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to fetch comment: {}", e))
            })
    }

    async fn update_body(&self, id: ObjectId, body: &str) -> Result<bool, CustomError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "body": body, "updated_at": Utc::now().to_rfc3339() } },
            )
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to update comment: {}", e))
            })?;

        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, CustomError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to delete comment: {}", e))
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn top_level_for_post(&self, post_id: ObjectId) -> Result<Vec<Comment>, CustomError> {
        self.collect(doc! { "post_id": post_id, "parent_id": Bson::Null })
            .await
    }

    async fn children_of(&self, parent_id: ObjectId) -> Result<Vec<Comment>, CustomError> {
        self.collect(doc! { "parent_id": parent_id }).await
    }

    async fn count_for_post(&self, post_id: ObjectId) -> Result<u64, CustomError> {
        self.collection
            .count_documents(doc! { "post_id": post_id })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to count comments: {}", e))
            })
    }
}
