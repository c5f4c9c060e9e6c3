use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, doc, oid::ObjectId};
use mongodb::{Client, ClientSession, Collection};

use crate::database::DATABASE_NAME;
use crate::post::post_model::{Post, PostAttachment};
use crate::utils::error::CustomError;

/// Row writes applied atomically within one post workflow invocation.
///
/// Dropping the handle without calling `commit` discards the pending writes.
#[async_trait]
pub trait PostTx: Send {
    async fn insert_post(&mut self, post: &Post) -> Result<(), CustomError>;
    async fn update_post_body(
        &mut self,
        post_id: ObjectId,
        body: Option<String>,
    ) -> Result<(), CustomError>;
    async fn insert_attachment(&mut self, attachment: &PostAttachment) -> Result<(), CustomError>;
    async fn delete_attachments(
        &mut self,
        post_id: ObjectId,
        ids: &[ObjectId],
    ) -> Result<(), CustomError>;
    async fn commit(self: Box<Self>) -> Result<(), CustomError>;
    async fn abort(self: Box<Self>) -> Result<(), CustomError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn PostTx>, CustomError>;
    async fn find_post(&self, id: ObjectId) -> Result<Option<Post>, CustomError>;
    async fn find_attachment(&self, id: ObjectId) -> Result<Option<PostAttachment>, CustomError>;
    async fn attachments_for_post(
        &self,
        post_id: ObjectId,
    ) -> Result<Vec<PostAttachment>, CustomError>;
    async fn soft_delete_post(
        &self,
        id: ObjectId,
        deleted_by: ObjectId,
    ) -> Result<bool, CustomError>;
}

pub struct MongoPostRepository {
    client: Client,
    posts: Collection<Post>,
    attachments: Collection<PostAttachment>,
}

impl MongoPostRepository {
    pub fn new(client: &Client) -> Self {
        let db = client.database(DATABASE_NAME);
        MongoPostRepository {
            client: client.clone(),
            posts: db.collection::<Post>("posts"),
            attachments: db.collection::<PostAttachment>("post_attachments"),
        }
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn begin(&self) -> Result<Box<dyn PostTx>, CustomError> {
        let mut session = self.client.start_session().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to start session: {}", e))
        })?;
        session.start_transaction().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to start transaction: {}", e))
        })?;

        Ok(Box::new(MongoPostTx {
            session,
            posts: self.posts.clone(),
            attachments: self.attachments.clone(),
        }))
    }

    async fn find_post(&self, id: ObjectId) -> Result<Option<Post>, CustomError> {
        // Soft-deleted posts are invisible to the whole read surface
        self.posts
            .find_one(doc! { "_id": id, "deleted_at": Bson::Null })
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch post: {}", e)))
    }

    async fn find_attachment(&self, id: ObjectId) -> Result<Option<PostAttachment>, CustomError> {
        self.attachments
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to fetch attachment: {}", e))
            })
    }

    async fn attachments_for_post(
        &self,
        post_id: ObjectId,
    ) -> Result<Vec<PostAttachment>, CustomError> {
        let cursor = self
            .attachments
            .find(doc! { "post_id": post_id })
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to fetch attachments: {}", e))
            })?;

        cursor.try_collect().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to collect attachments: {}", e))
        })
    }

    async fn soft_delete_post(
        &self,
        id: ObjectId,
        deleted_by: ObjectId,
    ) -> Result<bool, CustomError> {
        let result = self
            .posts
            .update_one(
                doc! { "_id": id, "deleted_at": Bson::Null },
                doc! {
                    "$set": {
                        "deleted_at": Utc::now().to_rfc3339(),
                        "deleted_by": deleted_by,
                        "updated_at": Utc::now().to_rfc3339()
                    }
                },
            )
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to delete post: {}", e))
            })?;

        Ok(result.modified_count > 0)
    }
}

struct MongoPostTx {
    session: ClientSession,
    posts: Collection<Post>,
    attachments: Collection<PostAttachment>,
}

#[async_trait]
impl PostTx for MongoPostTx {
    async fn insert_post(&mut self, post: &Post) -> Result<(), CustomError> {
        self.posts
            .insert_one(post)
            .session(&mut self.session)
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to create post: {}", e))
            })?;
        Ok(())
    }

    async fn update_post_body(
        &mut self,
        post_id: ObjectId,
        body: Option<String>,
    ) -> Result<(), CustomError> {
        let body = body.map(Bson::String).unwrap_or(Bson::Null);

        self.posts
            .update_one(
                doc! { "_id": post_id },
                doc! { "$set": { "body": body, "updated_at": Utc::now().to_rfc3339() } },
            )
            .session(&mut self.session)
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to update post: {}", e))
            })?;
        Ok(())
    }

    async fn insert_attachment(&mut self, attachment: &PostAttachment) -> Result<(), CustomError> {
        self.attachments
            .insert_one(attachment)
            .session(&mut self.session)
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to record attachment: {}", e))
            })?;
        Ok(())
    }

    async fn delete_attachments(
        &mut self,
        post_id: ObjectId,
        ids: &[ObjectId],
    ) -> Result<(), CustomError> {
        // Scoped to the post so ids belonging to another post are ignored
        self.attachments
            .delete_many(doc! { "post_id": post_id, "_id": { "$in": ids.to_vec() } })
            .session(&mut self.session)
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to delete attachments: {}", e))
            })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), CustomError> {
        let MongoPostTx { mut session, .. } = *self;
        session.commit_transaction().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to commit transaction: {}", e))
        })
    }

    async fn abort(self: Box<Self>) -> Result<(), CustomError> {
        let MongoPostTx { mut session, .. } = *self;
        session.abort_transaction().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to abort transaction: {}", e))
        })
    }
}
