use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection};

use crate::database::DATABASE_NAME;
use crate::reaction::model::{Reaction, TargetKind};
use crate::utils::error::CustomError;

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Any reaction by this user on this target, regardless of its type
    async fn find_for_user(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
        target_kind: TargetKind,
    ) -> Result<Option<Reaction>, CustomError>;

    /// Insert a reaction row; a second row for the same (user, target) is
    /// refused with `ConflictError`
    async fn insert(&self, reaction: &Reaction) -> Result<(), CustomError>;

    async fn delete(&self, id: ObjectId) -> Result<bool, CustomError>;

    async fn count_for_target(
        &self,
        target_id: ObjectId,
        target_kind: TargetKind,
    ) -> Result<u64, CustomError>;
}

pub struct MongoReactionRepository {
    collection: Collection<Reaction>,
}

impl MongoReactionRepository {
    pub fn new(client: &Client) -> Self {
        let collection = client
            .database(DATABASE_NAME)
            .collection::<Reaction>("reactions");
        MongoReactionRepository { collection }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl ReactionRepository for MongoReactionRepository {
    async fn find_for_user(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
        target_kind: TargetKind,
    ) -> Result<Option<Reaction>, CustomError> {
        self.collection
            .find_one(doc! {
                "user_id": user_id,
                "target_id": target_id,
                "target_kind": target_kind.as_str(),
            })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to fetch reaction: {}", e))
            })
    }

    async fn insert(&self, reaction: &Reaction) -> Result<(), CustomError> {
        self.collection.insert_one(reaction).await.map_err(|e| {
            if is_duplicate_key(&e) {
                CustomError::ConflictError("Reaction already recorded".to_string())
            } else {
                CustomError::InternalServerError(format!("Failed to record reaction: {}", e))
            }
        })?;
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, CustomError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to delete reaction: {}", e))
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn count_for_target(
        &self,
        target_id: ObjectId,
        target_kind: TargetKind,
    ) -> Result<u64, CustomError> {
        self.collection
            .count_documents(doc! {
                "target_id": target_id,
                "target_kind": target_kind.as_str(),
            })
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to count reactions: {}", e))
            })
    }
}
