use std::sync::Arc;

use chrono::Utc;
use log::error;
use mongodb::bson::oid::ObjectId;

use crate::post::post_model::{Post, PostAttachment};
use crate::post::post_repository::{PostRepository, PostTx};
use crate::storage::StorageBackend;
use crate::utils::error::CustomError;
use crate::utils::helpers::random_token;
use crate::utils::multipart::UploadedFile;

const ATTACHMENT_TOKEN_LENGTH: usize = 32;

/// Orchestrates post create/update: entity rows and stored files move
/// together, and every failure path removes the files this call stored
/// before the transaction is rolled back. Failures propagate as typed
/// errors; the caller never sees a silent no-op.
pub struct PostService {
    repository: Arc<dyn PostRepository>,
    storage: Arc<dyn StorageBackend>,
}

impl PostService {
    pub fn new(repository: Arc<dyn PostRepository>, storage: Arc<dyn StorageBackend>) -> Self {
        PostService {
            repository,
            storage,
        }
    }

    pub async fn create_post(
        &self,
        owner_id: ObjectId,
        body: Option<String>,
        group_id: Option<ObjectId>,
        files: Vec<UploadedFile>,
    ) -> Result<(Post, Vec<PostAttachment>), CustomError> {
        let now = Utc::now();
        let post = Post {
            id: ObjectId::new(),
            body,
            user_id: owner_id,
            group_id,
            deleted_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.repository.begin().await?;
        let mut stored_paths: Vec<String> = Vec::new();

        let result = self
            .write_new_post(tx.as_mut(), &post, owner_id, files, &mut stored_paths)
            .await;

        match result {
            Ok(attachments) => match tx.commit().await {
                Ok(()) => Ok((post, attachments)),
                Err(err) => {
                    self.discard_stored_files(&stored_paths).await;
                    Err(err)
                }
            },
            Err(err) => {
                self.discard_stored_files(&stored_paths).await;
                if let Err(abort_err) = tx.abort().await {
                    error!("Failed to abort post transaction: {}", abort_err);
                }
                Err(err)
            }
        }
    }

    /// Replace the body, drop the named attachment rows and store new files.
    ///
    /// `files` must be present even when empty; rollback cleanup covers only
    /// the files stored by this call. Rows deleted here do not purge their
    /// stored files; orphan reconciliation is an external policy.
    pub async fn update_post(
        &self,
        post_id: ObjectId,
        caller_id: ObjectId,
        body: Option<String>,
        deleted_file_ids: Vec<ObjectId>,
        files: Option<Vec<UploadedFile>>,
    ) -> Result<Vec<PostAttachment>, CustomError> {
        let files = files.ok_or_else(|| {
            CustomError::ValidationError("The attachments field is required".to_string())
        })?;

        let post = self
            .repository
            .find_post(post_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

        let mut tx = self.repository.begin().await?;
        let mut stored_paths: Vec<String> = Vec::new();

        let result = self
            .write_post_update(
                tx.as_mut(),
                &post,
                caller_id,
                body,
                &deleted_file_ids,
                files,
                &mut stored_paths,
            )
            .await;

        match result {
            Ok(attachments) => match tx.commit().await {
                Ok(()) => Ok(attachments),
                Err(err) => {
                    self.discard_stored_files(&stored_paths).await;
                    Err(err)
                }
            },
            Err(err) => {
                self.discard_stored_files(&stored_paths).await;
                if let Err(abort_err) = tx.abort().await {
                    error!("Failed to abort post transaction: {}", abort_err);
                }
                Err(err)
            }
        }
    }

    /// Soft-delete, owner only; comments and attachments are left behind
    pub async fn destroy_post(
        &self,
        post_id: ObjectId,
        caller_id: ObjectId,
    ) -> Result<(), CustomError> {
        let post = self
            .repository
            .find_post(post_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

        if post.user_id != caller_id {
            return Err(CustomError::PermissionError(
                "You don't have permission to delete this post".to_string(),
            ));
        }

        let deleted = self.repository.soft_delete_post(post_id, caller_id).await?;
        if !deleted {
            return Err(CustomError::NotFoundError("Post not found".to_string()));
        }

        Ok(())
    }

    pub async fn find_post(&self, id: ObjectId) -> Result<Option<Post>, CustomError> {
        self.repository.find_post(id).await
    }

    pub async fn find_attachment(
        &self,
        id: ObjectId,
    ) -> Result<Option<PostAttachment>, CustomError> {
        self.repository.find_attachment(id).await
    }

    async fn write_new_post(
        &self,
        tx: &mut dyn PostTx,
        post: &Post,
        created_by: ObjectId,
        files: Vec<UploadedFile>,
        stored_paths: &mut Vec<String>,
    ) -> Result<Vec<PostAttachment>, CustomError> {
        tx.insert_post(post).await?;
        self.store_attachments(tx, post.id, created_by, files, stored_paths)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_post_update(
        &self,
        tx: &mut dyn PostTx,
        post: &Post,
        caller_id: ObjectId,
        body: Option<String>,
        deleted_file_ids: &[ObjectId],
        files: Vec<UploadedFile>,
        stored_paths: &mut Vec<String>,
    ) -> Result<Vec<PostAttachment>, CustomError> {
        tx.update_post_body(post.id, body).await?;

        if !deleted_file_ids.is_empty() {
            tx.delete_attachments(post.id, deleted_file_ids).await?;
        }

        self.store_attachments(tx, post.id, caller_id, files, stored_paths)
            .await
    }

    async fn store_attachments(
        &self,
        tx: &mut dyn PostTx,
        post_id: ObjectId,
        created_by: ObjectId,
        files: Vec<UploadedFile>,
        stored_paths: &mut Vec<String>,
    ) -> Result<Vec<PostAttachment>, CustomError> {
        let namespace = format!("attachments/{}", post_id.to_hex());
        let mut attachments = Vec::new();

        for file in files {
            let filename = format!("{}.jpg", random_token(ATTACHMENT_TOKEN_LENGTH));
            let path = self.storage.store(&namespace, &filename, &file.data).await?;
            stored_paths.push(path.clone());

            let size = file.size() as i64;
            let attachment = PostAttachment {
                id: ObjectId::new(),
                post_id,
                name: file.name,
                path,
                mime: file.mime,
                size,
                created_by,
                created_at: Utc::now(),
            };
            tx.insert_attachment(&attachment).await?;
            attachments.push(attachment);
        }

        Ok(attachments)
    }

    async fn discard_stored_files(&self, paths: &[String]) {
        if paths.is_empty() {
            return;
        }
        if let Err(err) = self.storage.delete(paths).await {
            error!(
                "Failed to remove {} stored files during rollback: {}",
                paths.len(),
                err
            );
        }
    }
}
