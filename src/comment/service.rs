use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::comment::model::Comment;
use crate::comment::repository::CommentRepository;
use crate::utils::error::CustomError;
use crate::utils::helpers::nl2br;

pub struct CommentService {
    repository: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(repository: Arc<dyn CommentRepository>) -> Self {
        CommentService { repository }
    }

    /// Add a comment to a post, optionally as a reply to another comment.
    ///
    /// The parent must belong to the same post and its ancestor chain must
    /// terminate; a repeated id in the chain means the thread is corrupt and
    /// the write is refused.
    pub async fn create_comment(
        &self,
        post_id: ObjectId,
        user_id: ObjectId,
        body: &str,
        parent_id: Option<ObjectId>,
    ) -> Result<Comment, CustomError> {
        if body.trim().is_empty() {
            return Err(CustomError::BadRequestError(
                "Comment body cannot be empty".to_string(),
            ));
        }

        if let Some(parent_id) = parent_id {
            let parent = self
                .repository
                .find(parent_id)
                .await?
                .ok_or_else(|| {
                    CustomError::ValidationError("Parent comment does not exist".to_string())
                })?;

            if parent.post_id != post_id {
                return Err(CustomError::ValidationError(
                    "Parent comment belongs to a different post".to_string(),
                ));
            }

            self.ensure_chain_terminates(&parent).await?;
        }

        let now = Utc::now();
        let comment = Comment {
            id: ObjectId::new(),
            post_id,
            user_id,
            body: nl2br(body),
            parent_id,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(&comment).await?;
        Ok(comment)
    }

    /// Replace the body of an own comment
    pub async fn update_comment(
        &self,
        comment_id: ObjectId,
        caller_id: ObjectId,
        body: &str,
    ) -> Result<Comment, CustomError> {
        if body.trim().is_empty() {
            return Err(CustomError::BadRequestError(
                "Comment body cannot be empty".to_string(),
            ));
        }

        let comment = self
            .repository
            .find(comment_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

        if comment.user_id != caller_id {
            return Err(CustomError::PermissionError(
                "You don't have permission to update this comment".to_string(),
            ));
        }

        self.repository.update_body(comment_id, body).await?;

        Ok(Comment {
            body: body.to_string(),
            updated_at: Utc::now(),
            ..comment
        })
    }

    /// Hard-delete an own comment; replies are left behind
    pub async fn delete_comment(
        &self,
        comment_id: ObjectId,
        caller_id: ObjectId,
    ) -> Result<(), CustomError> {
        let comment = self
            .repository
            .find(comment_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

        if comment.user_id != caller_id {
            return Err(CustomError::PermissionError(
                "You don't have permission to delete this comment".to_string(),
            ));
        }

        self.repository.delete(comment_id).await?;
        Ok(())
    }

    pub async fn find_comment(&self, id: ObjectId) -> Result<Option<Comment>, CustomError> {
        self.repository.find(id).await
    }

    pub async fn comments_for_post(
        &self,
        post_id: ObjectId,
    ) -> Result<Vec<Comment>, CustomError> {
        self.repository.top_level_for_post(post_id).await
    }

    async fn ensure_chain_terminates(&self, start: &Comment) -> Result<(), CustomError> {
        let mut visited = HashSet::from([start.id]);
        let mut cursor = start.parent_id;

        while let Some(parent_id) = cursor {
            if !visited.insert(parent_id) {
                return Err(CustomError::ValidationError(
                    "Comment thread contains a cycle".to_string(),
                ));
            }
            cursor = match self.repository.find(parent_id).await? {
                Some(parent) => parent.parent_id,
                None => None,
            };
        }

        Ok(())
    }
}
