use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::comment::repository::CommentRepository;
use crate::post::post_model::{Post, PostAttachment};
use crate::post::post_repository::PostRepository;
use crate::presenter::UserSummary;
use crate::reaction::model::TargetKind;
use crate::reaction::repository::ReactionRepository;
use crate::storage::StorageBackend;
use crate::user::repository::UserRepository;
use crate::utils::error::CustomError;
use crate::utils::helpers::diff_for_humans;

#[derive(Debug, Serialize)]
pub struct AttachmentView {
    pub id: String,
    pub name: String,
    pub mime: String,
    pub size: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: String,
    pub body: Option<String>,
    pub group_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
    pub attachments: Vec<AttachmentView>,
    pub reactions_count: u64,
    pub current_user_has_reaction: bool,
    pub comments_count: u64,
}

/// Maps a post into the client view; related rows are fetched on demand
pub struct PostPresenter {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    reactions: Arc<dyn ReactionRepository>,
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn StorageBackend>,
}

impl PostPresenter {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        reactions: Arc<dyn ReactionRepository>,
        users: Arc<dyn UserRepository>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        PostPresenter {
            posts,
            comments,
            reactions,
            users,
            storage,
        }
    }

    pub async fn present(
        &self,
        post: &Post,
        viewer_id: ObjectId,
    ) -> Result<PostView, CustomError> {
        let attachments = self.posts.attachments_for_post(post.id).await?;

        let reactions_count = self
            .reactions
            .count_for_target(post.id, TargetKind::Post)
            .await?;
        let current_user_has_reaction = self
            .reactions
            .find_for_user(viewer_id, post.id, TargetKind::Post)
            .await?
            .is_some();

        let comments_count = self.comments.count_for_post(post.id).await?;

        let user = self
            .users
            .find_user(post.user_id)
            .await?
            .ok_or_else(|| {
                CustomError::NotFoundError("Post author no longer exists".to_string())
            })?;

        Ok(PostView {
            id: post.id.to_hex(),
            body: post.body.clone(),
            group_id: post.group_id.map(|id| id.to_hex()),
            created_at: diff_for_humans(post.created_at),
            updated_at: diff_for_humans(post.updated_at),
            user: UserSummary::from_user(user, self.storage.as_ref()),
            attachments: attachments.into_iter().map(|a| self.attachment_view(a)).collect(),
            reactions_count,
            current_user_has_reaction,
            comments_count,
        })
    }

    fn attachment_view(&self, attachment: PostAttachment) -> AttachmentView {
        AttachmentView {
            id: attachment.id.to_hex(),
            name: attachment.name,
            mime: attachment.mime,
            size: attachment.size,
            url: self.storage.resolve_url(&attachment.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::service::tests::MemoryCommentRepository;
    use crate::post::post_service::tests::MemoryPostRepository;
    use crate::reaction::model::{Reaction, ReactionType};
    use crate::reaction::service::tests::MemoryReactionRepository;
    use crate::storage::disk::DiskStorage;
    use crate::user::model::User;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default, Clone)]
    struct MemoryUserRepository {
        rows: Arc<Mutex<Vec<User>>>,
    }

    #[async_trait]
    impl UserRepository for MemoryUserRepository {
        async fn find_user(&self, id: ObjectId) -> Result<Option<User>, CustomError> {
            Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }
    }

    #[actix_web::test]
    async fn maps_attachments_reactions_and_comment_count() {
        let posts = MemoryPostRepository::default();
        let comments = MemoryCommentRepository::default();
        let reactions = MemoryReactionRepository::default();
        let users = MemoryUserRepository::default();
        let presenter = PostPresenter::new(
            Arc::new(posts.clone()),
            Arc::new(comments.clone()),
            Arc::new(reactions.clone()),
            Arc::new(users.clone()),
            Arc::new(DiskStorage::new("/tmp/feed-backend-unused", "/storage")),
        );

        let now = Utc::now();
        let author_id = ObjectId::new();
        users.rows.lock().unwrap().push(User {
            id: author_id,
            name: "Ada".to_string(),
            username: "ada".to_string(),
            avatar_path: None,
            created_at: now,
            updated_at: now,
        });

        let post = Post {
            id: ObjectId::new(),
            body: Some("hello".to_string()),
            user_id: author_id,
            group_id: None,
            deleted_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        posts.state.lock().unwrap().posts.push(post.clone());
        posts.state.lock().unwrap().attachments.push(PostAttachment {
            id: ObjectId::new(),
            post_id: post.id,
            name: "photo.png".to_string(),
            path: format!("attachments/{}/abc.jpg", post.id.to_hex()),
            mime: "image/png".to_string(),
            size: 42,
            created_by: author_id,
            created_at: now,
        });

        let viewer = ObjectId::new();
        reactions.rows.lock().unwrap().push(Reaction {
            id: ObjectId::new(),
            user_id: viewer,
            target_id: post.id,
            target_kind: TargetKind::Post,
            reaction_type: ReactionType::Love,
            created_at: now,
        });

        comments.rows.lock().unwrap().push(crate::comment::model::Comment {
            id: ObjectId::new(),
            post_id: post.id,
            user_id: author_id,
            body: "first".to_string(),
            parent_id: None,
            created_at: now,
            updated_at: now,
        });

        let view = presenter.present(&post, viewer).await.unwrap();

        assert_eq!(view.body.as_deref(), Some("hello"));
        assert_eq!(view.attachments.len(), 1);
        assert_eq!(view.attachments[0].name, "photo.png");
        assert_eq!(
            view.attachments[0].url,
            format!("/storage/attachments/{}/abc.jpg", post.id.to_hex())
        );
        assert_eq!(view.reactions_count, 1);
        assert!(view.current_user_has_reaction);
        assert_eq!(view.comments_count, 1);
        assert_eq!(view.user.username, "ada");
    }
}
