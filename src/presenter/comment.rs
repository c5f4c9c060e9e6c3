use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::comment::model::Comment;
use crate::comment::repository::CommentRepository;
use crate::presenter::UserSummary;
use crate::reaction::model::TargetKind;
use crate::reaction::repository::ReactionRepository;
use crate::storage::StorageBackend;
use crate::user::repository::UserRepository;
use crate::utils::error::CustomError;
use crate::utils::helpers::diff_for_humans;

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub body: String,
    pub post_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub reactions_count: u64,
    pub current_user_has_reaction: bool,
    pub parent_id: Option<String>,
    pub comments_count: u64,
    pub comments: Vec<CommentView>,
    pub user: UserSummary,
}

/// Maps comments into the client view, descending into replies.
///
/// Related rows (author, reactions, children) are fetched on demand through
/// the repositories; callers never pre-load anything. Recursion carries the
/// set of ids already on the path and skips any child that reappears, so a
/// corrupt thread renders instead of hanging the request.
pub struct CommentPresenter {
    comments: Arc<dyn CommentRepository>,
    reactions: Arc<dyn ReactionRepository>,
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn StorageBackend>,
}

impl CommentPresenter {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        reactions: Arc<dyn ReactionRepository>,
        users: Arc<dyn UserRepository>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        CommentPresenter {
            comments,
            reactions,
            users,
            storage,
        }
    }

    pub async fn present(
        &self,
        comment: &Comment,
        viewer_id: ObjectId,
    ) -> Result<CommentView, CustomError> {
        let mut visited = HashSet::new();
        self.present_inner(comment.clone(), viewer_id, &mut visited)
            .await
    }

    pub async fn present_many(
        &self,
        comments: &[Comment],
        viewer_id: ObjectId,
    ) -> Result<Vec<CommentView>, CustomError> {
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.present(comment, viewer_id).await?);
        }
        Ok(views)
    }

    fn present_inner<'a>(
        &'a self,
        comment: Comment,
        viewer_id: ObjectId,
        visited: &'a mut HashSet<ObjectId>,
    ) -> BoxFuture<'a, Result<CommentView, CustomError>> {
        Box::pin(async move {
            visited.insert(comment.id);

            let reactions_count = self
                .reactions
                .count_for_target(comment.id, TargetKind::Comment)
                .await?;
            let current_user_has_reaction = self
                .reactions
                .find_for_user(viewer_id, comment.id, TargetKind::Comment)
                .await?
                .is_some();

            let children = self.comments.children_of(comment.id).await?;
            let comments_count = children.len() as u64;

            let mut mapped_children = Vec::new();
            for child in children {
                if visited.contains(&child.id) {
                    continue;
                }
                mapped_children.push(self.present_inner(child, viewer_id, visited).await?);
            }

            let user = self
                .users
                .find_user(comment.user_id)
                .await?
                .ok_or_else(|| {
                    CustomError::NotFoundError("Comment author no longer exists".to_string())
                })?;

            Ok(CommentView {
                id: comment.id.to_hex(),
                body: comment.body,
                post_id: comment.post_id.to_hex(),
                created_at: diff_for_humans(comment.created_at),
                updated_at: diff_for_humans(comment.updated_at),
                reactions_count,
                current_user_has_reaction,
                parent_id: comment.parent_id.map(|id| id.to_hex()),
                comments_count,
                comments: mapped_children,
                user: UserSummary::from_user(user, self.storage.as_ref()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::service::tests::MemoryCommentRepository;
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

    struct Fixture {
        presenter: CommentPresenter,
        comments: MemoryCommentRepository,
        reactions: MemoryReactionRepository,
        users: MemoryUserRepository,
    }

    fn fixture() -> Fixture {
        let comments = MemoryCommentRepository::default();
        let reactions = MemoryReactionRepository::default();
        let users = MemoryUserRepository::default();
        let storage = Arc::new(DiskStorage::new("/tmp/feed-backend-unused", "/storage"));
        let presenter = CommentPresenter::new(
            Arc::new(comments.clone()),
            Arc::new(reactions.clone()),
            Arc::new(users.clone()),
            storage,
        );
        Fixture {
            presenter,
            comments,
            reactions,
            users,
        }
    }

    fn seed_user(fixture: &Fixture, name: &str, avatar: Option<&str>) -> ObjectId {
        let id = ObjectId::new();
        let now = Utc::now();
        fixture.users.rows.lock().unwrap().push(User {
            id,
            name: name.to_string(),
            username: name.to_lowercase(),
            avatar_path: avatar.map(|a| a.to_string()),
            created_at: now,
            updated_at: now,
        });
        id
    }

    fn seed_comment(
        fixture: &Fixture,
        post_id: ObjectId,
        user_id: ObjectId,
        body: &str,
        parent_id: Option<ObjectId>,
    ) -> Comment {
        let now = Utc::now();
        let comment = Comment {
            id: ObjectId::new(),
            post_id,
            user_id,
            body: body.to_string(),
            parent_id,
            created_at: now,
            updated_at: now,
        };
        fixture.comments.rows.lock().unwrap().push(comment.clone());
        comment
    }

    #[actix_web::test]
    async fn maps_derived_fields_and_replies() {
        let fixture = fixture();
        let post_id = ObjectId::new();
        let author = seed_user(&fixture, "Ada", Some("avatars/ada.jpg"));
        let viewer = seed_user(&fixture, "Brian", None);

        let top = seed_comment(&fixture, post_id, author, "top", None);
        let reply = seed_comment(&fixture, post_id, viewer, "reply", Some(top.id));

        // Viewer reacted to the top comment, someone else to the reply
        for user_id in [viewer, ObjectId::new()] {
            fixture.reactions.rows.lock().unwrap().push(Reaction {
                id: ObjectId::new(),
                user_id,
                target_id: top.id,
                target_kind: TargetKind::Comment,
                reaction_type: ReactionType::Like,
                created_at: Utc::now(),
            });
        }

        let view = fixture.presenter.present(&top, viewer).await.unwrap();

        assert_eq!(view.id, top.id.to_hex());
        assert_eq!(view.post_id, post_id.to_hex());
        assert_eq!(view.reactions_count, 2);
        assert!(view.current_user_has_reaction);
        assert!(view.created_at.ends_with("ago") || view.created_at == "just now");
        assert_eq!(view.comments_count, 1);
        assert_eq!(view.user.name, "Ada");
        assert_eq!(
            view.user.avatar_url.as_deref(),
            Some("/storage/avatars/ada.jpg")
        );

        let mapped_reply = &view.comments[0];
        assert_eq!(mapped_reply.id, reply.id.to_hex());
        assert_eq!(mapped_reply.parent_id.as_deref(), Some(top.id.to_hex().as_str()));
        assert_eq!(mapped_reply.reactions_count, 0);
        assert!(!mapped_reply.current_user_has_reaction);
        assert_eq!(mapped_reply.user.name, "Brian");
        assert_eq!(mapped_reply.user.avatar_url, None);
    }

    #[actix_web::test]
    async fn a_cyclic_thread_still_renders() {
        let fixture = fixture();
        let post_id = ObjectId::new();
        let author = seed_user(&fixture, "Ada", None);

        // Corrupt data: two comments each claiming the other as parent
        let a = seed_comment(&fixture, post_id, author, "a", None);
        let b = seed_comment(&fixture, post_id, author, "b", Some(a.id));
        {
            let mut rows = fixture.comments.rows.lock().unwrap();
            rows.iter_mut().find(|c| c.id == a.id).unwrap().parent_id = Some(b.id);
        }

        let view = fixture.presenter.present(&a, author).await.unwrap();

        // b is rendered once; the backlink to a is skipped, not recursed
        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].id, b.id.to_hex());
        assert!(view.comments[0].comments.is_empty());
    }

    #[actix_web::test]
    async fn present_many_maps_each_top_level_comment() {
        let fixture = fixture();
        let post_id = ObjectId::new();
        let author = seed_user(&fixture, "Ada", None);

        let first = seed_comment(&fixture, post_id, author, "one", None);
        let second = seed_comment(&fixture, post_id, author, "two", None);

        let views = fixture
            .presenter
            .present_many(&[first, second], author)
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].body, "one");
        assert_eq!(views[1].body, "two");
    }
}
