use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::reaction::model::{Reaction, ReactionType, TargetKind};
use crate::reaction::repository::ReactionRepository;
use crate::utils::error::CustomError;

#[derive(Debug, Serialize)]
pub struct ToggleOutcome {
    pub reactions_count: u64,
    pub current_user_has_reaction: bool,
}

/// Ledger of one reaction per (user, target): toggling deletes the existing
/// row whatever its type, or inserts a new one with the requested type
pub struct ReactionService {
    repository: Arc<dyn ReactionRepository>,
}

impl ReactionService {
    pub fn new(repository: Arc<dyn ReactionRepository>) -> Self {
        ReactionService { repository }
    }

    pub async fn toggle(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
        target_kind: TargetKind,
        reaction_type: ReactionType,
    ) -> Result<ToggleOutcome, CustomError> {
        let current_user_has_reaction = match self
            .apply_toggle(user_id, target_id, target_kind, reaction_type)
            .await
        {
            Ok(has_reaction) => has_reaction,
            Err(CustomError::ConflictError(_)) => {
                // Lost the unique-index race to a concurrent toggle by the
                // same user. Retry the lookup once: the surviving row
                // already satisfies the add intent, so leave it in place.
                self.repository
                    .find_for_user(user_id, target_id, target_kind)
                    .await?
                    .is_some()
            }
            Err(err) => return Err(err),
        };

        let reactions_count = self
            .repository
            .count_for_target(target_id, target_kind)
            .await?;

        Ok(ToggleOutcome {
            reactions_count,
            current_user_has_reaction,
        })
    }

    async fn apply_toggle(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
        target_kind: TargetKind,
        reaction_type: ReactionType,
    ) -> Result<bool, CustomError> {
        match self
            .repository
            .find_for_user(user_id, target_id, target_kind)
            .await?
        {
            Some(existing) => {
                self.repository.delete(existing.id).await?;
                Ok(false)
            }
            None => {
                let reaction = Reaction {
                    id: ObjectId::new(),
                    user_id,
                    target_id,
                    target_kind,
                    reaction_type,
                    created_at: Utc::now(),
                };
                self.repository.insert(&reaction).await?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Barrier;

    #[derive(Default, Clone)]
    pub(crate) struct MemoryReactionRepository {
        pub rows: Arc<Mutex<Vec<Reaction>>>,
    }

    #[async_trait]
    impl ReactionRepository for MemoryReactionRepository {
        async fn find_for_user(
            &self,
            user_id: ObjectId,
            target_id: ObjectId,
            target_kind: TargetKind,
        ) -> Result<Option<Reaction>, CustomError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| {
                    r.user_id == user_id
                        && r.target_id == target_id
                        && r.target_kind == target_kind
                })
                .cloned())
        }

        async fn insert(&self, reaction: &Reaction) -> Result<(), CustomError> {
            let mut rows = self.rows.lock().unwrap();
            // Same uniqueness the mongo index enforces
            if rows.iter().any(|r| {
                r.user_id == reaction.user_id
                    && r.target_id == reaction.target_id
                    && r.target_kind == reaction.target_kind
            }) {
                return Err(CustomError::ConflictError(
                    "Reaction already recorded".to_string(),
                ));
            }
            rows.push(reaction.clone());
            Ok(())
        }

        async fn delete(&self, id: ObjectId) -> Result<bool, CustomError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() < before)
        }

        async fn count_for_target(
            &self,
            target_id: ObjectId,
            target_kind: TargetKind,
        ) -> Result<u64, CustomError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.target_id == target_id && r.target_kind == target_kind)
                .count() as u64)
        }
    }

    /// Holds the first two lookups at a barrier so both toggles decide on
    /// the same empty state, forcing the unique-index race
    struct RacingRepository {
        inner: MemoryReactionRepository,
        barrier: Arc<Barrier>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ReactionRepository for RacingRepository {
        async fn find_for_user(
            &self,
            user_id: ObjectId,
            target_id: ObjectId,
            target_kind: TargetKind,
        ) -> Result<Option<Reaction>, CustomError> {
            if self.lookups.fetch_add(1, Ordering::SeqCst) < 2 {
                self.barrier.wait().await;
            }
            self.inner.find_for_user(user_id, target_id, target_kind).await
        }

        async fn insert(&self, reaction: &Reaction) -> Result<(), CustomError> {
            self.inner.insert(reaction).await
        }

        async fn delete(&self, id: ObjectId) -> Result<bool, CustomError> {
            self.inner.delete(id).await
        }

        async fn count_for_target(
            &self,
            target_id: ObjectId,
            target_kind: TargetKind,
        ) -> Result<u64, CustomError> {
            self.inner.count_for_target(target_id, target_kind).await
        }
    }

    fn service() -> (ReactionService, MemoryReactionRepository) {
        let repository = MemoryReactionRepository::default();
        (
            ReactionService::new(Arc::new(repository.clone())),
            repository,
        )
    }

    #[actix_web::test]
    async fn toggling_twice_returns_to_the_original_state() {
        let (service, repository) = service();
        let user = ObjectId::new();
        let post = ObjectId::new();

        let added = service
            .toggle(user, post, TargetKind::Post, ReactionType::Like)
            .await
            .unwrap();
        assert!(added.current_user_has_reaction);
        assert_eq!(added.reactions_count, 1);

        let removed = service
            .toggle(user, post, TargetKind::Post, ReactionType::Like)
            .await
            .unwrap();
        assert!(!removed.current_user_has_reaction);
        assert_eq!(removed.reactions_count, 0);
        assert!(repository.rows.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn toggle_removes_an_existing_reaction_of_any_type() {
        let (service, repository) = service();
        let user = ObjectId::new();
        let post = ObjectId::new();

        service
            .toggle(user, post, TargetKind::Post, ReactionType::Like)
            .await
            .unwrap();

        // Asking for Love while holding Like removes the Like, no switch
        let outcome = service
            .toggle(user, post, TargetKind::Post, ReactionType::Love)
            .await
            .unwrap();
        assert!(!outcome.current_user_has_reaction);
        assert_eq!(outcome.reactions_count, 0);
        assert!(repository.rows.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn count_reflects_all_rows_for_the_target() {
        let (service, _repository) = service();
        let post = ObjectId::new();
        let comment = ObjectId::new();

        for _ in 0..3 {
            service
                .toggle(ObjectId::new(), post, TargetKind::Post, ReactionType::Like)
                .await
                .unwrap();
        }
        // A comment reaction with the same id does not leak into the post count
        service
            .toggle(ObjectId::new(), comment, TargetKind::Comment, ReactionType::Wow)
            .await
            .unwrap();

        let outcome = service
            .toggle(ObjectId::new(), post, TargetKind::Post, ReactionType::Sad)
            .await
            .unwrap();
        assert_eq!(outcome.reactions_count, 4);
    }

    #[actix_web::test]
    async fn posts_and_comments_are_distinct_targets() {
        let (service, repository) = service();
        let user = ObjectId::new();
        let id = ObjectId::new();

        service
            .toggle(user, id, TargetKind::Post, ReactionType::Like)
            .await
            .unwrap();
        let outcome = service
            .toggle(user, id, TargetKind::Comment, ReactionType::Like)
            .await
            .unwrap();

        assert!(outcome.current_user_has_reaction);
        assert_eq!(repository.rows.lock().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn concurrent_toggles_leave_exactly_one_row() {
        let repository = MemoryReactionRepository::default();
        let racing = Arc::new(RacingRepository {
            inner: repository.clone(),
            barrier: Arc::new(Barrier::new(2)),
            lookups: AtomicUsize::new(0),
        });
        let service = ReactionService::new(racing);

        let user = ObjectId::new();
        let post = ObjectId::new();

        let (first, second) = futures_util::join!(
            service.toggle(user, post, TargetKind::Post, ReactionType::Like),
            service.toggle(user, post, TargetKind::Post, ReactionType::Like),
        );

        let first = first.unwrap();
        let second = second.unwrap();

        // Both calls raced the same empty state; the loser's retry sees the
        // surviving row and reports it instead of toggling it back off
        assert!(first.current_user_has_reaction);
        assert!(second.current_user_has_reaction);
        assert_eq!(repository.rows.lock().unwrap().len(), 1);
    }
}
