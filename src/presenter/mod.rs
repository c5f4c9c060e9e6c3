pub mod comment;
pub mod post;

use serde::Serialize;

use crate::storage::StorageBackend;
use crate::user::model::User;

/// The author block nested inside every view model
#[derive(Debug, Serialize, Clone)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl UserSummary {
    pub fn from_user(user: User, storage: &dyn StorageBackend) -> Self {
        UserSummary {
            id: user.id.to_hex(),
            name: user.name,
            username: user.username,
            avatar_url: user.avatar_path.map(|path| storage.resolve_url(&path)),
        }
    }
}
