use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::database::DATABASE_NAME;
use crate::user::model::User;
use crate::utils::error::CustomError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, CustomError>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(client: &Client) -> Self {
        let collection = client.database(DATABASE_NAME).collection::<User>("users");
        MongoUserRepository { collection }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch user: {}", e)))
    }
}
