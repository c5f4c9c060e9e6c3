use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, IndexModel};
use std::error::Error;

pub const DATABASE_NAME: &str = "social_feed_db";

pub struct Database {
    pub client: Client,
}

impl Database {
    pub async fn init() -> Result<Self, Box<dyn Error>> {
        let mongodb_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mut client_options = ClientOptions::parse(&mongodb_uri).await?;
        client_options.app_name = Some("feed-backend".to_string());

        let client = Client::with_options(client_options)?;

        // Ping the server to see if you can connect to the cluster
        client
            .database("admin")
            .run_command(doc! {"ping": 1})
            .await?;

        println!("Connected successfully to MongoDB");

        Ok(Self { client })
    }
}

pub async fn connect_to_mongo() -> Result<Client, Box<dyn Error>> {
    let database = Database::init().await.map_err(|e| {
        eprintln!("Failed to initialize database: {:?}", e);
        e
    })?;
    Ok(database.client)
}

/// Create the indexes the feed depends on.
///
/// The compound unique index on reactions is what makes the toggle race-safe:
/// two concurrent inserts for the same (user, target) cannot both land.
pub async fn ensure_indexes(client: &Client) -> Result<(), mongodb::error::Error> {
    let db = client.database(DATABASE_NAME);

    let unique_reaction = IndexModel::builder()
        .keys(doc! { "user_id": 1, "target_id": 1, "target_kind": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<Document>("reactions")
        .create_index(unique_reaction)
        .await?;

    db.collection::<Document>("comments")
        .create_index(IndexModel::builder().keys(doc! { "post_id": 1 }).build())
        .await?;
    db.collection::<Document>("comments")
        .create_index(IndexModel::builder().keys(doc! { "parent_id": 1 }).build())
        .await?;
    db.collection::<Document>("post_attachments")
        .create_index(IndexModel::builder().keys(doc! { "post_id": 1 }).build())
        .await?;

    Ok(())
}
