use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::env;

/// Redis connection wrapper
pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// Initialize Redis connection from environment variable
    pub async fn init() -> Result<Self, String> {
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let client =
            Client::open(redis_url).map_err(|e| format!("Failed to create Redis client: {}", e))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| format!("Failed to connect to Redis: {}", e))?;

        println!("Connected successfully to Redis");

        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Session lookups for the bearer-token middleware.
///
/// Sessions are written by the external auth service as `token:{token}` keys
/// holding the user id; this service only reads them.
#[derive(Clone)]
pub struct RedisService {
    connection: MultiplexedConnection,
}

impl RedisService {
    pub fn new(client: &RedisClient) -> Self {
        Self {
            connection: client.get_connection(),
        }
    }

    /// Resolve a session token to the user id it was issued for
    pub async fn validate_session(&self, token: &str) -> Result<Option<String>, String> {
        let mut conn = self.connection.clone();
        let token_key = format!("token:{}", token);

        let user_id: Option<String> = conn
            .get(&token_key)
            .await
            .map_err(|e| format!("Failed to validate session: {}", e))?;

        Ok(user_id)
    }
}

/// Convenience function to connect to Redis
pub async fn connect_to_redis() -> Result<RedisClient, String> {
    RedisClient::init().await
}
