use crate::database::RedisService;
use crate::utils::error::CustomError;
use actix_web::{Error, HttpMessage, dev::ServiceRequest, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{DecodingKey, Validation, decode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: String,
    pub exp: usize,
}

/// Verify JWT token and validate session in Redis.
///
/// Token issuance lives in the external auth service; this middleware only
/// proves who the caller is and stashes the claims for the handlers.
pub async fn verify_token(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let token = credentials.token();
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string());

    let token_data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data,
        Err(_) => return Err((actix_web::error::ErrorUnauthorized("Invalid token"), req)),
    };

    let user_id = &token_data.claims.id;

    let redis_service = match req.app_data::<web::Data<RedisService>>() {
        Some(service) => service,
        None => {
            // If Redis is not available, just validate JWT (fallback mode)
            req.extensions_mut().insert(token_data.claims);
            return Ok(req);
        }
    };

    match redis_service.validate_session(token).await {
        Ok(Some(stored_user_id)) => {
            if stored_user_id == *user_id {
                req.extensions_mut().insert(token_data.claims);
                Ok(req)
            } else {
                Err((actix_web::error::ErrorUnauthorized("Session mismatch"), req))
            }
        }
        Ok(None) => Err((
            actix_web::error::ErrorUnauthorized("Session expired or invalid"),
            req,
        )),
        Err(_) => {
            // Redis error - fallback to just JWT validation
            req.extensions_mut().insert(token_data.claims);
            Ok(req)
        }
    }
}

/// Get user ID from request extensions (use after auth middleware)
pub fn get_user_id_from_request(req: &actix_web::HttpRequest) -> Option<String> {
    req.extensions()
        .get::<Claims>()
        .map(|claims| claims.id.clone())
}

/// The authenticated caller as an ObjectId, for handlers that mutate
pub fn current_user_id(req: &actix_web::HttpRequest) -> Result<ObjectId, CustomError> {
    let user_id = get_user_id_from_request(req)
        .ok_or_else(|| CustomError::UnauthorizedError("Not authenticated".to_string()))?;

    ObjectId::parse_str(&user_id)
        .map_err(|_| CustomError::BadRequestError("Invalid user id in token".to_string()))
}
