use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;

mod comment;
mod database;
mod middleware;
mod post;
mod presenter;
mod reaction;
mod router;
mod storage;
mod user;
mod utils;

use comment::repository::{CommentRepository, MongoCommentRepository};
use comment::service::CommentService;
use database::RedisService;
use middleware::not_found::not_found;
use post::post_repository::{MongoPostRepository, PostRepository};
use post::post_service::PostService;
use presenter::comment::CommentPresenter;
use presenter::post::PostPresenter;
use reaction::repository::{MongoReactionRepository, ReactionRepository};
use reaction::service::ReactionService;
use router::index::routes;
use storage::StorageBackend;
use storage::disk::DiskStorage;
use user::repository::{MongoUserRepository, UserRepository};

#[get("/")]
async fn default() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the social feed API",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mongo_client = database::connect_to_mongo()
        .await
        .expect("Failed to connect to MongoDB");
    database::ensure_indexes(&mongo_client)
        .await
        .expect("Failed to create indexes");

    // Sessions are optional; without Redis the auth middleware falls back
    // to JWT-only validation
    let redis_service = match database::connect_to_redis().await {
        Ok(client) => Some(RedisService::new(&client)),
        Err(err) => {
            warn!("Redis unavailable, falling back to JWT-only auth: {}", err);
            None
        }
    };

    let storage: Arc<dyn StorageBackend> = Arc::new(DiskStorage::from_env());
    let post_repository: Arc<dyn PostRepository> =
        Arc::new(MongoPostRepository::new(&mongo_client));
    let comment_repository: Arc<dyn CommentRepository> =
        Arc::new(MongoCommentRepository::new(&mongo_client));
    let reaction_repository: Arc<dyn ReactionRepository> =
        Arc::new(MongoReactionRepository::new(&mongo_client));
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(MongoUserRepository::new(&mongo_client));

    let post_service = web::Data::new(PostService::new(post_repository.clone(), storage.clone()));
    let comment_service = web::Data::new(CommentService::new(comment_repository.clone()));
    let reaction_service = web::Data::new(ReactionService::new(reaction_repository.clone()));
    let comment_presenter = web::Data::new(CommentPresenter::new(
        comment_repository.clone(),
        reaction_repository.clone(),
        user_repository.clone(),
        storage.clone(),
    ));
    let post_presenter = web::Data::new(PostPresenter::new(
        post_repository.clone(),
        comment_repository.clone(),
        reaction_repository.clone(),
        user_repository.clone(),
        storage.clone(),
    ));
    let storage_data: web::Data<dyn StorageBackend> = web::Data::from(storage.clone());

    let host = std::env::var("HOST").unwrap_or_else(|_| "localhost".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    info!("Starting server on http://{}:{}", host, port);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Logger::default())
            .app_data(post_service.clone())
            .app_data(comment_service.clone())
            .app_data(reaction_service.clone())
            .app_data(comment_presenter.clone())
            .app_data(post_presenter.clone())
            .app_data(storage_data.clone());

        if let Some(redis) = &redis_service {
            app = app.app_data(web::Data::new(redis.clone()));
        }

        app.configure(routes)
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found))
            .service(default)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
