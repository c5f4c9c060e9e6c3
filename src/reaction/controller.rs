use crate::comment::service::CommentService;
use crate::middleware::auth::current_user_id;
use crate::post::post_service::PostService;
use crate::reaction::model::{TargetKind, ToggleReactionRequest};
use crate::reaction::service::ReactionService;
use crate::utils::error::CustomError;
use actix_web::{HttpRequest, HttpResponse, web};
use mongodb::bson::oid::ObjectId;

/// Toggle the caller's reaction on a post
/// POST /posts/{post_id}/reaction
pub async fn post_reaction(
    req: HttpRequest,
    post_service: web::Data<PostService>,
    reaction_service: web::Data<ReactionService>,
    path: web::Path<String>,
    body: web::Json<ToggleReactionRequest>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;

    let post_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid post ID".to_string()))?;

    post_service
        .find_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

    let outcome = reaction_service
        .toggle(caller_id, post_id, TargetKind::Post, body.reaction)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Toggle the caller's reaction on a comment
/// POST /comments/{comment_id}/reaction
pub async fn comment_reaction(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    reaction_service: web::Data<ReactionService>,
    path: web::Path<String>,
    body: web::Json<ToggleReactionRequest>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;

    let comment_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid comment ID".to_string()))?;

    comment_service
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

    let outcome = reaction_service
        .toggle(caller_id, comment_id, TargetKind::Comment, body.reaction)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
