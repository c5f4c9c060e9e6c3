use crate::comment::model::{CreateCommentRequest, UpdateCommentRequest};
use crate::comment::service::CommentService;
use crate::middleware::auth::current_user_id;
use crate::post::post_service::PostService;
use crate::presenter::comment::CommentPresenter;
use crate::utils::error::CustomError;
use actix_web::{HttpRequest, HttpResponse, web};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

/// Create a new comment on a post, optionally replying to another comment
/// POST /comments
pub async fn create_comment(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    post_service: web::Data<PostService>,
    presenter: web::Data<CommentPresenter>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;

    let post_id = ObjectId::parse_str(&body.post_id)
        .map_err(|_| CustomError::BadRequestError("Invalid post ID".to_string()))?;

    post_service
        .find_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

    let parent_id = body
        .parent_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| CustomError::BadRequestError("Invalid parent comment ID".to_string()))?;

    let comment = comment_service
        .create_comment(post_id, caller_id, &body.comment, parent_id)
        .await?;
    let view = presenter.present(&comment, caller_id).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment created successfully",
        "httpStatusCode": 201,
        "comment": view,
    })))
}

/// Get the mapped comment tree for a post
/// GET /comments/post/{post_id}
pub async fn get_post_comments(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    post_service: web::Data<PostService>,
    presenter: web::Data<CommentPresenter>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;

    let post_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid post ID".to_string()))?;

    post_service
        .find_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

    let comments = comment_service.comments_for_post(post_id).await?;
    let views = presenter.present_many(&comments, caller_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comments retrieved successfully",
        "httpStatusCode": 200,
        "count": views.len(),
        "data": views,
    })))
}

/// Update a comment
/// PUT /comments/{comment_id}
pub async fn update_comment(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    presenter: web::Data<CommentPresenter>,
    path: web::Path<String>,
    body: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;

    let comment_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid comment ID".to_string()))?;

    let comment = comment_service
        .update_comment(comment_id, caller_id, &body.comment)
        .await?;
    let view = presenter.present(&comment, caller_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comment updated successfully",
        "httpStatusCode": 200,
        "comment": view,
    })))
}

/// Delete a comment
/// DELETE /comments/{comment_id}
pub async fn delete_comment(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;

    let comment_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid comment ID".to_string()))?;

    comment_service.delete_comment(comment_id, caller_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comment deleted successfully",
        "httpStatusCode": 200,
    })))
}
