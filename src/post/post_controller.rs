use crate::middleware::auth::current_user_id;
use crate::post::post_service::PostService;
use crate::presenter::post::PostPresenter;
use crate::storage::StorageBackend;
use crate::utils::error::CustomError;
use crate::utils::multipart::parse_post_form;
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

/// Create a post with optional attachments
/// POST /posts
pub async fn create_post(
    req: HttpRequest,
    post_service: web::Data<PostService>,
    payload: Multipart,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;
    let form = parse_post_form(payload).await?;

    let group_id = form
        .group_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| CustomError::BadRequestError("Invalid group ID".to_string()))?;

    // A missing attachments field means "no files" on create
    let files = form.attachments.unwrap_or_default();

    let (post, attachments) = post_service
        .create_post(caller_id, form.body, group_id, files)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Post created successfully",
        "httpStatusCode": 201,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "post_id": post.id.to_hex(),
        "attachment_ids": attachments.iter().map(|a| a.id.to_hex()).collect::<Vec<_>>(),
    })))
}

/// Fetch a single post as its client view
/// GET /posts/{id}
pub async fn get_post(
    req: HttpRequest,
    post_service: web::Data<PostService>,
    post_presenter: web::Data<PostPresenter>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;
    let post_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid post ID".to_string()))?;

    let post = post_service
        .find_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

    let view = post_presenter.present(&post, caller_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "post": view,
    })))
}

/// Update a post body and swap attachments
/// PUT /posts/{id}
pub async fn update_post(
    req: HttpRequest,
    post_service: web::Data<PostService>,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;
    let post_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid post ID".to_string()))?;

    let post = post_service
        .find_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".to_string()))?;

    if post.user_id != caller_id {
        return Err(CustomError::PermissionError(
            "You don't have permission to update this post".to_string(),
        ));
    }

    let form = parse_post_form(payload).await?;

    let deleted_file_ids = form
        .deleted_file_ids
        .iter()
        .map(|id| ObjectId::parse_str(id))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CustomError::BadRequestError("Invalid attachment ID".to_string()))?;

    let attachments = post_service
        .update_post(post_id, caller_id, form.body, deleted_file_ids, form.attachments)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post updated successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "attachment_ids": attachments.iter().map(|a| a.id.to_hex()).collect::<Vec<_>>(),
    })))
}

/// Soft-delete an own post
/// DELETE /posts/{id}
pub async fn destroy_post(
    req: HttpRequest,
    post_service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let caller_id = current_user_id(&req)?;
    let post_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid post ID".to_string()))?;

    post_service.destroy_post(post_id, caller_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}

/// Stream an attachment back under its original filename.
/// Any caller holding the attachment id may download; ownership is not
/// checked here.
/// GET /posts/attachments/{attachment_id}/download
pub async fn download_attachment(
    post_service: web::Data<PostService>,
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let attachment_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid attachment ID".to_string()))?;

    let attachment = post_service
        .find_attachment(attachment_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Attachment not found".to_string()))?;

    let local_path = storage.resolve_local_path(&attachment.path);
    let bytes = tokio::fs::read(&local_path)
        .await
        .map_err(|e| CustomError::StorageError(format!("Failed to read stored file: {}", e)))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, attachment.mime.clone()))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment.name.replace('"', "_")),
        ))
        .body(bytes))
}
