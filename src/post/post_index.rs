use super::post_controller::{create_post, destroy_post, download_attachment, get_post, update_post};
use crate::middleware::auth::verify_token;
use crate::reaction::controller::post_reaction;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(create_post))
            .route(
                "/attachments/{attachment_id}/download",
                web::get().to(download_attachment),
            )
            .route("/{post_id}/reaction", web::post().to(post_reaction))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::put().to(update_post))
            .route("/{id}", web::delete().to(destroy_post)),
    );
}
