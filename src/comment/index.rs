use super::controller::{create_comment, delete_comment, get_post_comments, update_comment};
use crate::middleware::auth::verify_token;
use crate::reaction::controller::comment_reaction;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/comments")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(create_comment))
            .route("/post/{post_id}", web::get().to(get_post_comments))
            .route("/{comment_id}/reaction", web::post().to(comment_reaction))
            .route("/{comment_id}", web::put().to(update_comment))
            .route("/{comment_id}", web::delete().to(delete_comment)),
    );
}
