use crate::comment::index::comment_routes;
use crate::post::post_index::post_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(post_routes);
    cfg.configure(comment_routes);
}
