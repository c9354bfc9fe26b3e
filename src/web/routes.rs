use actix_web::web;
use crate::web::handlers;

// Base64 images and pasted documents travel inside the chat body
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES));
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/chat")
                    .route(web::post().to(handlers::chat))
                    .default_service(web::route().to(handlers::method_not_allowed)),
            )
            .route("/models", web::get().to(handlers::models))
            .service(
                web::resource("/chats")
                    .route(web::get().to(handlers::list_chats))
                    .route(web::post().to(handlers::save_chat)),
            )
            .service(
                web::resource("/chats/{id}")
                    .route(web::get().to(handlers::get_chat))
                    .route(web::delete().to(handlers::delete_chat)),
            ),
    )
    .route("/health", web::get().to(handlers::health_check));
}
