use actix_web::web;

use super::handlers;

/// Register all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/predict", web::post().to(handlers::predict))
            .route("/predict/cancel", web::post().to(handlers::cancel))
            .route("/session", web::get().to(handlers::session))
            .route("/audit", web::get().to(handlers::audit))
            .route("/audit", web::delete().to(handlers::clear_audit))
            .route("/history", web::get().to(handlers::history))
            .route("/simulate", web::post().to(handlers::simulate))
            .route("/simulate", web::delete().to(handlers::stop_simulation)),
    );
}
