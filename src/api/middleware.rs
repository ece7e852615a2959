use actix_cors::Cors;
use actix_web::http::header;

use crate::config::ServerConfig;

/// CORS policy for the dashboard front end.
///
/// With no configured origin every origin is allowed, which suits local
/// development against a separately served front end.
pub fn cors(config: &ServerConfig) -> Cors {
    match config.cors_origin.as_deref() {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600),
        None => Cors::permissive(),
    }
}
