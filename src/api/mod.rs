// ============================================================================
// Request Gateway - HTTP surface over the delivery command handler
// ============================================================================

mod handlers;
mod response;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web;

use crate::metrics::{health_handler, metrics_handler};

pub use response::{ApiError, ApiResponse, DeliveryView, ErrorCode};

/// Browser frontends allowed to call the API.
const ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:8080",
    "http://localhost:8081",
    "http://localhost:8082",
];

pub fn cors() -> Cors {
    ALLOWED_ORIGINS
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .max_age(12 * 60 * 60)
}

/// JSON extractor config: malformed bodies become INVALID_REQUEST payloads.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!(error = %err, "Malformed request body");
        ApiError::invalid_request(format!("Invalid request format: {err}")).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(handlers::home))
        .route("/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler))
        .service(
            web::scope("/api/delivery")
                .route("", web::get().to(handlers::list_deliveries))
                .route("/", web::get().to(handlers::list_deliveries))
                .route("/start", web::post().to(handlers::start_delivery))
                .route("/{id}", web::get().to(handlers::get_delivery))
                .route("/{id}/pickup", web::post().to(handlers::mark_picked_up))
                .route("/{id}/in-transit", web::post().to(handlers::mark_in_transit))
                .route("/{id}/deliver", web::post().to(handlers::mark_delivered))
                .route("/{id}/cancel", web::post().to(handlers::cancel)),
        );
}
