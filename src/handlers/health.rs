use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::models::ApiResponse;
use crate::services::QuoteRelay;

pub async fn health_check(relay: web::Data<QuoteRelay>) -> Result<HttpResponse> {
    let response = ApiResponse::with_message(
        json!({ "upstreamConfigured": relay.is_configured() }),
        "Service is healthy",
    );
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
