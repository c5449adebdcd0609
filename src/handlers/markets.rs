use actix_web::{web, HttpResponse, Result};
use chrono::Utc;

use crate::models::ApiResponse;
use crate::services::market_hours::all_market_status;

pub async fn list_markets() -> Result<HttpResponse> {
    let response = ApiResponse::success(all_market_status(Utc::now()));
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/markets", web::get().to(list_markets));
}
