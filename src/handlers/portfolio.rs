//! 持仓估值接口
//!
//! - POST /portfolio - 按实时行情计算持仓的纽元市值

use actix_web::{web, HttpResponse};

use crate::error::RelayError;
use crate::models::{ApiResponse, PortfolioRequest};
use crate::services::portfolio::value_portfolio;
use crate::services::QuoteRelay;

use super::read_body;

pub async fn value_holdings(
    relay: web::Data<QuoteRelay>,
    payload: web::Payload,
) -> Result<HttpResponse, RelayError> {
    relay.ensure_configured()?;
    let body = read_body(payload).await?;

    let mut request: PortfolioRequest = serde_json::from_slice(&body)
        .map_err(|e| RelayError::InvalidRequest(format!("需要 holdings 数组: {}", e)))?;
    if let Some(bad) = request
        .holdings
        .iter()
        .find(|h| !h.shares.is_finite() || h.shares < 0.0)
    {
        return Err(RelayError::InvalidRequest(format!(
            "{} 的股数无效: {}",
            bad.symbol, bad.shares
        )));
    }

    // 行情按去空白后的代码获取，估值查找也用同一代码
    for holding in &mut request.holdings {
        holding.symbol = holding.symbol.trim().to_string();
    }

    let symbols = relay.normalize_symbols(request.holdings.iter().map(|h| h.symbol.clone()))?;
    let batch = relay.fetch_batch(&symbols).await?;
    let summary = value_portfolio(&request.holdings, &batch, relay.fallback_rate());

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/portfolio", web::post().to(value_holdings));
}
