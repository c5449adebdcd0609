//! 行情中继接口
//!
//! - POST /stock-prices - 批量获取行情及 USD→NZD 汇率

use actix_web::{web, HttpResponse};

use crate::error::RelayError;
use crate::services::QuoteRelay;

use super::read_body;

/// 先检查凭证再解析请求体，两者任一失败都不会发起上游请求
pub async fn stock_prices(
    relay: web::Data<QuoteRelay>,
    payload: web::Payload,
) -> Result<HttpResponse, RelayError> {
    relay.ensure_configured()?;
    let body = read_body(payload).await?;
    let symbols = relay.parse_request(&body)?;
    let batch = relay.fetch_batch(&symbols).await?;
    Ok(HttpResponse::Ok().json(batch))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/stock-prices", web::post().to(stock_prices));
}
