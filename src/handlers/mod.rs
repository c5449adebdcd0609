pub mod quotes;
pub mod portfolio;
pub mod markets;
pub mod health;

use actix_web::web;
use futures::StreamExt;

use crate::error::RelayError;

/// 请求体上限
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// 读取请求体，超出上限或读取失败时返回 `{error}` 形式的错误
pub async fn read_body(mut payload: web::Payload) -> Result<web::BytesMut, RelayError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk
            .map_err(|e| RelayError::InvalidRequest(format!("读取请求体失败: {}", e)))?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(RelayError::PayloadTooLarge(MAX_BODY_BYTES));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(quotes::config)
            .configure(portfolio::config)
            .configure(markets::config)
    );
}
