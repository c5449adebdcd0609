//! 接口错误定义
//!
//! 处理器边界上的错误统一渲染为 `{ "error": "..." }`

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::config::API_KEY_ENV;
use crate::models::ErrorResponse;

/// 中继接口错误
#[derive(Error, Debug)]
pub enum RelayError {
    /// 未配置上游凭证，修正配置前每次请求都会失败
    #[error("{} 未配置", API_KEY_ENV)]
    MissingCredential,

    /// 请求体缺失或格式错误
    #[error("{0}")]
    InvalidRequest(String),

    /// 请求体超出上限（字节）
    #[error("请求体超过 {0} 字节上限")]
    PayloadTooLarge(usize),
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
