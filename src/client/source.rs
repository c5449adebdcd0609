//! 行情来源
//!
//! 轮询器通过 [`QuoteSource`] 获取整批行情，[`RelayClient`] 是调用中继服务的 HTTP 实现

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::models::{ErrorResponse, QuoteBatch, QuoteRequest};

/// 整批行情来源
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
    async fn fetch(&self, symbols: &[String]) -> Result<QuoteBatch>;
}

/// 中继服务客户端
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    url: String,
}

impl RelayClient {
    /// `url` 为中继接口完整地址，如 `http://127.0.0.1:8080/api/v1/stock-prices`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for RelayClient {
    async fn fetch(&self, symbols: &[String]) -> Result<QuoteBatch> {
        let request = QuoteRequest {
            symbols: symbols.to_vec(),
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            // 中继返回 { error }，取不到时退回状态码
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => format!("中继返回状态码 {}", status),
            };
            return Err(anyhow!(message));
        }

        Ok(response.json::<QuoteBatch>().await?)
    }
}
