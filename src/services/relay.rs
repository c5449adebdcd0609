//! 行情中继服务
//!
//! 每个代码单独发起一次上游请求并发执行，同时获取 USD→NZD 汇率。
//! 单个代码失败只会把该代码标记为 error，不影响整批；汇率失败则回退到兜底汇率。

use std::time::Duration;

use futures::future::join_all;
use tokio::time::{timeout_at, Instant};

use crate::config::UpstreamConfig;
use crate::error::RelayError;
use crate::models::{Quote, QuoteBatch, QuoteRequest};

use super::finnhub::FinnhubClient;

/// 行情中继
///
/// 未配置凭证时 `client` 为空，所有请求都返回配置错误
#[derive(Debug, Clone)]
pub struct QuoteRelay {
    client: Option<FinnhubClient>,
    batch_timeout: Duration,
    fallback_rate: f64,
    max_symbols: usize,
}

impl QuoteRelay {
    /// 按上游配置创建中继
    pub fn from_config(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = match config.credential() {
            Some(key) => Some(FinnhubClient::from_config(config, key)?),
            None => {
                log::error!("未配置上游凭证，行情请求将全部返回 500");
                None
            }
        };

        Ok(Self {
            client,
            batch_timeout: Duration::from_secs(config.batch_timeout_secs),
            fallback_rate: config.fallback_usd_to_nzd,
            max_symbols: config.max_symbols,
        })
    }

    /// 是否已配置上游凭证
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// 兜底汇率
    pub fn fallback_rate(&self) -> f64 {
        self.fallback_rate
    }

    /// 检查凭证
    pub fn ensure_configured(&self) -> Result<(), RelayError> {
        self.client
            .as_ref()
            .map(|_| ())
            .ok_or(RelayError::MissingCredential)
    }

    /// 解析请求体中的代码列表
    pub fn parse_request(&self, body: &[u8]) -> Result<Vec<String>, RelayError> {
        let request: QuoteRequest = serde_json::from_slice(body).map_err(|e| {
            RelayError::InvalidRequest(format!("需要 symbols 字符串数组: {}", e))
        })?;
        self.normalize_symbols(request.symbols)
    }

    /// 去除首尾空白并去重（保留首次出现的顺序）
    pub fn normalize_symbols<I>(&self, symbols: I) -> Result<Vec<String>, RelayError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.trim();
            if symbol.is_empty() {
                return Err(RelayError::InvalidRequest("symbols 不能包含空字符串".into()));
            }
            if !normalized.iter().any(|s| s == symbol) {
                normalized.push(symbol.to_string());
            }
        }

        if normalized.is_empty() {
            return Err(RelayError::InvalidRequest("symbols 不能为空".into()));
        }
        if normalized.len() > self.max_symbols {
            return Err(RelayError::InvalidRequest(format!(
                "symbols 数量 {} 超过上限 {}",
                normalized.len(),
                self.max_symbols
            )));
        }
        Ok(normalized)
    }

    /// 并发获取整批行情和汇率
    ///
    /// 返回的 quotes 与 `symbols` 一一对应，失败的代码带 error 标记
    pub async fn fetch_batch(&self, symbols: &[String]) -> Result<QuoteBatch, RelayError> {
        let client = self.client.as_ref().ok_or(RelayError::MissingCredential)?;
        let deadline = Instant::now() + self.batch_timeout;

        log::info!("获取行情: {:?}", symbols);

        // 每个代码一个任务，任务内 panic 也只影响该代码
        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let client = client.clone();
                let symbol = symbol.clone();
                tokio::spawn(async move { fetch_symbol(&client, symbol, deadline).await })
            })
            .collect();

        let (rate, results) = tokio::join!(
            self.resolve_rate(client, deadline),
            join_all(handles)
        );

        let quotes = symbols
            .iter()
            .zip(results)
            .map(|(symbol, result)| match result {
                Ok(quote) => quote,
                Err(e) => {
                    log::error!("获取 {} 的任务异常: {}", symbol, e);
                    Quote::errored(symbol.as_str())
                }
            })
            .collect();

        let (usd_to_nzd, is_fallback_rate) = rate;
        Ok(QuoteBatch {
            quotes,
            usd_to_nzd: Some(usd_to_nzd),
            is_fallback_rate,
        })
    }

    /// 获取汇率，任何失败都回退到兜底汇率
    async fn resolve_rate(&self, client: &FinnhubClient, deadline: Instant) -> (f64, bool) {
        match timeout_at(deadline, client.fetch_usd_to_nzd()).await {
            Ok(Ok(rate)) => {
                log::info!("USD→NZD 汇率: {}", rate);
                (rate, false)
            }
            Ok(Err(e)) => {
                log::warn!("获取汇率失败，使用兜底汇率 {}: {}", self.fallback_rate, e);
                (self.fallback_rate, true)
            }
            Err(_) => {
                log::warn!("获取汇率超时，使用兜底汇率 {}", self.fallback_rate);
                (self.fallback_rate, true)
            }
        }
    }
}

/// 获取单个代码，失败或超过整批截止时间都返回 error 标记
async fn fetch_symbol(client: &FinnhubClient, symbol: String, deadline: Instant) -> Quote {
    match timeout_at(deadline, client.fetch_quote(&symbol)).await {
        Ok(Ok(quote)) => quote,
        Ok(Err(e)) => {
            log::warn!("获取 {} 失败: {}", symbol, e);
            Quote::errored(symbol)
        }
        Err(_) => {
            log::warn!("获取 {} 超时", symbol);
            Quote::errored(symbol)
        }
    }
}
