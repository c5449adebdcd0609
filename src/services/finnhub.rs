//! Finnhub 行情接口实现
//!
//! 对接 `/quote`（单个代码实时行情）和 `/forex/rates`（汇率）
//! 凭证通过 `X-Finnhub-Token` 请求头传递

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::models::Quote;

/// 凭证请求头
const TOKEN_HEADER: &str = "X-Finnhub-Token";

/// 上游请求错误
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("上游返回状态码 {0}")]
    Status(StatusCode),

    #[error("响应缺少字段 {0}")]
    MissingField(&'static str),

    #[error("代码 {0} 无行情数据")]
    SymbolNotFound(String),

    #[error("地址无效: {0}")]
    Url(#[from] url::ParseError),
}

/// `/quote` 响应
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// 当前价格
    c: Option<f64>,
    /// 涨跌额
    d: Option<f64>,
    /// 涨跌幅
    dp: Option<f64>,
    /// 最高价
    h: Option<f64>,
    /// 最低价
    l: Option<f64>,
    /// 开盘价
    o: Option<f64>,
    /// 昨收价
    pc: Option<f64>,
}

/// `/forex/rates` 响应
#[derive(Debug, Deserialize)]
struct ForexResponse {
    #[serde(default)]
    quote: Option<ForexQuote>,
}

#[derive(Debug, Deserialize)]
struct ForexQuote {
    #[serde(rename = "NZD")]
    nzd: Option<f64>,
}

/// Finnhub HTTP 客户端
///
/// `Client` 内部是引用计数的连接池，克隆开销很小
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl FinnhubClient {
    /// 按配置创建客户端
    pub fn from_config(config: &UpstreamConfig, api_key: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url)?,
            api_key: api_key.to_string(),
        })
    }

    /// 获取单个代码的实时行情
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, UpstreamError> {
        let url = self.base_url.join("quote")?;

        let response = self
            .client
            .get(url)
            .query(&[("symbol", symbol)])
            .header(TOKEN_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let data: QuoteResponse = response.json().await?;
        log::debug!("{} 行情数据: {:?}", symbol, data);

        parse_quote(symbol, data)
    }

    /// 获取 USD→NZD 汇率
    pub async fn fetch_usd_to_nzd(&self) -> Result<f64, UpstreamError> {
        let url = self.base_url.join("forex/rates")?;

        let response = self
            .client
            .get(url)
            .query(&[("base", "USD")])
            .header(TOKEN_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let data: ForexResponse = response.json().await?;
        data.quote
            .and_then(|q| q.nzd)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or(UpstreamError::MissingField("quote.NZD"))
    }
}

/// 保证基础地址以 `/` 结尾，否则 `join` 会吞掉最后一段路径
fn normalize_base_url(base: &str) -> Result<Url, url::ParseError> {
    if base.ends_with('/') {
        Url::parse(base)
    } else {
        Url::parse(&format!("{}/", base))
    }
}

/// Finnhub 对未知代码返回全零
fn parse_quote(symbol: &str, data: QuoteResponse) -> Result<Quote, UpstreamError> {
    let current_price = data.c.ok_or(UpstreamError::MissingField("c"))?;
    if current_price == 0.0 && data.pc.unwrap_or(0.0) == 0.0 {
        return Err(UpstreamError::SymbolNotFound(symbol.to_string()));
    }

    Ok(Quote {
        symbol: symbol.to_string(),
        current_price: Some(current_price),
        change: data.d,
        change_percent: data.dp,
        high: data.h,
        low: data.l,
        open: data.o,
        previous_close: data.pc,
        errored: false,
    })
}
