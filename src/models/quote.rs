//! 行情数据模型
//!
//! 定义中继服务的请求、单个代码行情以及整批响应

use serde::{Deserialize, Serialize};

/// USD→NZD 兜底汇率
pub const FALLBACK_USD_TO_NZD: f64 = 1.70;

fn is_false(value: &bool) -> bool {
    !*value
}

/// 单个代码的行情快照
///
/// `errored` 为 true 时所有数值字段均为空，调用方不应使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// 代码（如 AAPL）
    pub symbol: String,
    /// 当前价格
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    /// 涨跌额
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    /// 涨跌幅（百分比）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    /// 最高价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// 最低价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    /// 开盘价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    /// 昨收价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    /// 获取失败标记
    #[serde(rename = "error", default, skip_serializing_if = "is_false")]
    pub errored: bool,
}

impl Quote {
    /// 构造获取失败的行情
    pub fn errored(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            current_price: None,
            change: None,
            change_percent: None,
            high: None,
            low: None,
            open: None,
            previous_close: None,
            errored: true,
        }
    }

    /// 可信的当前价格，失败的行情返回 None
    pub fn price(&self) -> Option<f64> {
        if self.errored {
            None
        } else {
            self.current_price
        }
    }
}

/// 中继请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// 需要查询的代码列表
    pub symbols: Vec<String>,
}

/// 一次中继调用的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBatch {
    /// 每个代码一条，失败的代码带 error 标记
    pub quotes: Vec<Quote>,
    /// USD→NZD 汇率
    #[serde(default)]
    pub usd_to_nzd: Option<f64>,
    /// 汇率是否为兜底值
    #[serde(default)]
    pub is_fallback_rate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_errored_quote_wire_format() {
        let value = serde_json::to_value(Quote::errored("TSLA")).unwrap();
        assert_eq!(value, json!({"symbol": "TSLA", "error": true}));
    }

    #[test]
    fn test_quote_camel_case_fields() {
        let quote: Quote = serde_json::from_value(json!({
            "symbol": "AAPL",
            "currentPrice": 150.0,
            "changePercent": 1.5,
            "previousClose": 147.8
        }))
        .unwrap();

        assert_eq!(quote.current_price, Some(150.0));
        assert_eq!(quote.change_percent, Some(1.5));
        assert_eq!(quote.previous_close, Some(147.8));
        assert!(!quote.errored);
        assert_eq!(quote.price(), Some(150.0));
    }

    #[test]
    fn test_errored_quote_has_no_price() {
        let mut quote = Quote::errored("MSFT");
        quote.current_price = Some(1.0);
        assert_eq!(quote.price(), None);
    }

    #[test]
    fn test_batch_without_rate() {
        let batch: QuoteBatch =
            serde_json::from_value(json!({"quotes": [{"symbol": "AAPL", "currentPrice": 150}]}))
                .unwrap();
        assert_eq!(batch.usd_to_nzd, None);
        assert!(!batch.is_fallback_rate);
        assert_eq!(batch.quotes.len(), 1);
    }
}
