//! 持仓估值数据模型

use serde::{Deserialize, Serialize};

/// 单个持仓
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// 代码
    pub symbol: String,
    /// 名称
    #[serde(default)]
    pub name: Option<String>,
    /// 股数
    pub shares: f64,
}

/// 持仓估值请求体
#[derive(Debug, Deserialize)]
pub struct PortfolioRequest {
    pub holdings: Vec<Holding>,
}

/// 单个持仓的估值结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub symbol: String,
    pub name: Option<String>,
    pub shares: f64,
    /// 美元价格
    pub price_usd: Option<f64>,
    /// 涨跌幅（百分比）
    pub change_percent: Option<f64>,
    /// 美元市值
    pub value_usd: Option<f64>,
    /// 纽元市值
    pub value_nzd: Option<f64>,
    /// 当日纽元盈亏
    pub daily_change_nzd: Option<f64>,
}

/// 组合汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub holdings: Vec<HoldingValuation>,
    /// 组合纽元总市值
    pub total_value_nzd: f64,
    /// 当日纽元盈亏
    pub daily_change_nzd: f64,
    /// 当日涨跌幅（百分比）
    pub daily_change_percent: f64,
    /// 估值所用汇率
    pub usd_to_nzd: f64,
    pub is_fallback_rate: bool,
    /// 无法估值的代码
    pub unpriced: Vec<String>,
}
