//! 交易所开闭市模型

use chrono_tz::Tz;
use serde::Serialize;

/// 交易所定义
#[derive(Debug, Clone, Copy)]
pub struct Market {
    /// 城市名称
    pub name: &'static str,
    /// 交易所简称
    pub short_name: &'static str,
    /// 所在时区
    pub timezone: Tz,
    /// 开市小时（当地时间）
    pub open_hour: u32,
    /// 闭市小时（当地时间，不含）
    pub close_hour: u32,
}

/// 交易所当前状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub name: String,
    pub short_name: String,
    pub timezone: String,
    /// 当地时间 HH:MM
    pub local_time: String,
    pub is_open: bool,
}
