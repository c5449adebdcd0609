//! 全球主要交易所开闭市状态

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::{America, Asia, Australia, Europe};

use crate::models::{Market, MarketStatus};

/// 关注的交易所
pub const MARKETS: [Market; 4] = [
    Market { name: "New York", short_name: "NYSE", timezone: America::New_York, open_hour: 9, close_hour: 16 },
    Market { name: "London", short_name: "LSE", timezone: Europe::London, open_hour: 8, close_hour: 16 },
    Market { name: "Tokyo", short_name: "TSE", timezone: Asia::Tokyo, open_hour: 9, close_hour: 15 },
    Market { name: "Sydney", short_name: "ASX", timezone: Australia::Sydney, open_hour: 10, close_hour: 16 },
];

/// 计算某个交易所在给定时刻的状态
///
/// 只按当地工作日和整点判断，不考虑节假日
pub fn market_status(market: &Market, now: DateTime<Utc>) -> MarketStatus {
    let local = now.with_timezone(&market.timezone);
    let weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
    let hour = local.hour();

    MarketStatus {
        name: market.name.to_string(),
        short_name: market.short_name.to_string(),
        timezone: market.timezone.name().to_string(),
        local_time: local.format("%H:%M").to_string(),
        is_open: !weekend && hour >= market.open_hour && hour < market.close_hour,
    }
}

/// 所有交易所的当前状态
pub fn all_market_status(now: DateTime<Utc>) -> Vec<MarketStatus> {
    MARKETS.iter().map(|m| market_status(m, now)).collect()
}
