//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod finnhub;       // 上游行情接口
pub mod relay;         // 行情中继
pub mod portfolio;     // 持仓估值
pub mod market_hours;  // 交易所开闭市

pub use finnhub::{FinnhubClient, UpstreamError};
pub use relay::QuoteRelay;
