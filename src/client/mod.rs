//! 行情轮询客户端
//!
//! 定时调用中继服务，保留最近一次成功的整批行情

pub mod poller;
pub mod source;

pub use poller::{QuotePoller, QuoteState, DEFAULT_REFRESH_INTERVAL};
pub use source::{QuoteSource, RelayClient};
