//! 行情中继服务
//!
//! 为个人主页的持仓面板提供行情数据：
//! 批量转发上游行情请求并附带 USD→NZD 汇率，
//! 同时提供定时轮询中继的客户端
//! 数据来源：Finnhub

pub mod client;     // 轮询客户端
pub mod config;     // 配置加载
pub mod error;      // 接口错误
pub mod handlers;   // HTTP 请求处理器
pub mod middleware; // 中间件
pub mod models;     // 数据模型定义
pub mod services;   // 业务逻辑服务
