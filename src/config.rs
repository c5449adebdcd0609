//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，并用环境变量覆盖上游凭证

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::models::Holding;

/// 上游凭证环境变量
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";
/// 上游地址环境变量
pub const BASE_URL_ENV: &str = "FINNHUB_BASE_URL";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
    /// 允许的跨域来源
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

/// 上游行情 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API Key（为空则所有行情请求返回 500）
    #[serde(default)]
    pub api_key: Option<String>,
    /// 上游基础地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 单次请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 整批请求的截止时间（秒）
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_secs: u64,
    /// 汇率获取失败时使用的 USD→NZD 兜底汇率
    #[serde(default = "default_fallback_rate")]
    pub fallback_usd_to_nzd: f64,
    /// 单次请求允许的最大代码数
    #[serde(default = "default_max_symbols")]
    pub max_symbols: usize,
}

/// 轮询客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// 中继服务地址
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// 刷新间隔（秒）
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// 关注的代码
    #[serde(default)]
    pub symbols: Vec<String>,
    /// 持仓
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 上游配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 轮询客户端配置
    #[serde(default)]
    pub poller: PollerConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_cors_origin() -> String { "*".to_string() }
fn default_base_url() -> String { "https://finnhub.io/api/v1/".to_string() }
fn default_timeout() -> u64 { 10 }
fn default_connect_timeout() -> u64 { 5 }
fn default_batch_timeout() -> u64 { 20 }
fn default_fallback_rate() -> f64 { crate::models::FALLBACK_USD_TO_NZD }
fn default_max_symbols() -> usize { 50 }
fn default_relay_url() -> String { "http://127.0.0.1:8080/api/v1/stock-prices".to_string() }
fn default_refresh_interval() -> u64 { 5 * 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            cors_origin: default_cors_origin(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            batch_timeout_secs: default_batch_timeout(),
            fallback_usd_to_nzd: default_fallback_rate(),
            max_symbols: default_max_symbols(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            refresh_interval_secs: default_refresh_interval(),
            symbols: Vec::new(),
            holdings: Vec::new(),
        }
    }
}

impl UpstreamConfig {
    /// 返回非空的 API Key
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl PollerConfig {
    /// 需要轮询的全部代码：symbols 与持仓代码合并去重
    pub fn watched_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        let candidates = self
            .symbols
            .iter()
            .chain(self.holdings.iter().map(|h| &h.symbol));
        for symbol in candidates {
            if !symbols.contains(symbol) {
                symbols.push(symbol.clone());
            }
        }
        symbols
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        let mut config = None;
        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(loaded) => {
                        log::info!("从 {} 加载配置成功", path);
                        config = Some(loaded);
                        break;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            log::info!("使用默认配置");
            Self::default()
        });
        config.apply_env(|name| env::var(name).ok());
        config
    }

    /// 用环境变量覆盖配置项
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            self.upstream.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.upstream.base_url = url;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: AppConfig = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.upstream.fallback_usd_to_nzd, 1.70);
        assert_eq!(config.upstream.max_symbols, 50);
        assert_eq!(config.poller.refresh_interval_secs, 300);
        assert!(config.upstream.credential().is_none());
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_env_overrides_credential() {
        let mut config = AppConfig::default();
        config.apply_env(|name| match name {
            API_KEY_ENV => Some("secret".to_string()),
            _ => None,
        });

        assert_eq!(config.upstream.credential(), Some("secret"));
        assert_eq!(config.upstream.base_url, "https://finnhub.io/api/v1/");
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let mut config = AppConfig::default();
        config.upstream.api_key = Some("   ".to_string());
        assert!(config.upstream.credential().is_none());
    }

    #[test]
    fn test_watched_symbols_merges_holdings() {
        let config: AppConfig = serde_json::from_str(
            r#"{"poller": {
                "symbols": ["AAPL", "AMD"],
                "holdings": [{"symbol": "AAPL", "shares": 15}, {"symbol": "NVDA", "shares": 8}]
            }}"#,
        )
        .unwrap();

        assert_eq!(config.poller.watched_symbols(), vec!["AAPL", "AMD", "NVDA"]);
    }
}
