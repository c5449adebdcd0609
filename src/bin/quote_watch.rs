//! 行情轮询命令行工具
//!
//! 按配置中的 poller 段定时调用中继服务，打印每次状态变化；
//! 配置了持仓时同时输出纽元估值。Ctrl-C 退出。

use std::time::Duration;

use env_logger::Env;

use quote_relay::client::{QuotePoller, QuoteState, RelayClient};
use quote_relay::config::AppConfig;
use quote_relay::models::{Holding, QuoteBatch};
use quote_relay::services::portfolio::value_portfolio;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();
    let symbols = config.poller.watched_symbols();
    if symbols.is_empty() {
        anyhow::bail!("poller.symbols 和 poller.holdings 均为空");
    }

    let source = RelayClient::new(config.poller.relay_url.clone());
    let interval = Duration::from_secs(config.poller.refresh_interval_secs);
    log::info!("轮询 {} ，间隔 {:?}: {:?}", config.poller.relay_url, interval, symbols);

    let poller = QuotePoller::spawn(source, symbols, interval);
    let mut updates = poller.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                report(&state, &config.poller.holdings, config.upstream.fallback_usd_to_nzd);
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("收到退出信号");
                break;
            }
        }
    }

    poller.shutdown();
    Ok(())
}

fn report(state: &QuoteState, holdings: &[Holding], fallback_rate: f64) {
    if state.loading {
        return;
    }
    if let Some(error) = &state.error {
        log::warn!("最近一次刷新失败（显示旧数据）: {}", error);
    }

    let mut symbols: Vec<_> = state.quotes.keys().collect();
    symbols.sort();
    for symbol in symbols {
        let quote = &state.quotes[symbol];
        match (quote.price(), quote.change_percent) {
            (Some(price), Some(pct)) => log::info!("{:<8} {:>10.2} USD {:+.2}%", symbol, price, pct),
            (Some(price), None) => log::info!("{:<8} {:>10.2} USD", symbol, price),
            _ => log::info!("{:<8} 获取失败", symbol),
        }
    }

    if holdings.is_empty() || state.last_updated.is_none() {
        return;
    }

    let batch = QuoteBatch {
        quotes: state.quotes.values().cloned().collect(),
        usd_to_nzd: Some(state.usd_to_nzd),
        is_fallback_rate: state.is_fallback_rate,
    };
    let summary = value_portfolio(holdings, &batch, fallback_rate);
    log::info!(
        "组合市值 {:.2} NZD，当日 {:+.2} NZD ({:+.2}%)，汇率 {}{}",
        summary.total_value_nzd,
        summary.daily_change_nzd,
        summary.daily_change_percent,
        summary.usd_to_nzd,
        if summary.is_fallback_rate { "（兜底）" } else { "" },
    );
    if !summary.unpriced.is_empty() {
        log::warn!("无法估值: {:?}", summary.unpriced);
    }
}
