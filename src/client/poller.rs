//! 行情轮询器
//!
//! 启动时立即获取一次，之后按固定间隔刷新。状态保存在 `watch` 通道中，
//! 调用方可以读取快照或订阅变化。
//!
//! 每次请求分配递增的代数，只有最新一代的响应会被应用，
//! 较早发出但较晚返回的响应直接丢弃。
//! 轮询器被丢弃时定时任务（连同其进行中的请求）一并取消。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::models::{Quote, QuoteBatch, FALLBACK_USD_TO_NZD};

use super::source::QuoteSource;

/// 默认刷新间隔：5 分钟
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// 轮询器对外暴露的只读状态
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteState {
    /// 代码 → 行情，每次成功后整体替换
    pub quotes: HashMap<String, Quote>,
    /// 是否有请求在进行中
    pub loading: bool,
    /// 最近一次失败的错误信息，成功后清空
    pub error: Option<String>,
    /// 最近一次成功的完成时间
    pub last_updated: Option<DateTime<Utc>>,
    pub usd_to_nzd: f64,
    pub is_fallback_rate: bool,
}

impl Default for QuoteState {
    fn default() -> Self {
        Self {
            quotes: HashMap::new(),
            loading: true,
            error: None,
            last_updated: None,
            usd_to_nzd: FALLBACK_USD_TO_NZD,
            is_fallback_rate: true,
        }
    }
}

impl QuoteState {
    fn apply(&mut self, batch: QuoteBatch) {
        self.quotes = batch
            .quotes
            .into_iter()
            .map(|q| (q.symbol.clone(), q))
            .collect();
        self.last_updated = Some(Utc::now());
        self.error = None;
        if let Some(rate) = batch.usd_to_nzd {
            self.usd_to_nzd = rate;
            self.is_fallback_rate = batch.is_fallback_rate;
        }
    }
}

struct Shared<S> {
    source: S,
    symbols: Vec<String>,
    state: watch::Sender<QuoteState>,
    /// 已发出的最新代数
    issued: AtomicU64,
    in_flight: AtomicUsize,
}

impl<S: QuoteSource> Shared<S> {
    async fn fetch(&self) {
        if self.symbols.is_empty() {
            self.state.send_modify(|s| s.loading = false);
            return;
        }

        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::enter(self);
        log::debug!("第 {} 次获取行情: {:?}", generation, self.symbols);

        let result = self.source.fetch(&self.symbols).await;

        if self.issued.load(Ordering::SeqCst) != generation {
            log::debug!("丢弃第 {} 次请求的过期响应", generation);
            return;
        }

        match result {
            Ok(batch) => {
                log::info!("行情已更新: {} 个代码", batch.quotes.len());
                self.state.send_modify(|s| s.apply(batch));
            }
            Err(e) => {
                log::warn!("获取行情失败: {}", e);
                self.state.send_modify(|s| s.error = Some(e.to_string()));
            }
        }
    }
}

/// 进行中计数，离开作用域（包括被取消）时自动减一并刷新 loading
struct InFlight<'a, S> {
    shared: &'a Shared<S>,
}

impl<'a, S> InFlight<'a, S> {
    fn enter(shared: &'a Shared<S>) -> Self {
        shared.state.send_modify(|s| {
            shared.in_flight.fetch_add(1, Ordering::SeqCst);
            s.loading = true;
        });
        Self { shared }
    }
}

impl<S> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        let in_flight = &self.shared.in_flight;
        self.shared.state.send_modify(|s| {
            s.loading = in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
        });
    }
}

/// 行情轮询器
pub struct QuotePoller<S> {
    shared: Arc<Shared<S>>,
    timer: JoinHandle<()>,
}

impl<S: QuoteSource> QuotePoller<S> {
    /// 启动轮询，需要在 tokio 运行时中调用
    pub fn spawn(source: S, symbols: Vec<String>, refresh_interval: Duration) -> Self {
        let (state, _) = watch::channel(QuoteState::default());
        let shared = Arc::new(Shared {
            source,
            symbols,
            state,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        });

        // interval 不接受 0
        let period = refresh_interval.max(Duration::from_millis(1));
        let timer = tokio::spawn(run_timer(shared.clone(), period));

        Self { shared, timer }
    }

    /// 当前状态快照
    pub fn state(&self) -> QuoteState {
        self.shared.state.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.shared.state.subscribe()
    }

    pub fn symbols(&self) -> &[String] {
        &self.shared.symbols
    }

    /// 手动刷新，与定时刷新互不等待
    pub async fn refetch(&self) {
        self.shared.fetch().await;
    }

    /// 停止轮询并取消进行中的定时请求
    ///
    /// 直接丢弃轮询器效果相同，`Drop` 中也会取消定时任务
    pub fn shutdown(self) {
        self.timer.abort();
    }
}

impl<S> Drop for QuotePoller<S> {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

async fn run_timer<S: QuoteSource>(shared: Arc<Shared<S>>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        shared.fetch().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Step = (Duration, Result<QuoteBatch, String>);

    /// 按顺序返回预设响应
    struct ScriptedSource {
        script: Mutex<VecDeque<Step>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                script: Mutex::new(steps.into()),
                calls: calls.clone(),
            };
            (source, calls)
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn fetch(&self, _symbols: &[String]) -> anyhow::Result<QuoteBatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                script.pop_front()
            };
            let (delay, result) =
                next.unwrap_or((Duration::ZERO, Err("没有更多预设响应".to_string())));
            tokio::time::sleep(delay).await;
            result.map_err(|e| anyhow!(e))
        }
    }

    fn batch(price: f64, rate: Option<f64>) -> QuoteBatch {
        QuoteBatch {
            quotes: vec![Quote {
                current_price: Some(price),
                change_percent: Some(1.5),
                errored: false,
                ..Quote::errored("AAPL")
            }],
            usd_to_nzd: rate,
            is_fallback_rate: false,
        }
    }

    fn ok(delay_ms: u64, price: f64) -> Step {
        (Duration::from_millis(delay_ms), Ok(batch(price, Some(1.62))))
    }

    fn symbols() -> Vec<String> {
        vec!["AAPL".to_string()]
    }

    const HOUR: Duration = Duration::from_secs(3600);

    async fn settled<S: QuoteSource>(poller: &QuotePoller<S>) -> QuoteState {
        let mut rx = poller.subscribe();
        let state = rx
            .wait_for(|s| s.last_updated.is_some() && !s.loading)
            .await
            .unwrap()
            .clone();
        state
    }

    fn price(state: &QuoteState) -> Option<f64> {
        state.quotes.get("AAPL").and_then(|q| q.current_price)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_populates_state() {
        let (source, calls) = ScriptedSource::new(vec![ok(0, 150.0)]);
        let poller = QuotePoller::spawn(source, symbols(), HOUR);

        let state = settled(&poller).await;
        assert_eq!(price(&state), Some(150.0));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.usd_to_nzd, 1.62);
        assert!(!state.is_fallback_rate);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_quotes() {
        let (source, _) = ScriptedSource::new(vec![
            ok(0, 150.0),
            (Duration::ZERO, Err("network down".to_string())),
        ]);
        let poller = QuotePoller::spawn(source, symbols(), HOUR);
        let before = settled(&poller).await;

        poller.refetch().await;

        let state = poller.state();
        assert_eq!(state.error.as_deref(), Some("network down"));
        assert_eq!(state.quotes, before.quotes);
        assert_eq!(state.last_updated, before.last_updated);
        assert_eq!(state.usd_to_nzd, 1.62);
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_error() {
        let (source, _) = ScriptedSource::new(vec![
            (Duration::ZERO, Err("network down".to_string())),
            ok(0, 151.0),
        ]);
        let poller = QuotePoller::spawn(source, symbols(), HOUR);
        let mut rx = poller.subscribe();
        rx.wait_for(|s| s.error.is_some() && !s.loading).await.unwrap();
        assert!(poller.state().quotes.is_empty());

        poller.refetch().await;

        let state = poller.state();
        assert!(state.error.is_none());
        assert_eq!(price(&state), Some(151.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let (source, calls) = ScriptedSource::new(vec![
            ok(0, 150.0),
            // 先发出、后返回
            ok(200, 100.0),
            ok(10, 200.0),
        ]);
        let poller = QuotePoller::spawn(source, symbols(), HOUR);
        settled(&poller).await;

        tokio::join!(poller.refetch(), poller.refetch());

        let state = poller.state();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(price(&state), Some(200.0));
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_rate_keeps_previous_rate() {
        let (source, _) = ScriptedSource::new(vec![
            ok(0, 150.0),
            (Duration::ZERO, Ok(batch(152.0, None))),
        ]);
        let poller = QuotePoller::spawn(source, symbols(), HOUR);
        settled(&poller).await;

        poller.refetch().await;

        let state = poller.state();
        assert_eq!(price(&state), Some(152.0));
        assert_eq!(state.usd_to_nzd, 1.62);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_refreshes() {
        let steps = (0..5).map(|i| ok(0, 150.0 + i as f64)).collect();
        let (source, calls) = ScriptedSource::new(steps);
        let poller = QuotePoller::spawn(source, symbols(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(150)).await;

        // t = 0, 60, 120
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(price(&poller.state()), Some(152.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let steps = (0..5).map(|_| ok(0, 150.0)).collect();
        let (source, calls) = ScriptedSource::new(steps);
        let poller = QuotePoller::spawn(source, symbols(), Duration::from_secs(60));
        settled(&poller).await;

        poller.shutdown();
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_in_flight_fetch() {
        let (source, calls) = ScriptedSource::new(vec![ok(10_000, 150.0)]);
        let poller = QuotePoller::spawn(source, symbols(), HOUR);
        let rx = poller.subscribe();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        drop(poller);
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert!(rx.borrow().last_updated.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_fetch() {
        let (source, calls) = ScriptedSource::new(vec![ok(10_000, 150.0), ok(0, 151.0)]);
        let poller = QuotePoller::spawn(source, symbols(), Duration::from_secs(60));
        let rx = poller.subscribe();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.borrow().loading);
        poller.shutdown();
        tokio::time::sleep(Duration::from_secs(600)).await;

        let state = rx.borrow().clone();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(state.last_updated.is_none());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_symbols_never_fetch() {
        let (source, calls) = ScriptedSource::new(vec![]);
        let poller = QuotePoller::spawn(source, Vec::new(), HOUR);
        let mut rx = poller.subscribe();

        rx.wait_for(|s| !s.loading).await.unwrap();
        poller.refetch().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(poller.state().quotes.is_empty());
    }
}
