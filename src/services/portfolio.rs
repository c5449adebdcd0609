//! 持仓估值
//!
//! 统一采用"先换算后求和"：每个持仓先按汇率折算为纽元，再累加总额

use std::collections::HashMap;

use crate::models::{Holding, HoldingValuation, PortfolioSummary, Quote, QuoteBatch};

/// 按整批行情计算组合估值
pub fn value_portfolio(holdings: &[Holding], batch: &QuoteBatch, fallback_rate: f64) -> PortfolioSummary {
    let quotes: HashMap<&str, &Quote> = batch
        .quotes
        .iter()
        .map(|q| (q.symbol.as_str(), q))
        .collect();
    let (usd_to_nzd, is_fallback_rate) = match batch.usd_to_nzd {
        Some(rate) => (rate, batch.is_fallback_rate),
        None => (fallback_rate, true),
    };

    let mut valuations = Vec::with_capacity(holdings.len());
    let mut unpriced = Vec::new();
    let mut total_value_nzd = 0.0;
    let mut daily_change_nzd = 0.0;

    for holding in holdings {
        let quote = quotes.get(holding.symbol.as_str()).copied();
        let valuation = value_holding(holding, quote, usd_to_nzd);

        match (valuation.value_nzd, valuation.daily_change_nzd) {
            (Some(value), change) => {
                total_value_nzd += value;
                daily_change_nzd += change.unwrap_or(0.0);
            }
            (None, _) => unpriced.push(holding.symbol.clone()),
        }
        valuations.push(valuation);
    }

    let base = total_value_nzd - daily_change_nzd;
    let daily_change_percent = if base > 0.0 {
        daily_change_nzd / base * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        holdings: valuations,
        total_value_nzd,
        daily_change_nzd,
        daily_change_percent,
        usd_to_nzd,
        is_fallback_rate,
        unpriced,
    }
}

fn value_holding(holding: &Holding, quote: Option<&Quote>, usd_to_nzd: f64) -> HoldingValuation {
    let price_usd = quote.and_then(Quote::price);
    let value_usd = price_usd.map(|price| price * holding.shares);
    let daily_change_nzd = price_usd
        .and(quote.and_then(|q| q.change))
        .map(|change| change * holding.shares * usd_to_nzd);

    HoldingValuation {
        symbol: holding.symbol.clone(),
        name: holding.name.clone(),
        shares: holding.shares,
        price_usd,
        change_percent: quote.filter(|q| !q.errored).and_then(|q| q.change_percent),
        value_usd,
        value_nzd: value_usd.map(|value| value * usd_to_nzd),
        daily_change_nzd,
    }
}
