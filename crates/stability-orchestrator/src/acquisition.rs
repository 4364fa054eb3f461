use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use stability_core::{InstrumentQuote, InstrumentSpec, MarketSnapshot, OhlcBar, QuoteFeed};

use crate::sample;

/// Fan out one fetch per instrument through a bounded pool, apply the
/// one-hop fallback symbol, and assemble whatever succeeded. Every
/// requested instrument appears in the result, failed ones as `None`.
pub async fn acquire(
    feed: Arc<dyn QuoteFeed>,
    instruments: &[InstrumentSpec],
    period: &str,
    fetch_timeout: Duration,
    pool_cap: usize,
) -> MarketSnapshot {
    let mut quotes: BTreeMap<String, Option<InstrumentQuote>> = instruments
        .iter()
        .map(|spec| (spec.id.clone(), None))
        .collect();

    let pool = pool_cap.min(instruments.len()).max(1);
    let semaphore = Arc::new(Semaphore::new(pool));
    let mut tasks: JoinSet<(String, Option<InstrumentQuote>)> = JoinSet::new();

    for spec in instruments {
        let feed = Arc::clone(&feed);
        let semaphore = Arc::clone(&semaphore);
        let spec = spec.clone();
        let period = period.to_string();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let bars = fetch_with_fallback(feed.as_ref(), &spec, &period, fetch_timeout).await;
            let quote = bars.map(|b| quote_from_bars(&spec.id, &b));
            (spec.id, quote)
        });
    }

    // Join-all barrier: per-task timeouts are the only cancellation
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, quote)) => {
                quotes.insert(id, quote);
            }
            Err(e) => tracing::warn!("Fetch task panicked: {}", e),
        }
    }

    let succeeded = quotes.values().filter(|q| q.is_some()).count();
    let total = instruments.len();

    if succeeded == 0 {
        tracing::warn!("All {} instrument fetches failed, serving sample data", total);
        return sample::sample_snapshot(instruments);
    }

    MarketSnapshot {
        quotes,
        fetched_at: Utc::now(),
        is_live: true,
        note: Some(format!("{}/{} assets successful", succeeded, total)),
    }
}

/// Primary symbol first, then exactly one fallback attempt. A timeout
/// counts as a failure; neither leg is retried.
async fn fetch_with_fallback(
    feed: &dyn QuoteFeed,
    spec: &InstrumentSpec,
    period: &str,
    fetch_timeout: Duration,
) -> Option<Vec<OhlcBar>> {
    match tokio::time::timeout(fetch_timeout, feed.get_history(&spec.symbol, period)).await {
        Ok(Ok(bars)) if !bars.is_empty() => return Some(bars),
        Ok(Ok(_)) => tracing::warn!("{}: primary {} returned no data", spec.id, spec.symbol),
        Ok(Err(e)) => tracing::warn!("{}: primary {} failed: {}", spec.id, spec.symbol, e),
        Err(_) => tracing::warn!("{}: primary {} timed out", spec.id, spec.symbol),
    }

    match tokio::time::timeout(fetch_timeout, feed.get_history(&spec.fallback, period)).await {
        Ok(Ok(bars)) if !bars.is_empty() => Some(bars),
        Ok(Ok(_)) | Ok(Err(_)) => {
            tracing::warn!("{}: fallback {} also failed", spec.id, spec.fallback);
            None
        }
        Err(_) => {
            tracing::warn!("{}: fallback {} timed out", spec.id, spec.fallback);
            None
        }
    }
}

/// Derive the presented quote from the raw window. Computed at
/// snapshot-build time, so caching the raw window and reformatting is
/// equivalent to caching this result.
pub fn quote_from_bars(instrument: &str, bars: &[OhlcBar]) -> InstrumentQuote {
    let last = &bars[bars.len() - 1];
    let change = last.close - last.open;
    let change_percent = if last.open != 0.0 {
        change / last.open * 100.0
    } else {
        0.0
    };

    InstrumentQuote {
        instrument: instrument.to_string(),
        current: last.close,
        open: last.open,
        high: last.high,
        low: last.low,
        volume: last.volume as i64,
        change,
        change_percent,
        volatility: window_volatility(bars),
    }
}

/// Stddev of simple returns over the window, as a percentage
fn window_volatility(bars: &[OhlcBar]) -> f64 {
    let returns: Vec<f64> = bars
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>()
        / (returns.len() - 1) as f64;

    (var.sqrt() * 100.0 * 100.0).round() / 100.0
}
