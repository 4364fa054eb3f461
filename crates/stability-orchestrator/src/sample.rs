use chrono::Utc;
use std::collections::BTreeMap;

use stability_core::{InstrumentQuote, InstrumentSpec, MarketSnapshot};

/// Hand-authored plausible values served when every live fetch fails.
/// Downstream consumers cannot tolerate hard failures, so availability
/// wins over correctness; `is_live = false` marks the data as canned.
pub fn sample_snapshot(instruments: &[InstrumentSpec]) -> MarketSnapshot {
    let quotes: BTreeMap<String, Option<InstrumentQuote>> = instruments
        .iter()
        .map(|spec| (spec.id.clone(), sample_quote(&spec.id)))
        .collect();

    MarketSnapshot {
        quotes,
        fetched_at: Utc::now(),
        is_live: false,
        note: Some("Sample data - live quote feed unavailable".to_string()),
    }
}

fn sample_quote(id: &str) -> Option<InstrumentQuote> {
    let (current, open, high, low, volume, volatility) = match id {
        "nifty" => (22_000.50, 21_950.25, 22_100.75, 21_900.00, 150_000_000, 1.2),
        "sensex" => (73_000.25, 72_800.50, 73_200.00, 72_700.00, 50_000_000, 1.1),
        "banknifty" => (47_500.75, 47_350.00, 47_620.50, 47_300.25, 180_000_000, 1.4),
        "usdinr" => (83.12, 83.05, 83.20, 82.98, 0, 0.4),
        "gold" => (2_375.40, 2_368.00, 2_382.60, 2_361.10, 185_000, 0.9),
        "crude" => (78.65, 79.10, 79.45, 78.20, 320_000, 2.1),
        _ => return None,
    };

    let change = current - open;
    Some(InstrumentQuote {
        instrument: id.to_string(),
        current,
        open,
        high,
        low,
        volume,
        change,
        change_percent: (change / open * 10_000.0).round() / 100.0,
        volatility,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stability_core::PipelineConfig;

    #[test]
    fn sample_covers_every_default_instrument() {
        let config = PipelineConfig::default();
        let snapshot = sample_snapshot(&config.instruments);

        assert!(!snapshot.is_live);
        assert!(snapshot.note.is_some());
        assert_eq!(snapshot.quotes.len(), config.instruments.len());
        assert_eq!(snapshot.present_count(), config.instruments.len());
    }

    #[test]
    fn sample_values_are_deterministic() {
        let config = PipelineConfig::default();
        let a = sample_snapshot(&config.instruments);
        let b = sample_snapshot(&config.instruments);
        assert_eq!(a.quotes, b.quotes);

        let nifty = a.quotes["nifty"].as_ref().unwrap();
        assert_eq!(nifty.current, 22_000.50);
        assert!((nifty.change - 50.25).abs() < 1e-9);
        assert!((nifty.change_percent - 0.23).abs() < 1e-9);
    }

    #[test]
    fn unknown_instrument_stays_absent_in_sample() {
        let specs = vec![InstrumentSpec::new("custom", "X", "Y")];
        let snapshot = sample_snapshot(&specs);
        assert_eq!(snapshot.quotes.len(), 1);
        assert!(snapshot.quotes["custom"].is_none());
    }
}
