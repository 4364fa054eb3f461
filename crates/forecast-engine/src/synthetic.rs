use chrono::{Duration, NaiveDate};
use rand::{thread_rng, Rng};

use stability_core::{ForecastPoint, PipelineConfig};

/// Bounded random walk with a slight upward drift bias: each step takes
/// a uniform perturbation from the configured range, bounds sit at a
/// fixed percentage of the point, and confidence is a constant so
/// consumers can tell the interval is synthetic, not empirical.
pub fn random_walk(
    last_value: f64,
    anchor: NaiveDate,
    horizon: usize,
    config: &PipelineConfig,
) -> Vec<ForecastPoint> {
    let mut rng = thread_rng();
    let mut value = last_value;

    (1..=horizon)
        .map(|h| {
            let step: f64 = rng.gen_range(config.synthetic_step_min..config.synthetic_step_max);
            value *= 1.0 + step;

            ForecastPoint {
                date: anchor + Duration::days(h as i64),
                predicted: value,
                upper: value * (1.0 + config.synthetic_bound_pct),
                lower: value * (1.0 - config.synthetic_bound_pct),
                confidence: config.synthetic_confidence,
            }
        })
        .collect()
}

/// Plausible daily history for when the quote feed cannot provide one in
/// time: a drifting walk around the configured base level.
pub fn sample_history(base_level: f64, days: usize) -> Vec<(NaiveDate, f64)> {
    let mut rng = thread_rng();
    let today = chrono::Utc::now().date_naive();
    let floor = base_level * 0.9;
    let mut value = base_level;

    (0..days)
        .map(|i| {
            let drift = i as f64 * 0.5;
            let noise: f64 = rng.gen_range(-1.0..1.0) * base_level * 0.002;
            value = (value + drift * 0.01 + noise).max(floor);
            (today - Duration::days((days - i) as i64), value)
        })
        .collect()
}
