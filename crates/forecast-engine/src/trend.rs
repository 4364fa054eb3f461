use chrono::{Duration, NaiveDate};
use statrs::distribution::{ContinuousCDF, Normal};

use stability_core::{FittedTrendModel, ForecastPoint, StabilityError, TrendModel};

const EPSILON: f64 = 1e-6;

/// Ordinary least squares on the observation index, with residual-based
/// 95% prediction intervals. Stands in for the heavier time-series
/// capability behind the `TrendModel` seam.
pub struct LinearTrendModel;

impl LinearTrendModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinearTrendModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendModel for LinearTrendModel {
    fn fit(
        &self,
        series: &[(NaiveDate, f64)],
    ) -> Result<Box<dyn FittedTrendModel>, StabilityError> {
        let n = series.len();
        if n < 3 {
            return Err(StabilityError::InsufficientHistory(format!(
                "{} observations, need at least 3 to fit a trend",
                n
            )));
        }

        if series.iter().any(|(_, y)| !y.is_finite()) {
            return Err(StabilityError::InvalidInput(
                "non-finite value in training series".to_string(),
            ));
        }

        let nf = n as f64;
        let mean_t = (nf - 1.0) / 2.0;
        let mean_y = series.iter().map(|(_, y)| y).sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (i, (_, y)) in series.iter().enumerate() {
            let dt = i as f64 - mean_t;
            sxx += dt * dt;
            sxy += dt * (y - mean_y);
        }

        if sxx < EPSILON {
            return Err(StabilityError::InvalidInput(
                "degenerate time axis in training series".to_string(),
            ));
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_t;

        let sse: f64 = series
            .iter()
            .enumerate()
            .map(|(i, (_, y))| {
                let fitted = intercept + slope * i as f64;
                (y - fitted) * (y - fitted)
            })
            .sum();
        let resid_std = (sse / (nf - 2.0)).sqrt();

        let z = Normal::new(0.0, 1.0)
            .map_err(|e| StabilityError::InvalidInput(e.to_string()))?
            .inverse_cdf(0.975);

        let anchor = series[n - 1].0;

        Ok(Box::new(FittedLinearTrend {
            intercept,
            slope,
            resid_std,
            n: nf,
            mean_t,
            sxx,
            z,
            anchor,
        }))
    }
}

struct FittedLinearTrend {
    intercept: f64,
    slope: f64,
    resid_std: f64,
    n: f64,
    mean_t: f64,
    sxx: f64,
    z: f64,
    anchor: NaiveDate,
}

impl FittedTrendModel for FittedLinearTrend {
    fn predict(&self, horizon: usize) -> Vec<ForecastPoint> {
        (1..=horizon)
            .map(|h| {
                let t = self.n - 1.0 + h as f64;
                let predicted = self.intercept + self.slope * t;

                // Interval widens with distance from the sample mean
                let dt = t - self.mean_t;
                let se = self.resid_std * (1.0 + 1.0 / self.n + dt * dt / self.sxx).sqrt();
                let upper = predicted + self.z * se;
                let lower = predicted - self.z * se;

                let confidence =
                    (1.0 - (upper - lower) / (predicted.abs() + EPSILON)).clamp(0.0, 1.0);

                ForecastPoint {
                    date: self.anchor + Duration::days(h as i64),
                    predicted,
                    upper,
                    lower,
                    confidence,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn fits_a_clean_linear_series() {
        let model = LinearTrendModel::new();
        let data = series(&(0..40).map(|i| 100.0 + 2.0 * i as f64).collect::<Vec<_>>());
        let fitted = model.fit(&data).unwrap();

        let points = fitted.predict(5);
        assert_eq!(points.len(), 5);
        // Next value continues the 2.0/day slope
        assert!((points[0].predicted - 180.0).abs() < 1e-6);
        // Noiseless series: tight intervals, near-full confidence
        assert!(points[0].confidence > 0.99);
        // Dates ascend one day at a time from the anchor
        assert!(points.windows(2).all(|w| w[1].date > w[0].date));
    }

    #[test]
    fn rejects_tiny_series() {
        let model = LinearTrendModel::new();
        let data = series(&[1.0, 2.0]);
        assert!(matches!(
            model.fit(&data),
            Err(StabilityError::InsufficientHistory(_))
        ));
    }

    #[test]
    fn rejects_non_finite_values() {
        let model = LinearTrendModel::new();
        let data = series(&[1.0, f64::NAN, 3.0, 4.0]);
        assert!(matches!(
            model.fit(&data),
            Err(StabilityError::InvalidInput(_))
        ));
    }

    #[test]
    fn noisy_series_widens_intervals_with_distance() {
        let model = LinearTrendModel::new();
        let values: Vec<f64> = (0..60)
            .map(|i| 500.0 + i as f64 + if i % 2 == 0 { 5.0 } else { -5.0 })
            .collect();
        let fitted = model.fit(&series(&values)).unwrap();

        let points = fitted.predict(10);
        let first_width = points[0].upper - points[0].lower;
        let last_width = points[9].upper - points[9].lower;
        assert!(last_width > first_width);
        assert!(points.iter().all(|p| p.lower < p.predicted && p.predicted < p.upper));
        assert!(points.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
    }
}
