use stability_core::{
    PipelineConfig, StabilityBreakdown, StabilityCategory, StabilityComponents, StabilityResult,
};

/// Weighted combination of the three [0, 1] sub-scores into the final
/// [0, 100] indicator. Inputs are clamped here regardless of what the
/// upstream normalizers promised.
pub struct StabilityCalculator {
    market_weight: f64,
    sentiment_weight: f64,
    economic_weight: f64,
    stable_threshold: f64,
    moderate_threshold: f64,
}

impl StabilityCalculator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            market_weight: config.market_weight,
            sentiment_weight: config.sentiment_weight,
            economic_weight: config.economic_weight,
            stable_threshold: config.stable_threshold,
            moderate_threshold: config.moderate_threshold,
        }
    }

    pub fn calculate(
        &self,
        market_score: f64,
        sentiment_score: f64,
        economic_score: Option<f64>,
    ) -> StabilityResult {
        let market = market_score.clamp(0.0, 1.0);
        let sentiment = sentiment_score.clamp(0.0, 1.0);
        let economic = economic_score.unwrap_or(0.5).clamp(0.0, 1.0);

        let weighted = market * self.market_weight
            + sentiment * self.sentiment_weight
            + economic * self.economic_weight;

        let stability_score = round2(weighted * 100.0);
        let category = self.categorize(stability_score);

        StabilityResult {
            stability_score,
            category,
            interpretation: category.interpretation().to_string(),
            breakdown: StabilityBreakdown {
                market_contribution: round2(market * self.market_weight * 100.0),
                sentiment_contribution: round2(sentiment * self.sentiment_weight * 100.0),
                economic_contribution: round2(economic * self.economic_weight * 100.0),
            },
            components: StabilityComponents {
                market_trend: round2(market * 100.0),
                sentiment: round2(sentiment * 100.0),
                economic_indicators: round2(economic * 100.0),
            },
        }
    }

    fn categorize(&self, score: f64) -> StabilityCategory {
        if score >= self.stable_threshold {
            StabilityCategory::Stable
        } else if score >= self.moderate_threshold {
            StabilityCategory::Moderate
        } else {
            StabilityCategory::Unstable
        }
    }
}

/// Normalize inflation and repo rate into a [0, 1] score around their
/// optimum levels (4% inflation, 5.5% repo).
pub fn economic_indicators_score(inflation_rate: Option<f64>, repo_rate: Option<f64>) -> f64 {
    let inflation = inflation_rate.unwrap_or(4.5);
    let repo = repo_rate.unwrap_or(6.5);

    let inflation_score = if (2.0..=6.0).contains(&inflation) {
        1.0 - (inflation - 4.0).abs() / 2.0
    } else {
        (1.0 - (inflation - 4.0).abs() / 4.0).max(0.0)
    };

    let repo_score = if (4.0..=7.0).contains(&repo) {
        1.0 - (repo - 5.5).abs() / 1.5
    } else {
        (1.0 - (repo - 5.5).abs() / 3.0).max(0.0)
    };

    round3((inflation_score + repo_score) / 2.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> StabilityCalculator {
        StabilityCalculator::new(&PipelineConfig::default())
    }

    #[test]
    fn all_ones_is_perfectly_stable() {
        let result = calculator().calculate(1.0, 1.0, Some(1.0));
        assert_eq!(result.stability_score, 100.00);
        assert_eq!(result.category, StabilityCategory::Stable);
    }

    #[test]
    fn all_zeros_is_unstable() {
        let result = calculator().calculate(0.0, 0.0, Some(0.0));
        assert_eq!(result.stability_score, 0.00);
        assert_eq!(result.category, StabilityCategory::Unstable);
    }

    #[test]
    fn category_boundaries_are_inclusive() {
        let calc = calculator();
        assert_eq!(calc.categorize(71.00), StabilityCategory::Stable);
        assert_eq!(calc.categorize(70.99), StabilityCategory::Moderate);
        assert_eq!(calc.categorize(41.00), StabilityCategory::Moderate);
        assert_eq!(calc.categorize(40.99), StabilityCategory::Unstable);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let result = calculator().calculate(5.0, -3.0, Some(2.0));
        // market -> 1.0, sentiment -> 0.0, economic -> 1.0
        assert_eq!(result.stability_score, 70.00);
        assert_eq!(result.components.market_trend, 100.00);
        assert_eq!(result.components.sentiment, 0.00);
        assert_eq!(result.components.economic_indicators, 100.00);
    }

    #[test]
    fn missing_economic_score_defaults_to_neutral() {
        let result = calculator().calculate(0.5, 0.5, None);
        assert_eq!(result.components.economic_indicators, 50.00);
        assert_eq!(result.stability_score, 50.00);
        assert_eq!(result.category, StabilityCategory::Moderate);
    }

    #[test]
    fn breakdown_sums_to_the_final_score() {
        let result = calculator().calculate(0.8, 0.6, Some(0.4));
        let sum = result.breakdown.market_contribution
            + result.breakdown.sentiment_contribution
            + result.breakdown.economic_contribution;
        assert!((sum - result.stability_score).abs() < 0.02);
    }

    #[test]
    fn interpretation_matches_category() {
        let result = calculator().calculate(0.9, 0.9, Some(0.9));
        assert_eq!(result.category, StabilityCategory::Stable);
        assert_eq!(
            result.interpretation,
            StabilityCategory::Stable.interpretation()
        );
    }

    #[test]
    fn indicator_defaults_score_known_value() {
        // inflation 4.5 -> 0.75, repo 6.5 -> 1 - 1/1.5 = 0.333..
        let score = economic_indicators_score(None, None);
        assert!((score - 0.542).abs() < 1e-9);
    }

    #[test]
    fn optimal_indicators_score_one() {
        assert_eq!(economic_indicators_score(Some(4.0), Some(5.5)), 1.0);
    }

    #[test]
    fn extreme_indicators_floor_at_zero() {
        assert_eq!(economic_indicators_score(Some(25.0), Some(30.0)), 0.0);
    }
}
