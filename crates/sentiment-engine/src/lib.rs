use stability_core::{
    AggregateSentiment, PipelineConfig, PolarityScorer, SentimentLabel, SentimentVerdict,
};

pub mod lexicon;
pub use lexicon::LexiconScorer;

/// Batch sentiment analyzer. Cleaning and aggregation live here; the
/// polarity scoring itself sits behind the `PolarityScorer` seam.
pub struct SentimentEngine {
    scorer: Box<dyn PolarityScorer>,
}

impl SentimentEngine {
    pub fn new() -> Self {
        Self {
            scorer: Box::new(LexiconScorer::new()),
        }
    }

    pub fn with_scorer(scorer: Box<dyn PolarityScorer>) -> Self {
        Self { scorer }
    }

    /// Strip URL-ish tokens and everything non-alphanumeric, collapse
    /// whitespace.
    pub fn clean_text(text: &str) -> String {
        let tokens = text.split_whitespace().filter(|t| {
            let lower = t.to_lowercase();
            !(lower.starts_with("http://")
                || lower.starts_with("https://")
                || lower.starts_with("www."))
        });

        let stripped: String = tokens
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn analyze_single(&self, text: &str) -> SentimentVerdict {
        let cleaned = Self::clean_text(text);

        if cleaned.is_empty() {
            return SentimentVerdict {
                text: text.to_string(),
                label: SentimentLabel::Neutral,
                compound: 0.0,
                positive: 0.0,
                neutral: 1.0,
                negative: 0.0,
            };
        }

        let scores = self.scorer.score(&cleaned);

        SentimentVerdict {
            text: text.to_string(),
            label: SentimentLabel::from_compound(scores.compound),
            compound: scores.compound,
            positive: scores.positive,
            neutral: scores.neutral,
            negative: scores.negative,
        }
    }

    pub fn analyze_batch(&self, texts: &[String]) -> Vec<SentimentVerdict> {
        tracing::debug!("Scoring {} texts", texts.len());
        texts.iter().map(|t| self.analyze_single(t)).collect()
    }

    /// Reduce a batch of verdicts. The overall label thresholds the
    /// mean compound the same way per-text labels are derived.
    pub fn aggregate(&self, verdicts: &[SentimentVerdict]) -> AggregateSentiment {
        if verdicts.is_empty() {
            return AggregateSentiment::empty();
        }

        let total = verdicts.len();
        let avg_compound = verdicts.iter().map(|v| v.compound).sum::<f64>() / total as f64;

        let count_of = |label: SentimentLabel| verdicts.iter().filter(|v| v.label == label).count();

        AggregateSentiment {
            avg_compound,
            positive_count: count_of(SentimentLabel::Positive),
            neutral_count: count_of(SentimentLabel::Neutral),
            negative_count: count_of(SentimentLabel::Negative),
            overall_label: SentimentLabel::from_compound(avg_compound),
            total_texts: total,
        }
    }
}

impl Default for SentimentEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an aggregate onto [0, 1]: compound recentred to [0, 1] carries
/// most of the weight, the label distribution nudges it either way.
pub fn normalize_sentiment_score(aggregate: &AggregateSentiment, config: &PipelineConfig) -> f64 {
    let compound_score = (aggregate.avg_compound + 1.0) / 2.0;

    let total = aggregate.total_texts.max(1) as f64;
    let positive_ratio = aggregate.positive_count as f64 / total;
    let negative_ratio = aggregate.negative_count as f64 / total;

    let score = config.sentiment_compound_weight * compound_score
        + config.sentiment_positive_weight * positive_ratio
        - config.sentiment_negative_weight * negative_ratio;

    score.clamp(0.0, 1.0)
}
