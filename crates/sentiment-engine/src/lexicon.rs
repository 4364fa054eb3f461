use std::collections::HashSet;

use stability_core::{PolarityScorer, PolarityScores};

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "profit", "growth", "beat",
    "upgrade", "outperform", "strong", "positive", "rise", "increase",
    "breakthrough", "innovation", "success", "exceed", "momentum",
    "buy", "recommend", "optimistic", "record", "advance", "boost",
    "recovery", "rebound", "expansion", "robust", "accelerating",
    "upside", "raised", "upgraded", "outpacing", "tailwind", "soar",
    "jump", "upbeat", "stable", "eases", "easing", "improves",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "fall", "plunge", "crash", "miss",
    "downgrade", "underperform", "weak", "negative", "drop", "decrease",
    "concern", "risk", "fail", "disappoint", "slump", "sell",
    "warning", "pessimistic", "retreat", "fear", "trouble", "headwind",
    "lawsuit", "investigation", "default", "bankruptcy", "recession",
    "layoff", "downside", "overvalued", "bubble", "lowered", "crisis",
    "deficit", "slowdown", "turmoil", "volatile", "downturn",
];

// Apostrophes are stripped during cleaning, so contractions appear bare
const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "dont", "doesnt", "didnt", "isnt", "arent",
    "wasnt", "werent", "wont", "wouldnt", "couldnt", "shouldnt",
    "hardly", "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

/// Word-list polarity scorer. A hit within NEGATION_WINDOW tokens of a
/// negation word flips its sign. The raw hit balance is squashed into
/// [-1, 1] with the usual x / sqrt(x^2 + 15) curve.
pub struct LexiconScorer {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityScorer for LexiconScorer {
    fn score(&self, text: &str) -> PolarityScores {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();

        if words.is_empty() {
            return PolarityScores::neutral();
        }

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut balance: f64 = 0.0;
        let mut positive_hits = 0usize;
        let mut negative_hits = 0usize;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive.contains(word);
            let is_negative = self.negative.contains(word);

            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&pos| pos < i && (i - pos) <= NEGATION_WINDOW);

            let effectively_positive = is_positive != negated;
            if effectively_positive {
                balance += 1.0;
                positive_hits += 1;
            } else {
                balance -= 1.0;
                negative_hits += 1;
            }
        }

        let compound = balance / (balance * balance + 15.0).sqrt();
        let total = words.len() as f64;
        let positive = positive_hits as f64 / total;
        let negative = negative_hits as f64 / total;

        PolarityScores {
            compound,
            positive,
            negative,
            neutral: (1.0 - positive - negative).max(0.0),
        }
    }
}
