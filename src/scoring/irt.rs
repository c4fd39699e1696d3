//! Three-parameter logistic IRT.
//!
//! `P(correct) = c + (1 − c) · logistic(a · (θ − b))`, with θ taken as the
//! log-odds of the stored skill mastery.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{stored_mastery, ScoreResult, ScoringContext};
use crate::probability::{logistic, logit};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrtItem {
    /// Discrimination (a).
    pub a: f64,
    /// Difficulty (b).
    pub b: f64,
    /// Guessing floor (c).
    pub c: f64,
}

impl Default for IrtItem {
    fn default() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.2 }
    }
}

impl IrtItem {
    pub fn probability(&self, theta: f64) -> f64 {
        self.c + (1.0 - self.c) * logistic(self.a * (theta - self.b))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrtScorer {
    pub defaults: IrtItem,
    /// Calibrated parameters per skill id; anything absent uses `defaults`.
    pub items: HashMap<String, IrtItem>,
}

impl IrtScorer {
    pub fn with_item(mut self, skill_id: impl Into<String>, item: IrtItem) -> Self {
        self.items.insert(skill_id.into(), item);
        self
    }

    pub fn item(&self, skill_id: &str) -> IrtItem {
        self.items.get(skill_id).copied().unwrap_or(self.defaults)
    }

    pub fn score(&self, ctx: &ScoringContext<'_>) -> ScoreResult {
        let stored = stored_mastery(ctx);
        let theta = logit(stored);
        let item = self.item(&ctx.skill.id);
        let probability = item.probability(theta);

        ScoreResult::new(
            probability,
            (1.0 - probability) * ctx.weight,
            format!("irt p={probability:.2} (theta {theta:.2}, b {:.2})", item.b),
        )
        .with_probability(probability)
    }
}
