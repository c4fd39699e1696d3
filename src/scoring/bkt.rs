use serde::{Deserialize, Serialize};

use super::{ScoreResult, ScoringContext};

/// Bayesian Knowledge Tracing, read-only: predicts P(correct) from the stored
/// probability that the skill is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BktScorer {
    pub prior: f64,
    pub guess: f64,
    pub slip: f64,
}

impl Default for BktScorer {
    fn default() -> Self {
        Self {
            prior: 0.4,
            guess: 0.2,
            slip: 0.1,
        }
    }
}

impl BktScorer {
    pub fn predict(&self, known: f64) -> f64 {
        known * (1.0 - self.slip) + (1.0 - known) * self.guess
    }

    pub fn score(&self, ctx: &ScoringContext<'_>) -> ScoreResult {
        let known = ctx
            .learner
            .knowledge
            .get(&ctx.skill.id)
            .copied()
            .unwrap_or(self.prior);
        let mastery = self.predict(known);

        ScoreResult::new(
            mastery,
            (1.0 - mastery) * ctx.weight,
            format!("bkt p(known)={known:.2}"),
        )
        .with_probability(mastery)
    }
}
