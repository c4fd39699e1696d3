use serde::{Deserialize, Serialize};

use super::{stored_mastery, Observation, ScoreResult, ScoringContext};

pub const DEFAULT_ELO: f64 = 1200.0;

pub fn expected_score(learner_elo: f64, item_elo: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((item_elo - learner_elo) / 400.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EloScorer {
    pub base_rating: f64,
    /// Rating points spanned by mastery 0 → 1.
    pub mastery_span: f64,
    /// Rating points per unit of skill difficulty.
    pub difficulty_step: f64,
}

impl Default for EloScorer {
    fn default() -> Self {
        Self {
            base_rating: DEFAULT_ELO,
            mastery_span: 800.0,
            difficulty_step: 200.0,
        }
    }
}

impl EloScorer {
    pub fn learner_rating(&self, mastery: f64) -> f64 {
        self.base_rating + (mastery - 0.5) * self.mastery_span
    }

    pub fn item_rating(&self, difficulty: f64) -> f64 {
        self.base_rating + difficulty * self.difficulty_step
    }

    pub fn score(&self, ctx: &ScoringContext<'_>) -> ScoreResult {
        let learner = self.learner_rating(stored_mastery(ctx));
        let item = self.item_rating(ctx.skill.difficulty);
        let expected = expected_score(learner, item);

        ScoreResult::new(
            expected,
            (1.0 - expected) * ctx.weight,
            format!("elo {learner:.0} vs {item:.0}"),
        )
        .with_probability(expected)
    }

    /// Intentionally a no-op: ratings are derived from stored mastery on every
    /// call, and persisting rating changes is left to the caller.
    pub fn update(&self, _ctx: &ScoringContext<'_>, _observation: &Observation, _result: &ScoreResult) {}
}
