use super::{stored_mastery, ScoreResult, ScoringContext};

/// `score = (1 − mastery) · weight`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimpleScorer;

impl SimpleScorer {
    pub fn score(&self, ctx: &ScoringContext<'_>) -> ScoreResult {
        let mastery = stored_mastery(ctx);
        let score = (1.0 - mastery) * ctx.weight;
        ScoreResult::new(mastery, score, format!("mastery {mastery:.2}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::LearnerModel;
    use crate::test_support::{graph, skill};
    use crate::types::{AbilityState, Level};

    #[test]
    fn test_missing_mastery_reads_zero() {
        let g = graph(vec![skill("a", 0.0, &[]), skill("b", 0.0, &[])], "a");
        let index = g.index();
        let learner = LearnerModel::new(AbilityState::new().with_theta(Level::Skill, "a", 0.75));

        let scored = |id: &str| {
            SimpleScorer.score(&ScoringContext {
                graph: &g,
                index: &index,
                learner: &learner,
                skill: g.skill(id).unwrap(),
                weight: 2.0,
            })
        };

        let a = scored("a");
        assert_eq!(a.mastery, 0.75);
        assert!((a.score - 0.5).abs() < 1e-12);
        let b = scored("b");
        assert_eq!(b.mastery, 0.0);
        assert_eq!(b.score, 2.0);
    }
}
