//! Hierarchical Elo with ZPD targeting.
//!
//! Probability comes from a blend of skill, outcome, competency and grade
//! ability. A skill whose prerequisites have not all earned a "passport" is not
//! scored on its own; the scorer looks back through the prerequisite graph for
//! something practicable inside the ZPD instead.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{LearnerModel, Observation, ScoreResult, ScoringContext};
use crate::config::ZpdRange;
use crate::error::{EngineError, Result};
use crate::probability::ProbabilityModel;
use crate::types::{Level, LevelVector, Skill};

const FOCUS_DISCOUNT: f64 = 0.9;
const BELOW_ZPD_FACTOR: f64 = 0.6;
const ABOVE_ZPD_FACTOR: f64 = 0.4;
const MASTERED_THETA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedEloScorer {
    pub weights: LevelVector,
    pub learning_rates: LevelVector,
    pub zpd: ZpdRange,
    pub too_hard_threshold: f64,
    pub passport_threshold: f64,
    pub scale: f64,
}

impl Default for ModifiedEloScorer {
    fn default() -> Self {
        Self {
            weights: LevelVector {
                skill: 0.45,
                outcome: 0.35,
                competency: 0.15,
                grade: 0.05,
                ..LevelVector::default()
            },
            learning_rates: LevelVector {
                skill: 0.3,
                outcome: 0.2,
                competency: 0.1,
                grade: 0.05,
                ..LevelVector::default()
            },
            zpd: ZpdRange { min: 0.5, max: 0.8 },
            too_hard_threshold: 0.4,
            passport_threshold: 0.8,
            scale: 1.0,
        }
    }
}

impl ModifiedEloScorer {
    fn model<'a>(&'a self, learner: &'a LearnerModel) -> ProbabilityModel<'a> {
        ProbabilityModel::new(&learner.abilities, &self.weights, self.scale)
    }

    fn probability_of(&self, ctx: &ScoringContext<'_>, skill: &Skill) -> f64 {
        self.model(ctx.learner)
            .try_probability(ctx.graph, &skill.id)
            .unwrap_or(0.0)
    }

    /// 1.0 at the centre of the band, 0.5 at its edges, falling to 0 further out.
    pub fn zpd_closeness(&self, probability: f64) -> f64 {
        let center = (self.zpd.min + self.zpd.max) / 2.0;
        let half = (self.zpd.max - self.zpd.min) / 2.0;
        if half <= 0.0 {
            return if (probability - center).abs() < f64::EPSILON { 1.0 } else { 0.0 };
        }
        (1.0 - 0.5 * (probability - center).abs() / half).clamp(0.0, 1.0)
    }

    fn has_passport(&self, probability: f64) -> bool {
        probability >= self.passport_threshold
    }

    /// Breadth-first back through prerequisites, starting from the unmet ones,
    /// for the first unmet skill inside the ZPD.
    fn find_focus<'a>(
        &self,
        ctx: &ScoringContext<'a>,
        unmet: &[(&'a Skill, f64)],
    ) -> Option<(&'a Skill, f64)> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(&ctx.skill.id);
        let mut queue: VecDeque<(&'a Skill, f64)> = VecDeque::new();
        for &(skill, p) in unmet {
            if seen.insert(&skill.id) {
                queue.push_back((skill, p));
            }
        }

        while let Some((skill, p)) = queue.pop_front() {
            if self.zpd.contains(p) {
                return Some((skill, p));
            }
            for prereq_id in &skill.prerequisites {
                let Some(prereq) = ctx.index.skill_by_id.get(prereq_id.as_str()).copied() else {
                    continue;
                };
                if !seen.insert(&prereq.id) {
                    continue;
                }
                let pp = self.probability_of(ctx, prereq);
                if !self.has_passport(pp) {
                    queue.push_back((prereq, pp));
                }
            }
        }
        None
    }

    pub fn score(&self, ctx: &ScoringContext<'_>) -> ScoreResult {
        let own = self.probability_of(ctx, ctx.skill);

        let unmet: Vec<(&Skill, f64)> = ctx
            .skill
            .prerequisites
            .iter()
            .filter_map(|id| ctx.index.skill_by_id.get(id.as_str()).copied())
            .map(|prereq| (prereq, self.probability_of(ctx, prereq)))
            .filter(|&(_, p)| !self.has_passport(p))
            .collect();

        if let Some(&(first, first_p)) = unmet.first() {
            return match self.find_focus(ctx, &unmet) {
                Some((focus, p)) => ScoreResult {
                    mastery: own,
                    score: self.zpd_closeness(p) * ctx.weight * FOCUS_DISCOUNT,
                    reason: format!("prerequisite {} is in the zpd", focus.id),
                    probability: Some(p),
                    focus_skill_id: Some(focus.id.clone()),
                },
                None => ScoreResult {
                    mastery: own,
                    score: 0.0,
                    reason: format!("blocked by unmet prerequisite {}", first.id),
                    probability: Some(first_p),
                    focus_skill_id: Some(first.id.clone()),
                },
            };
        }

        let (score, reason) = if self.zpd.contains(own) {
            (ctx.weight * self.zpd_closeness(own), "in zpd".to_string())
        } else if own < self.zpd.min {
            let distance = self.zpd.min - own;
            let score = ctx.weight * (1.0 - distance).max(0.0) * BELOW_ZPD_FACTOR;
            let reason = if own < self.too_hard_threshold {
                format!("too hard: p={own:.2} below {:.2}", self.too_hard_threshold)
            } else {
                "below zpd".to_string()
            };
            (score, reason)
        } else {
            let distance = own - self.zpd.max;
            (
                ctx.weight * (1.0 - distance).max(0.0) * ABOVE_ZPD_FACTOR,
                "above zpd".to_string(),
            )
        };

        ScoreResult::new(own, score, reason).with_probability(own)
    }

    /// One gradient step per rated level, written to both the ability maps and
    /// the profile records. Once the skill theta reaches the passport threshold
    /// it is stamped as fully mastered at theta 1.
    pub fn update(
        &self,
        ctx: &ScoringContext<'_>,
        observation: &Observation,
        result: &ScoreResult,
    ) -> Result<LearnerModel> {
        let lineage = ctx
            .graph
            .lineage(&ctx.skill.id)
            .ok_or_else(|| EngineError::UnknownSkill(ctx.skill.id.clone()))?;

        let before = self.probability_of(ctx, ctx.skill);
        let actual = if observation.correct { 1.0 } else { 0.0 };
        let error = actual - before;
        let now = chrono::Utc::now().timestamp_millis();

        let mut next = ctx.learner.clone();
        for (level, id) in lineage.iter() {
            let rate = self.learning_rates.get(level);
            if rate == 0.0 {
                continue;
            }
            let theta = next.abilities.theta(level, id) + rate * error;
            next.abilities.set_theta(level, id, theta);
            next.profile.upsert(level, id, theta, observation.correct, now);
        }

        let skill_theta = next.abilities.theta(Level::Skill, &ctx.skill.id);
        if skill_theta >= self.passport_threshold {
            next.abilities.set_theta(Level::Skill, &ctx.skill.id, MASTERED_THETA);
            next.profile
                .mark_mastered(Level::Skill, &ctx.skill.id, MASTERED_THETA, now);
        }

        tracing::debug!(
            skill_id = %ctx.skill.id,
            reason = %result.reason,
            before,
            error,
            theta = next.abilities.theta(Level::Skill, &ctx.skill.id),
            "modified elo update"
        );
        Ok(next)
    }
}
