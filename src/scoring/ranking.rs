use std::collections::HashMap;

use serde::Serialize;

use super::{LearnerModel, ScoreResult, ScoringContext, ScoringStrategy};
use crate::graph::DependencyGraph;

#[derive(Debug, Clone, PartialEq)]
pub struct RankOptions {
    pub limit: usize,
    /// A skill is blocked when any known prerequisite scores a mastery below
    /// this value under the same strategy.
    pub block_threshold: f64,
    pub default_weight: f64,
    pub weights: HashMap<String, f64>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            block_threshold: 0.5,
            default_weight: 1.0,
            weights: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSkill {
    pub skill_id: String,
    pub label: String,
    #[serde(flatten)]
    pub result: ScoreResult,
}

/// Scores every skill, drops the blocked ones and returns the top `limit` by
/// score. Equal scores keep declaration order.
pub fn rank_skills(
    graph: &DependencyGraph,
    learner: &LearnerModel,
    strategy: &ScoringStrategy,
    options: &RankOptions,
) -> Vec<RankedSkill> {
    let index = graph.index();

    let scored: Vec<ScoreResult> = graph
        .skills()
        .iter()
        .map(|skill| {
            strategy.score(&ScoringContext {
                graph,
                index: &index,
                learner,
                skill,
                weight: options
                    .weights
                    .get(&skill.id)
                    .copied()
                    .unwrap_or(options.default_weight),
            })
        })
        .collect();

    let mastery: HashMap<&str, f64> = graph
        .skills()
        .iter()
        .zip(&scored)
        .map(|(skill, result)| (skill.id.as_str(), result.mastery))
        .collect();

    let mut ranked: Vec<RankedSkill> = graph
        .skills()
        .iter()
        .zip(scored)
        .filter(|(skill, _)| {
            let blocked = skill
                .prerequisites
                .iter()
                .filter_map(|id| mastery.get(id.as_str()))
                .any(|&m| m < options.block_threshold);
            if blocked {
                tracing::trace!(skill_id = %skill.id, "skill blocked by prerequisite");
            }
            !blocked
        })
        .map(|(skill, result)| RankedSkill {
            skill_id: skill.id.clone(),
            label: skill.label.clone(),
            result,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.result
            .score
            .partial_cmp(&a.result.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(options.limit);

    tracing::debug!(
        strategy = strategy.kind().as_str(),
        returned = ranked.len(),
        "ranked skills"
    );
    ranked
}
