//! Whole-graph view for a presentation layer: every skill classified against
//! the current band plus the recommendation for one target.

use serde::{Deserialize, Serialize};

use crate::config::EngineConstants;
use crate::engine::{recommend_next_skill, RecommendOptions, RecommendationContext};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::probability::ProbabilityModel;
use crate::types::AbilityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillClass {
    Mastered,
    InZpd,
    Approaching,
    TooHard,
}

impl SkillClass {
    pub fn classify(probability: f64, constants: &EngineConstants) -> Self {
        if probability >= constants.mastered_threshold {
            Self::Mastered
        } else if constants.zpd_range.contains(probability) {
            Self::InZpd
        } else if probability < constants.zpd_range.min {
            Self::TooHard
        } else {
            Self::Approaching
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillNode {
    pub id: String,
    pub label: String,
    pub difficulty: f64,
    pub probability: f64,
    pub class: SkillClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCounts {
    pub mastered: usize,
    pub in_zpd: usize,
    pub approaching: usize,
    pub too_hard: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<SkillNode>,
    pub edges: Vec<SkillEdge>,
    pub counts: ClassCounts,
    pub recommendation: RecommendationContext,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&SkillNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// `target` defaults to the graph's declared start skill.
pub fn build_graph_snapshot(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    constants: &EngineConstants,
    target: Option<&str>,
) -> Result<GraphSnapshot> {
    let model = ProbabilityModel::from_constants(abilities, constants);
    let mut counts = ClassCounts::default();
    let mut nodes = Vec::with_capacity(graph.skills().len());
    let mut edges = Vec::new();

    for skill in graph.skills() {
        let probability = model.probability(graph, &skill.id)?;
        let class = SkillClass::classify(probability, constants);
        match class {
            SkillClass::Mastered => counts.mastered += 1,
            SkillClass::InZpd => counts.in_zpd += 1,
            SkillClass::Approaching => counts.approaching += 1,
            SkillClass::TooHard => counts.too_hard += 1,
        }
        nodes.push(SkillNode {
            id: skill.id.clone(),
            label: skill.label.clone(),
            difficulty: skill.difficulty,
            probability,
            class,
        });
        for prereq in &skill.prerequisites {
            edges.push(SkillEdge {
                from: prereq.clone(),
                to: skill.id.clone(),
            });
        }
    }

    let target = target.unwrap_or_else(|| graph.start_skill_id());
    let recommendation =
        recommend_next_skill(graph, abilities, target, constants, &RecommendOptions::default())?;

    Ok(GraphSnapshot {
        nodes,
        edges,
        counts,
        recommendation,
    })
}
