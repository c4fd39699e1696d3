//! Mastery probability.
//!
//! `p = logistic((Σ w_level · θ_level − difficulty) / scale)`, clamped so that it
//! never reaches exactly 0 or 1.

use crate::config::EngineConstants;
use crate::error::{EngineError, Result};
use crate::graph::{DependencyGraph, Lineage};
use crate::types::{AbilityState, BlendWeights, Skill};

pub const PROBABILITY_EPSILON: f64 = 1e-9;

pub fn logistic(x: f64) -> f64 {
    let p = 1.0 / (1.0 + (-x).exp());
    p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// Log-odds of `p`, with `p` pulled away from the endpoints first.
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-3, 1.0 - 1e-3);
    (p / (1.0 - p)).ln()
}

pub fn blend(abilities: &AbilityState, lineage: &Lineage, weights: &BlendWeights) -> f64 {
    lineage
        .iter()
        .map(|(level, id)| weights.get(level) * abilities.theta(level, id))
        .sum()
}

#[derive(Debug, Clone, Copy)]
pub struct ProbabilityModel<'a> {
    pub abilities: &'a AbilityState,
    pub weights: &'a BlendWeights,
    pub scale: f64,
}

impl<'a> ProbabilityModel<'a> {
    pub fn new(abilities: &'a AbilityState, weights: &'a BlendWeights, scale: f64) -> Self {
        Self {
            abilities,
            weights,
            scale,
        }
    }

    pub fn from_constants(abilities: &'a AbilityState, constants: &'a EngineConstants) -> Self {
        Self::new(abilities, &constants.blend_weights, constants.scale)
    }

    pub fn for_lineage(&self, skill: &Skill, lineage: &Lineage) -> f64 {
        let composite = blend(self.abilities, lineage, self.weights);
        logistic((composite - skill.difficulty) / self.scale)
    }

    /// `None` when the skill is not part of `graph`.
    pub fn try_probability(&self, graph: &DependencyGraph, skill_id: &str) -> Option<f64> {
        let skill = graph.skill(skill_id)?;
        let lineage = graph.lineage(skill_id)?;
        Some(self.for_lineage(skill, lineage))
    }

    pub fn probability(&self, graph: &DependencyGraph, skill_id: &str) -> Result<f64> {
        self.try_probability(graph, skill_id)
            .ok_or_else(|| EngineError::UnknownSkill(skill_id.to_string()))
    }
}

pub fn skill_probability(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    skill_id: &str,
    weights: &BlendWeights,
    scale: f64,
) -> Result<f64> {
    ProbabilityModel::new(abilities, weights, scale).probability(graph, skill_id)
}

pub fn get_skill_probability(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    skill_id: &str,
    constants: &EngineConstants,
) -> Result<f64> {
    ProbabilityModel::from_constants(abilities, constants).probability(graph, skill_id)
}
