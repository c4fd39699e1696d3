//! Pluggable mastery scorers.
//!
//! Every variant answers the same question, "how much should this learner work
//! on this skill right now", through one `score` contract. Only the
//! modified-Elo variant carries state forward through `update`.

pub mod bkt;
pub mod elo;
pub mod irt;
pub mod modified_elo;
pub mod ranking;
pub mod simple;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{DependencyGraph, GraphIndex};
use crate::profile::LearnerProfile;
use crate::types::{AbilityState, Skill};

pub use bkt::BktScorer;
pub use elo::EloScorer;
pub use irt::{IrtItem, IrtScorer};
pub use modified_elo::ModifiedEloScorer;
pub use ranking::{rank_skills, RankOptions, RankedSkill};
pub use simple::SimpleScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Simple,
    Irt,
    Elo,
    Bkt,
    ModifiedElo,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Simple,
        StrategyKind::Irt,
        StrategyKind::Elo,
        StrategyKind::Bkt,
        StrategyKind::ModifiedElo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Irt => "irt",
            Self::Elo => "elo",
            Self::Bkt => "bkt",
            Self::ModifiedElo => "modified-elo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "irt" => Some(Self::Irt),
            "elo" => Some(Self::Elo),
            "bkt" => Some(Self::Bkt),
            "modified-elo" | "modified_elo" | "modifiedelo" => Some(Self::ModifiedElo),
            _ => None,
        }
    }
}

/// Everything a scorer may read about the learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerModel {
    #[serde(default)]
    pub abilities: AbilityState,
    #[serde(default)]
    pub profile: LearnerProfile,
    /// BKT "probability known" per skill.
    #[serde(default)]
    pub knowledge: HashMap<String, f64>,
}

impl LearnerModel {
    pub fn new(abilities: AbilityState) -> Self {
        Self {
            abilities,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub graph: &'a DependencyGraph,
    pub index: &'a GraphIndex<'a>,
    pub learner: &'a LearnerModel,
    pub skill: &'a Skill,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub mastery: f64,
    pub score: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_skill_id: Option<String>,
}

impl ScoreResult {
    pub(crate) fn new(mastery: f64, score: f64, reason: impl Into<String>) -> Self {
        Self {
            mastery,
            score,
            reason: reason.into(),
            probability: None,
            focus_skill_id: None,
        }
    }

    pub(crate) fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub correct: bool,
}

#[derive(Debug, Clone)]
pub enum ScoringStrategy {
    Simple(SimpleScorer),
    Irt(IrtScorer),
    Elo(EloScorer),
    Bkt(BktScorer),
    ModifiedElo(ModifiedEloScorer),
}

impl ScoringStrategy {
    pub fn from_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Simple => Self::Simple(SimpleScorer),
            StrategyKind::Irt => Self::Irt(IrtScorer::default()),
            StrategyKind::Elo => Self::Elo(EloScorer::default()),
            StrategyKind::Bkt => Self::Bkt(BktScorer::default()),
            StrategyKind::ModifiedElo => Self::ModifiedElo(ModifiedEloScorer::default()),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Simple(_) => StrategyKind::Simple,
            Self::Irt(_) => StrategyKind::Irt,
            Self::Elo(_) => StrategyKind::Elo,
            Self::Bkt(_) => StrategyKind::Bkt,
            Self::ModifiedElo(_) => StrategyKind::ModifiedElo,
        }
    }

    pub fn score(&self, ctx: &ScoringContext<'_>) -> ScoreResult {
        match self {
            Self::Simple(s) => s.score(ctx),
            Self::Irt(s) => s.score(ctx),
            Self::Elo(s) => s.score(ctx),
            Self::Bkt(s) => s.score(ctx),
            Self::ModifiedElo(s) => s.score(ctx),
        }
    }

    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::ModifiedElo(_))
    }

    /// Returns the updated learner for stateful variants, `None` otherwise.
    pub fn update(
        &self,
        ctx: &ScoringContext<'_>,
        observation: &Observation,
        result: &ScoreResult,
    ) -> Result<Option<LearnerModel>> {
        match self {
            Self::Elo(s) => {
                s.update(ctx, observation, result);
                Ok(None)
            }
            Self::ModifiedElo(s) => s.update(ctx, observation, result).map(Some),
            Self::Simple(_) | Self::Irt(_) | Self::Bkt(_) => Ok(None),
        }
    }
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        Self::Simple(SimpleScorer)
    }
}

/// Mastery read straight from the skill-level ability map.
pub(crate) fn stored_mastery(ctx: &ScoringContext<'_>) -> f64 {
    ctx.learner
        .abilities
        .theta(crate::types::Level::Skill, &ctx.skill.id)
}
