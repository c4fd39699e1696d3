//! Adaptive-learning core.
//!
//! Given a prerequisite graph of skills and a learner's ability estimates at
//! every level of the curriculum hierarchy, the engine picks the next skill to
//! practise (favouring the ZPD band) and folds observed outcomes back into the
//! ability estimates. Everything here is a pure function over its inputs apart
//! from the process-wide [`ConstantsStore`].

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod graph;
pub mod logging;
pub mod probability;
pub mod profile;
pub mod scoring;
pub mod snapshot;
pub mod types;
pub mod update;

#[cfg(test)]
mod test_support;

pub use config::{
    core_constants, core_constants_store, reset_core_constants, update_core_constants,
    ConstantsStore, EngineConstants, ZpdRange,
};
pub use dataset::{
    abilities_from_rows, build_graph, AbilityRow, ConstantRow, GraphRow, PrerequisiteRow,
};
pub use engine::{
    recommend_next_skill, RecommendOptions, RecommendationContext, RecommendationStatus,
};
pub use error::{ConfigError, DatasetError, EngineError, Result};
pub use graph::{DependencyGraph, GraphIndex, Hierarchy, Lineage};
pub use probability::{get_skill_probability, logistic, skill_probability};
pub use profile::{LearnerProfile, ProfileRecord};
pub use scoring::{
    rank_skills, LearnerModel, Observation, RankOptions, RankedSkill, ScoreResult,
    ScoringContext, ScoringStrategy, StrategyKind,
};
pub use snapshot::{build_graph_snapshot, GraphSnapshot, SkillClass};
pub use types::{AbilityState, BlendWeights, LearningRates, Level, LevelVector, Skill};
pub use update::{
    update_abilities, update_abilities_batch, AbilityUpdate, BatchUpdate, OutcomeEvent, UpdateStep,
};
