use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },
    #[error("zpd range invalid: min {min} must be <= max {max}, both within [0, 1]")]
    InvalidZpd { min: f64, max: f64 },
    #[error("mastered threshold {0} is out of valid range (0, 1]")]
    InvalidThreshold(f64),
    #[error("scale {0} must be greater than zero")]
    InvalidScale(f64),
    #[error("unknown constants category: {0}")]
    UnknownCategory(String),
    #[error("unknown key {key} for category {category}")]
    UnknownKey { category: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    #[error("line {line}: expected {expected} columns, got {actual}")]
    MissingColumns {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: column {column} is empty")]
    EmptyField { line: usize, column: &'static str },
    #[error("line {line}: {column} is not a finite number: {value:?}")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("skill {0} has a non-finite difficulty")]
    NonFiniteDifficulty(String),
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{kind} {id} references unknown {parent_kind} {parent_id}")]
    UnknownParent {
        kind: &'static str,
        id: String,
        parent_kind: &'static str,
        parent_id: String,
    },
    #[error("{kind} {id} is listed under {first:?} and {second:?}")]
    ConflictingParent {
        kind: &'static str,
        id: String,
        first: String,
        second: String,
    },
    #[error("prerequisite row references unknown skill: {0}")]
    UnknownPrerequisite(String),
    #[error("unknown ability type: {0}")]
    UnknownAbilityType(String),
    #[error("start skill {0} is not part of the graph")]
    UnknownStartSkill(String),
    #[error("{0} is empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown skill: {0}")]
    UnknownSkill(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
