use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Skill,
    Outcome,
    Competency,
    Domain,
    Subject,
    Grade,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Skill,
        Level::Outcome,
        Level::Competency,
        Level::Domain,
        Level::Subject,
        Level::Grade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Outcome => "outcome",
            Self::Competency => "competency",
            Self::Domain => "domain",
            Self::Subject => "subject",
            Self::Grade => "grade",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "skill" => Some(Self::Skill),
            "outcome" => Some(Self::Outcome),
            "competency" => Some(Self::Competency),
            "domain" => Some(Self::Domain),
            "subject" => Some(Self::Subject),
            "grade" => Some(Self::Grade),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coefficient per hierarchy level. Values need not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelVector {
    pub skill: f64,
    pub outcome: f64,
    pub competency: f64,
    pub domain: f64,
    pub subject: f64,
    pub grade: f64,
}

pub type BlendWeights = LevelVector;
pub type LearningRates = LevelVector;

impl LevelVector {
    pub fn get(&self, level: Level) -> f64 {
        match level {
            Level::Skill => self.skill,
            Level::Outcome => self.outcome,
            Level::Competency => self.competency,
            Level::Domain => self.domain,
            Level::Subject => self.subject,
            Level::Grade => self.grade,
        }
    }

    pub fn set(&mut self, level: Level, value: f64) {
        match level {
            Level::Skill => self.skill = value,
            Level::Outcome => self.outcome = value,
            Level::Competency => self.competency = value,
            Level::Domain => self.domain = value,
            Level::Subject => self.subject = value,
            Level::Grade => self.grade = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, f64)> + '_ {
        Level::ALL.iter().map(move |&level| (level, self.get(level)))
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        for (level, value) in self.iter() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite {
                    field: format!("{name}.{level}"),
                    value,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub label: String,
    /// IRT-like b-parameter, on the same scale as the blended theta.
    pub difficulty: f64,
    pub outcome_id: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub id: String,
    pub label: String,
    pub competency_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competency {
    pub id: String,
    pub label: String,
    pub domain_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub label: String,
    pub subject_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub label: String,
}

/// Per-level theta maps. A missing id reads as theta = 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityState {
    #[serde(default)]
    pub skill: HashMap<String, f64>,
    #[serde(default)]
    pub outcome: HashMap<String, f64>,
    #[serde(default)]
    pub competency: HashMap<String, f64>,
    #[serde(default)]
    pub domain: HashMap<String, f64>,
    #[serde(default)]
    pub subject: HashMap<String, f64>,
    #[serde(default)]
    pub grade: HashMap<String, f64>,
}

impl AbilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, level: Level) -> &HashMap<String, f64> {
        match level {
            Level::Skill => &self.skill,
            Level::Outcome => &self.outcome,
            Level::Competency => &self.competency,
            Level::Domain => &self.domain,
            Level::Subject => &self.subject,
            Level::Grade => &self.grade,
        }
    }

    pub fn map_mut(&mut self, level: Level) -> &mut HashMap<String, f64> {
        match level {
            Level::Skill => &mut self.skill,
            Level::Outcome => &mut self.outcome,
            Level::Competency => &mut self.competency,
            Level::Domain => &mut self.domain,
            Level::Subject => &mut self.subject,
            Level::Grade => &mut self.grade,
        }
    }

    pub fn theta(&self, level: Level, id: &str) -> f64 {
        self.map(level).get(id).copied().unwrap_or(0.0)
    }

    pub fn set_theta(&mut self, level: Level, id: impl Into<String>, theta: f64) {
        self.map_mut(level).insert(id.into(), theta);
    }

    pub fn with_theta(mut self, level: Level, id: impl Into<String>, theta: f64) -> Self {
        self.set_theta(level, id, theta);
        self
    }

    pub fn is_empty(&self) -> bool {
        Level::ALL.iter().all(|&level| self.map(level).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_theta_defaults_to_zero() {
        let state = AbilityState::new().with_theta(Level::Skill, "a", 1.5);
        assert_eq!(state.theta(Level::Skill, "a"), 1.5);
        assert_eq!(state.theta(Level::Skill, "b"), 0.0);
        assert_eq!(state.theta(Level::Outcome, "a"), 0.0);
    }

    #[test]
    fn test_level_parse_roundtrip() {
        for level in Level::ALL {
            assert_eq!(Level::parse(level.as_str()), Some(level));
        }
        assert_eq!(Level::parse(" Outcome "), Some(Level::Outcome));
        assert_eq!(Level::parse("cluster"), None);
    }

    #[test]
    fn test_level_vector_rejects_non_finite() {
        let mut weights = LevelVector::default();
        weights.set(Level::Domain, f64::NAN);
        let err = weights.validate("blendWeights").unwrap_err();
        assert!(err.to_string().contains("blendWeights.domain"));
    }
}
