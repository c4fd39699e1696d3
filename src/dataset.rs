//! Row shapes handed over by a loader, and their assembly into a graph,
//! an ability state or a constants batch.
//!
//! Rows arrive either already deserialized (serde, camelCase field names) or
//! as raw string fields with a 1-based line number for error messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::graph::{DependencyGraph, Hierarchy};
use crate::types::{AbilityState, Competency, Domain, Grade, Level, Outcome, Skill, Subject};

fn field<'a>(
    fields: &[&'a str],
    idx: usize,
    column: &'static str,
    line: usize,
) -> Result<&'a str, DatasetError> {
    let value = fields.get(idx).copied().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(DatasetError::EmptyField { line, column });
    }
    Ok(value)
}

fn number(raw: &str, column: &'static str, line: usize) -> Result<f64, DatasetError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DatasetError::InvalidNumber {
            line,
            column,
            value: raw.to_string(),
        }),
    }
}

fn require_columns(fields: &[&str], expected: usize, line: usize) -> Result<(), DatasetError> {
    if fields.len() < expected {
        return Err(DatasetError::MissingColumns {
            line,
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

/// One skill together with its full containing hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRow {
    pub subject_id: String,
    pub subject_label: String,
    pub domain_id: String,
    pub domain_label: String,
    pub competency_id: String,
    pub competency_label: String,
    pub outcome_id: String,
    pub outcome_label: String,
    pub skill_id: String,
    pub skill_label: String,
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_label: Option<String>,
}

impl GraphRow {
    pub const COLUMNS: usize = 11;

    /// Parses the eleven required columns plus optional trailing
    /// `gradeId, gradeLabel`.
    pub fn from_fields(fields: &[&str], line: usize) -> Result<Self, DatasetError> {
        require_columns(fields, Self::COLUMNS, line)?;
        let optional = |idx: usize| {
            fields
                .get(idx)
                .copied()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let grade_id = optional(11);
        let grade_label = optional(12).or_else(|| grade_id.clone());

        Ok(Self {
            subject_id: field(fields, 0, "subjectId", line)?.to_string(),
            subject_label: field(fields, 1, "subjectLabel", line)?.to_string(),
            domain_id: field(fields, 2, "domainId", line)?.to_string(),
            domain_label: field(fields, 3, "domainLabel", line)?.to_string(),
            competency_id: field(fields, 4, "competencyId", line)?.to_string(),
            competency_label: field(fields, 5, "competencyLabel", line)?.to_string(),
            outcome_id: field(fields, 6, "outcomeId", line)?.to_string(),
            outcome_label: field(fields, 7, "outcomeLabel", line)?.to_string(),
            skill_id: field(fields, 8, "skillId", line)?.to_string(),
            skill_label: field(fields, 9, "skillLabel", line)?.to_string(),
            difficulty: number(field(fields, 10, "difficulty", line)?, "difficulty", line)?,
            grade_id,
            grade_label,
        })
    }
}

/// `source_skill_id` is a prerequisite of `target_skill_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteRow {
    pub source_skill_id: String,
    pub target_skill_id: String,
}

impl PrerequisiteRow {
    pub fn from_fields(fields: &[&str], line: usize) -> Result<Self, DatasetError> {
        require_columns(fields, 2, line)?;
        Ok(Self {
            source_skill_id: field(fields, 0, "sourceSkillId", line)?.to_string(),
            target_skill_id: field(fields, 1, "targetSkillId", line)?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub ability: f64,
}

impl AbilityRow {
    /// An empty ability column reads as 0.
    pub fn from_fields(fields: &[&str], line: usize) -> Result<Self, DatasetError> {
        require_columns(fields, 2, line)?;
        let ability = match fields.get(2).copied().map(str::trim) {
            None | Some("") => 0.0,
            Some(raw) => number(raw, "ability", line)?,
        };
        Ok(Self {
            kind: field(fields, 0, "type", line)?.to_string(),
            id: field(fields, 1, "id", line)?.to_string(),
            ability,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantRow {
    pub category: String,
    pub key: String,
    pub value: f64,
}

impl ConstantRow {
    pub fn new(category: impl Into<String>, key: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            value,
        }
    }

    /// Single-valued categories (`masteredThreshold`, `scale`) may leave the
    /// key column empty.
    pub fn from_fields(fields: &[&str], line: usize) -> Result<Self, DatasetError> {
        require_columns(fields, 3, line)?;
        Ok(Self {
            category: field(fields, 0, "category", line)?.to_string(),
            key: fields.get(1).copied().map(str::trim).unwrap_or_default().to_string(),
            value: number(field(fields, 2, "value", line)?, "value", line)?,
        })
    }
}

/// Keeps the first occurrence of every id, in the order first seen. A repeat
/// must name the same parent as the first occurrence.
struct Dedup<T> {
    kind: &'static str,
    parents: HashMap<String, Option<String>>,
    items: Vec<T>,
}

impl<T> Dedup<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            parents: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn push(
        &mut self,
        id: &str,
        parent: Option<&str>,
        make: impl FnOnce() -> T,
    ) -> Result<(), DatasetError> {
        match self.parents.get(id) {
            Some(first) if first.as_deref() != parent => Err(DatasetError::ConflictingParent {
                kind: self.kind,
                id: id.to_string(),
                first: first.clone().unwrap_or_default(),
                second: parent.unwrap_or_default().to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.parents.insert(id.to_string(), parent.map(str::to_string));
                self.items.push(make());
                Ok(())
            }
        }
    }
}

/// Assembles a validated graph. Composition nodes repeated across rows are
/// collapsed, keeping the first row's label; a repeat naming a different parent
/// is fatal. So is a repeated skill id or a prerequisite row naming an unknown
/// skill. Without an
/// explicit `start_skill_id` the first skill row is the start.
pub fn build_graph(
    rows: &[GraphRow],
    prerequisite_rows: &[PrerequisiteRow],
    start_skill_id: Option<&str>,
) -> Result<DependencyGraph, DatasetError> {
    let first = rows.first().ok_or(DatasetError::Empty("graph rows"))?;

    let mut grades = Dedup::new("grade");
    let mut subjects = Dedup::new("subject");
    let mut domains = Dedup::new("domain");
    let mut competencies = Dedup::new("competency");
    let mut outcomes = Dedup::new("outcome");
    let mut skills: Vec<Skill> = Vec::with_capacity(rows.len());
    let mut skill_positions: HashMap<&str, usize> = HashMap::with_capacity(rows.len());

    for row in rows {
        if let Some(grade_id) = &row.grade_id {
            grades.push(grade_id, None, || Grade {
                id: grade_id.clone(),
                label: row.grade_label.clone().unwrap_or_else(|| grade_id.clone()),
            })?;
        }
        subjects.push(&row.subject_id, row.grade_id.as_deref(), || Subject {
            id: row.subject_id.clone(),
            label: row.subject_label.clone(),
            grade_id: row.grade_id.clone(),
        })?;
        domains.push(&row.domain_id, Some(row.subject_id.as_str()), || Domain {
            id: row.domain_id.clone(),
            label: row.domain_label.clone(),
            subject_id: row.subject_id.clone(),
        })?;
        competencies.push(&row.competency_id, Some(row.domain_id.as_str()), || Competency {
            id: row.competency_id.clone(),
            label: row.competency_label.clone(),
            domain_id: row.domain_id.clone(),
        })?;
        outcomes.push(&row.outcome_id, Some(row.competency_id.as_str()), || Outcome {
            id: row.outcome_id.clone(),
            label: row.outcome_label.clone(),
            competency_id: row.competency_id.clone(),
        })?;

        if skill_positions
            .insert(row.skill_id.as_str(), skills.len())
            .is_some()
        {
            return Err(DatasetError::DuplicateId {
                kind: "skill",
                id: row.skill_id.clone(),
            });
        }
        skills.push(Skill {
            id: row.skill_id.clone(),
            label: row.skill_label.clone(),
            difficulty: row.difficulty,
            outcome_id: row.outcome_id.clone(),
            prerequisites: Vec::new(),
        });
    }

    for row in prerequisite_rows {
        if !skill_positions.contains_key(row.source_skill_id.as_str()) {
            return Err(DatasetError::UnknownPrerequisite(row.source_skill_id.clone()));
        }
        let Some(&target) = skill_positions.get(row.target_skill_id.as_str()) else {
            return Err(DatasetError::UnknownPrerequisite(row.target_skill_id.clone()));
        };
        let prerequisites = &mut skills[target].prerequisites;
        if !prerequisites.contains(&row.source_skill_id) {
            prerequisites.push(row.source_skill_id.clone());
        }
    }

    let start = start_skill_id.unwrap_or(first.skill_id.as_str()).to_string();
    let hierarchy = Hierarchy {
        grades: grades.items,
        subjects: subjects.items,
        domains: domains.items,
        competencies: competencies.items,
        outcomes: outcomes.items,
    };

    tracing::debug!(
        skills = skills.len(),
        outcomes = hierarchy.outcomes.len(),
        prerequisites = prerequisite_rows.len(),
        start_skill_id = %start,
        "assembled dependency graph"
    );
    DependencyGraph::new(hierarchy, skills, start)
}

/// Later rows for the same `(type, id)` overwrite earlier ones.
pub fn abilities_from_rows(rows: &[AbilityRow]) -> Result<AbilityState, DatasetError> {
    let mut state = AbilityState::new();
    for row in rows {
        let level = Level::parse(&row.kind)
            .ok_or_else(|| DatasetError::UnknownAbilityType(row.kind.clone()))?;
        if !row.ability.is_finite() {
            return Err(DatasetError::InvalidNumber {
                line: 0,
                column: "ability",
                value: row.ability.to_string(),
            });
        }
        state.set_theta(level, row.id.clone(), row.ability);
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_row_optional_grade() {
        let fields = [
            "s1", "Maths", "d1", "Number", "c1", "Counting", "o1", "Count to 10", "k1",
            "Count", "0.5",
        ];
        let row = GraphRow::from_fields(&fields, 2).unwrap();
        assert_eq!(row.difficulty, 0.5);
        assert!(row.grade_id.is_none());

        let mut with_grade = fields.to_vec();
        with_grade.extend(["g1", ""]);
        let row = GraphRow::from_fields(&with_grade, 3).unwrap();
        assert_eq!(row.grade_id.as_deref(), Some("g1"));
        assert_eq!(row.grade_label.as_deref(), Some("g1"));
    }

    #[test]
    fn test_graph_row_errors_carry_line() {
        let short = ["s1", "Maths"];
        assert_eq!(
            GraphRow::from_fields(&short, 7),
            Err(DatasetError::MissingColumns {
                line: 7,
                expected: 11,
                actual: 2
            })
        );

        let bad = [
            "s1", "Maths", "d1", "Number", "c1", "Counting", "o1", "Count", "k1", "Count", "easy",
        ];
        assert!(matches!(
            GraphRow::from_fields(&bad, 4),
            Err(DatasetError::InvalidNumber { line: 4, column: "difficulty", .. })
        ));
    }

    #[test]
    fn test_ability_row_blank_defaults_to_zero() {
        let row = AbilityRow::from_fields(&["skill", "k1", " "], 1).unwrap();
        assert_eq!(row.ability, 0.0);
        let row = AbilityRow::from_fields(&["skill", "k1"], 1).unwrap();
        assert_eq!(row.ability, 0.0);
    }

    #[test]
    fn test_constant_row_allows_empty_key() {
        let row = ConstantRow::from_fields(&["scale", "", "1.5"], 1).unwrap();
        assert_eq!(row, ConstantRow::new("scale", "", 1.5));
    }
}
