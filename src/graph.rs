//! Skill dependency graph.
//!
//! The graph owns the composition tree (grade → subject → domain → competency
//! → outcome) and the skills hanging off it. Every skill resolves to exactly one
//! entity per level; the lineage is computed once at construction. Prerequisite
//! cycles are allowed and prerequisite ids that name no skill are kept as-is.

use std::collections::{HashMap, HashSet};

use crate::error::DatasetError;
use crate::types::{Competency, Domain, Grade, Level, Outcome, Skill, Subject};

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    pub grades: Vec<Grade>,
    pub subjects: Vec<Subject>,
    pub domains: Vec<Domain>,
    pub competencies: Vec<Competency>,
    pub outcomes: Vec<Outcome>,
}

/// Containing entity ids for one skill, one per level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub skill: String,
    pub outcome: String,
    pub competency: String,
    pub domain: String,
    pub subject: String,
    pub grade: Option<String>,
}

impl Lineage {
    pub fn id(&self, level: Level) -> Option<&str> {
        match level {
            Level::Skill => Some(&self.skill),
            Level::Outcome => Some(&self.outcome),
            Level::Competency => Some(&self.competency),
            Level::Domain => Some(&self.domain),
            Level::Subject => Some(&self.subject),
            Level::Grade => self.grade.as_deref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, &str)> + '_ {
        Level::ALL
            .iter()
            .filter_map(move |&level| self.id(level).map(|id| (level, id)))
    }
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    hierarchy: Hierarchy,
    skills: Vec<Skill>,
    lineages: Vec<Lineage>,
    skill_positions: HashMap<String, usize>,
    start_skill_id: String,
}

fn position_map<T>(
    items: &[T],
    kind: &'static str,
    id_of: impl Fn(&T) -> &str,
) -> Result<HashMap<String, usize>, DatasetError> {
    let mut map = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        let id = id_of(item);
        if map.insert(id.to_string(), pos).is_some() {
            return Err(DatasetError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(map)
}

fn require_parent(
    parents: &HashMap<String, usize>,
    kind: &'static str,
    id: &str,
    parent_kind: &'static str,
    parent_id: &str,
) -> Result<usize, DatasetError> {
    parents
        .get(parent_id)
        .copied()
        .ok_or_else(|| DatasetError::UnknownParent {
            kind,
            id: id.to_string(),
            parent_kind,
            parent_id: parent_id.to_string(),
        })
}

impl DependencyGraph {
    pub fn new(
        hierarchy: Hierarchy,
        skills: Vec<Skill>,
        start_skill_id: impl Into<String>,
    ) -> Result<Self, DatasetError> {
        if skills.is_empty() {
            return Err(DatasetError::Empty("skill list"));
        }

        let grades = position_map(&hierarchy.grades, "grade", |g| g.id.as_str())?;
        let subjects = position_map(&hierarchy.subjects, "subject", |s| s.id.as_str())?;
        let domains = position_map(&hierarchy.domains, "domain", |d| d.id.as_str())?;
        let competencies = position_map(&hierarchy.competencies, "competency", |c| c.id.as_str())?;
        let outcomes = position_map(&hierarchy.outcomes, "outcome", |o| o.id.as_str())?;
        let skill_positions = position_map(&skills, "skill", |s| s.id.as_str())?;

        for subject in &hierarchy.subjects {
            if let Some(grade_id) = &subject.grade_id {
                require_parent(&grades, "subject", &subject.id, "grade", grade_id)?;
            }
        }
        for domain in &hierarchy.domains {
            require_parent(&subjects, "domain", &domain.id, "subject", &domain.subject_id)?;
        }
        for competency in &hierarchy.competencies {
            require_parent(&domains, "competency", &competency.id, "domain", &competency.domain_id)?;
        }
        for outcome in &hierarchy.outcomes {
            require_parent(
                &competencies,
                "outcome",
                &outcome.id,
                "competency",
                &outcome.competency_id,
            )?;
        }

        let mut lineages = Vec::with_capacity(skills.len());
        for skill in &skills {
            if !skill.difficulty.is_finite() {
                return Err(DatasetError::NonFiniteDifficulty(skill.id.clone()));
            }
            let outcome = &hierarchy.outcomes
                [require_parent(&outcomes, "skill", &skill.id, "outcome", &skill.outcome_id)?];
            let competency = &hierarchy.competencies[competencies[&outcome.competency_id]];
            let domain = &hierarchy.domains[domains[&competency.domain_id]];
            let subject = &hierarchy.subjects[subjects[&domain.subject_id]];
            lineages.push(Lineage {
                skill: skill.id.clone(),
                outcome: outcome.id.clone(),
                competency: competency.id.clone(),
                domain: domain.id.clone(),
                subject: subject.id.clone(),
                grade: subject.grade_id.clone(),
            });
        }

        let start_skill_id = start_skill_id.into();
        if !skill_positions.contains_key(&start_skill_id) {
            return Err(DatasetError::UnknownStartSkill(start_skill_id));
        }

        Ok(Self {
            hierarchy,
            skills,
            lineages,
            skill_positions,
            start_skill_id,
        })
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn start_skill_id(&self) -> &str {
        &self.start_skill_id
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.skill_positions.contains_key(skill_id)
    }

    pub fn skill(&self, skill_id: &str) -> Option<&Skill> {
        self.skill_positions.get(skill_id).map(|&pos| &self.skills[pos])
    }

    pub fn lineage(&self, skill_id: &str) -> Option<&Lineage> {
        self.skill_positions.get(skill_id).map(|&pos| &self.lineages[pos])
    }

    /// Builds the lookup tables used by traversal. Not cached: callers that
    /// evaluate the same graph repeatedly should hold on to the result.
    pub fn index(&self) -> GraphIndex<'_> {
        GraphIndex::build(self)
    }
}

#[derive(Debug, Clone)]
pub struct GraphIndex<'g> {
    pub skill_by_id: HashMap<&'g str, &'g Skill>,
    pub prerequisites: HashMap<&'g str, &'g [String]>,
    /// `dependents[x]` lists every skill that declares `x` as a prerequisite,
    /// in declaration order. Every skill has an entry.
    pub dependents: HashMap<&'g str, Vec<&'g str>>,
}

impl<'g> GraphIndex<'g> {
    pub fn build(graph: &'g DependencyGraph) -> Self {
        let mut skill_by_id = HashMap::with_capacity(graph.skills.len());
        let mut prerequisites = HashMap::with_capacity(graph.skills.len());
        let mut dependents: HashMap<&'g str, Vec<&'g str>> =
            HashMap::with_capacity(graph.skills.len());

        for skill in &graph.skills {
            skill_by_id.insert(skill.id.as_str(), skill);
            prerequisites.insert(skill.id.as_str(), skill.prerequisites.as_slice());
            dependents.entry(skill.id.as_str()).or_default();
        }

        for skill in &graph.skills {
            let mut seen = HashSet::new();
            for prereq in &skill.prerequisites {
                if !seen.insert(prereq.as_str()) {
                    continue;
                }
                if let Some(list) = dependents.get_mut(prereq.as_str()) {
                    list.push(skill.id.as_str());
                }
            }
        }

        Self {
            skill_by_id,
            prerequisites,
            dependents,
        }
    }

    pub fn prerequisites_of(&self, skill_id: &str) -> &'g [String] {
        self.prerequisites.get(skill_id).copied().unwrap_or(&[])
    }

    pub fn dependents_of(&self, skill_id: &str) -> &[&'g str] {
        self.dependents
            .get(skill_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
