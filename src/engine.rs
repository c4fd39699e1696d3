//! Next-skill recommendation.
//!
//! A depth-first walk from the target towards its prerequisites, looking for
//! the first skill whose mastery probability sits inside the ZPD band. When the
//! target is already mastered the walk turns around and advances through
//! dependents instead. One visited-set is shared by the whole call, so every
//! skill is evaluated at most once and cycles end in `NoCandidate`.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::{validate_threshold, EngineConstants, ZpdRange};
use crate::error::Result;
use crate::graph::{DependencyGraph, GraphIndex};
use crate::probability::ProbabilityModel;
use crate::types::{AbilityState, BlendWeights, Skill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationStatus {
    Recommended,
    AutoMastered,
    NeedsRemediation,
    NoCandidate,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::AutoMastered => "auto-mastered",
            Self::NeedsRemediation => "needs-remediation",
            Self::NoCandidate => "no-candidate",
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Recommended | Self::NeedsRemediation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    pub target_id: String,
    pub candidate_id: Option<String>,
    pub probability: Option<f64>,
    pub status: RecommendationStatus,
    /// Skills in the order they were first evaluated. Never repeats an id.
    pub traversed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Per-call overrides. Anything left `None` comes from the constants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendOptions {
    pub zpd: Option<ZpdRange>,
    pub blend_weights: Option<BlendWeights>,
    pub mastered_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct Evaluation {
    status: RecommendationStatus,
    candidate: Option<String>,
    probability: Option<f64>,
    note: &'static str,
}

impl Evaluation {
    fn found(status: RecommendationStatus, id: &str, probability: f64, note: &'static str) -> Self {
        Self {
            status,
            candidate: Some(id.to_string()),
            probability: Some(probability),
            note,
        }
    }

    fn none(note: &'static str) -> Self {
        Self {
            status: RecommendationStatus::NoCandidate,
            candidate: None,
            probability: None,
            note,
        }
    }
}

struct Traversal<'a> {
    graph: &'a DependencyGraph,
    index: GraphIndex<'a>,
    model: ProbabilityModel<'a>,
    zpd: ZpdRange,
    mastered_threshold: f64,
    target: &'a str,
    visited: HashSet<&'a str>,
    traversed: Vec<&'a str>,
}

impl<'a> Traversal<'a> {
    fn probability(&self, skill: &Skill) -> f64 {
        match self.graph.lineage(&skill.id) {
            Some(lineage) => self.model.for_lineage(skill, lineage),
            None => 0.0,
        }
    }

    fn known(&self, id: &str) -> Option<&'a Skill> {
        self.index.skill_by_id.get(id).copied()
    }

    fn is_satisfied(&self, skill: &Skill) -> bool {
        self.probability(skill) >= self.mastered_threshold
    }

    /// True when every known prerequisite is satisfied. Vacuously true for a
    /// skill with no prerequisites.
    fn prerequisites_satisfied(&self, skill: &Skill) -> bool {
        skill
            .prerequisites
            .iter()
            .filter_map(|id| self.known(id))
            .all(|prereq| self.is_satisfied(prereq))
    }

    fn evaluate(&mut self, current: &'a str) -> Evaluation {
        if !self.visited.insert(current) {
            tracing::trace!(skill_id = current, "cycle detected");
            return Evaluation::none("cycle detected");
        }
        self.traversed.push(current);

        let Some(skill) = self.known(current) else {
            tracing::debug!(skill_id = current, "skill missing from graph");
            return Evaluation::none("missing from graph");
        };

        let mut fallback = None;
        if let Some(found) = self.scan_prerequisites(skill, &mut fallback) {
            return found;
        }

        let p = self.probability(skill);
        tracing::trace!(skill_id = current, probability = p, "evaluating node");

        if self.zpd.contains(p) {
            return Evaluation::found(RecommendationStatus::Recommended, current, p, "within zpd");
        }

        if p >= self.mastered_threshold {
            return self.advance_from(skill, p);
        }

        if p < self.zpd.min && self.prerequisites_satisfied(skill) {
            return Evaluation::found(
                RecommendationStatus::NeedsRemediation,
                current,
                p,
                "reached root outside zpd",
            );
        }

        fallback.unwrap_or_else(|| Evaluation::none("no actionable prerequisite"))
    }

    /// Walks prerequisites in declaration order. Returns early on the first
    /// in-band prerequisite or on any actionable result from below; otherwise
    /// records the first too-hard prerequisite whose subtree yielded nothing.
    fn scan_prerequisites(
        &mut self,
        skill: &'a Skill,
        fallback: &mut Option<Evaluation>,
    ) -> Option<Evaluation> {
        for prereq_id in &skill.prerequisites {
            let Some(prereq) = self.known(prereq_id) else {
                tracing::debug!(skill_id = %skill.id, prerequisite = %prereq_id, "skipping unknown prerequisite");
                continue;
            };

            let p = self.probability(prereq);
            if p >= self.mastered_threshold {
                continue;
            }
            if self.zpd.contains(p) {
                return Some(Evaluation::found(
                    RecommendationStatus::Recommended,
                    prereq_id,
                    p,
                    "prerequisite within zpd",
                ));
            }
            if p < self.zpd.min {
                let result = self.evaluate(prereq_id);
                if result.status != RecommendationStatus::NoCandidate {
                    return Some(result);
                }
                if fallback.is_none() {
                    *fallback = Some(Evaluation::found(
                        RecommendationStatus::NeedsRemediation,
                        prereq_id,
                        p,
                        "nearest non-mastered prerequisite",
                    ));
                }
            }
        }
        None
    }

    fn advance_from(&mut self, skill: &'a Skill, p: f64) -> Evaluation {
        if skill.id != self.target {
            return Evaluation::found(RecommendationStatus::AutoMastered, &skill.id, p, "mastered");
        }

        if let Some(found) = self.advance_forward(skill) {
            return found;
        }

        if skill.id == self.graph.start_skill_id() {
            if let Some(found) = self.advance_single_hop(skill) {
                return found;
            }
        }

        Evaluation::found(
            RecommendationStatus::AutoMastered,
            &skill.id,
            p,
            "target mastered, nothing ahead",
        )
    }

    fn ready_dependents(&self, skill_id: &str) -> Vec<&'a str> {
        self.index
            .dependents_of(skill_id)
            .iter()
            .copied()
            .filter(|&dep| self.known(dep).is_some_and(|s| self.prerequisites_satisfied(s)))
            .collect()
    }

    /// Breadth-first over dependents whose prerequisites are all satisfied.
    /// A recommendation wins outright; the first remediation is held back in
    /// case an in-band dependent turns up later in the same sweep.
    fn advance_forward(&mut self, skill: &'a Skill) -> Option<Evaluation> {
        let mut queue: VecDeque<&'a str> = VecDeque::new();
        let mut queued: HashSet<&'a str> = HashSet::new();
        for dep in self.ready_dependents(&skill.id) {
            if queued.insert(dep) {
                queue.push_back(dep);
            }
        }

        let mut remediation = None;
        while let Some(dep) = queue.pop_front() {
            let result = self.evaluate(dep);
            match result.status {
                RecommendationStatus::Recommended => return Some(result),
                RecommendationStatus::NeedsRemediation => {
                    remediation.get_or_insert(result);
                }
                RecommendationStatus::AutoMastered => {
                    for next in self.ready_dependents(dep) {
                        if queued.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
                RecommendationStatus::NoCandidate => {}
            }
        }
        remediation
    }

    /// Start-skill fallback: pick one direct dependent and recurse into it.
    fn advance_single_hop(&mut self, skill: &'a Skill) -> Option<Evaluation> {
        let candidates: Vec<(&'a str, f64)> = self
            .index
            .dependents_of(&skill.id)
            .iter()
            .filter_map(|&dep| self.known(dep).map(|s| (dep, self.probability(s))))
            .collect();

        let in_band = candidates.iter().copied().filter(|&(_, p)| self.zpd.contains(p));
        let choice = pick_closest(in_band, self.mastered_threshold).or_else(|| {
            candidates
                .iter()
                .copied()
                .fold(None, |best: Option<(&'a str, f64)>, cur| match best {
                    Some((_, bp)) if bp >= cur.1 => best,
                    _ => Some(cur),
                })
        })?;

        tracing::debug!(skill_id = choice.0, probability = choice.1, "single-hop advancement");
        let result = self.evaluate(choice.0);
        result.status.is_actionable().then_some(result)
    }
}

/// Minimises `|p − threshold|`, ties going to the higher probability and then
/// to the earlier item.
pub fn pick_closest<'s>(
    items: impl IntoIterator<Item = (&'s str, f64)>,
    threshold: f64,
) -> Option<(&'s str, f64)> {
    items.into_iter().fold(None, |best, cur| match best {
        None => Some(cur),
        Some((_, bp)) => {
            let (bd, cd) = ((bp - threshold).abs(), (cur.1 - threshold).abs());
            if cd < bd || (cd == bd && cur.1 > bp) {
                Some(cur)
            } else {
                best
            }
        }
    })
}

pub fn recommend_next_skill(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    target_id: &str,
    constants: &EngineConstants,
    options: &RecommendOptions,
) -> Result<RecommendationContext> {
    let zpd = options.zpd.unwrap_or(constants.zpd_range);
    zpd.validate()?;
    let mastered_threshold = options
        .mastered_threshold
        .unwrap_or(constants.mastered_threshold);
    validate_threshold(mastered_threshold)?;
    let weights = options.blend_weights.unwrap_or(constants.blend_weights);
    weights.validate("blendWeights")?;

    let mut traversal = Traversal {
        graph,
        index: graph.index(),
        model: ProbabilityModel::new(abilities, &weights, constants.scale),
        zpd,
        mastered_threshold,
        target: target_id,
        visited: HashSet::new(),
        traversed: Vec::new(),
    };

    let evaluation = traversal.evaluate(target_id);
    tracing::debug!(
        target_id,
        status = evaluation.status.as_str(),
        candidate = evaluation.candidate.as_deref().unwrap_or("-"),
        visited = traversal.traversed.len(),
        "recommendation resolved"
    );

    Ok(RecommendationContext {
        target_id: target_id.to_string(),
        candidate_id: evaluation.candidate,
        probability: evaluation.probability,
        status: evaluation.status,
        traversed: traversal.traversed.iter().map(|id| id.to_string()).collect(),
        note: Some(evaluation.note.to_string()),
    })
}
