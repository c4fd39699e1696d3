//! Ability updates from observed outcomes.
//!
//! The caller's state is never touched: each call clones it once and returns
//! the updated copy. One error signal, `outcome − p_before`, drives every level
//! in a single pass.

use serde::{Deserialize, Serialize};

use crate::config::EngineConstants;
use crate::error::{EngineError, Result};
use crate::graph::{DependencyGraph, Lineage};
use crate::probability::ProbabilityModel;
use crate::types::{AbilityState, Level, LevelVector, Skill};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeEvent {
    pub skill_id: String,
    pub correct: bool,
}

impl OutcomeEvent {
    pub fn new(skill_id: impl Into<String>, correct: bool) -> Self {
        Self {
            skill_id: skill_id.into(),
            correct,
        }
    }

    fn actual(&self) -> f64 {
        if self.correct {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityUpdate {
    pub abilities: AbilityState,
    pub probability_before: f64,
    pub probability_after: f64,
    pub error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStep {
    pub correct: bool,
    pub probability_before: f64,
    pub probability_after: f64,
    pub error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdate {
    pub skill_id: String,
    pub abilities: AbilityState,
    /// Theta of the skill's containing entity at every level, before the batch.
    pub before: LevelVector,
    pub after: LevelVector,
    pub probability_before: f64,
    pub probability_after: f64,
    pub steps: Vec<UpdateStep>,
}

fn resolve<'g>(graph: &'g DependencyGraph, skill_id: &str) -> Result<(&'g Skill, &'g Lineage)> {
    match (graph.skill(skill_id), graph.lineage(skill_id)) {
        (Some(skill), Some(lineage)) => Ok((skill, lineage)),
        _ => Err(EngineError::UnknownSkill(skill_id.to_string())),
    }
}

fn lineage_thetas(abilities: &AbilityState, lineage: &Lineage) -> LevelVector {
    let mut thetas = LevelVector::default();
    for (level, id) in lineage.iter() {
        thetas.set(level, abilities.theta(level, id));
    }
    thetas
}

/// Applies one outcome to `state` in place. `state` must already be the
/// caller-owned copy.
fn apply_outcome(
    state: &mut AbilityState,
    skill: &Skill,
    lineage: &Lineage,
    event: &OutcomeEvent,
    constants: &EngineConstants,
) -> UpdateStep {
    let before = ProbabilityModel::from_constants(state, constants).for_lineage(skill, lineage);
    let error = event.actual() - before;

    for (level, id) in lineage.iter() {
        let rate = constants.learning_rates.get(level);
        if rate == 0.0 {
            continue;
        }
        let theta = state.theta(level, id) + rate * error;
        state.set_theta(level, id, theta);
    }

    let after = ProbabilityModel::from_constants(state, constants).for_lineage(skill, lineage);
    UpdateStep {
        correct: event.correct,
        probability_before: before,
        probability_after: after,
        error,
    }
}

pub fn update_abilities(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    event: &OutcomeEvent,
    constants: &EngineConstants,
) -> Result<AbilityUpdate> {
    let (skill, lineage) = resolve(graph, &event.skill_id)?;
    let mut next = abilities.clone();
    let step = apply_outcome(&mut next, skill, lineage, event, constants);

    tracing::debug!(
        skill_id = %skill.id,
        correct = event.correct,
        before = step.probability_before,
        after = step.probability_after,
        "abilities updated"
    );

    Ok(AbilityUpdate {
        abilities: next,
        probability_before: step.probability_before,
        probability_after: step.probability_after,
        error: step.error,
    })
}

/// Applies events for one skill in order, re-deriving the error against the
/// running state between events. The whole batch is validated before anything
/// is applied.
pub fn update_abilities_batch(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    events: &[OutcomeEvent],
    constants: &EngineConstants,
) -> Result<BatchUpdate> {
    let first = events
        .first()
        .ok_or_else(|| EngineError::InvalidInput("empty outcome batch".to_string()))?;
    if let Some(other) = events.iter().find(|e| e.skill_id != first.skill_id) {
        return Err(EngineError::InvalidInput(format!(
            "batch mixes skills {} and {}",
            first.skill_id, other.skill_id
        )));
    }
    let (skill, lineage) = resolve(graph, &first.skill_id)?;

    let mut next = abilities.clone();
    let before = lineage_thetas(&next, lineage);
    let steps: Vec<UpdateStep> = events
        .iter()
        .map(|event| apply_outcome(&mut next, skill, lineage, event, constants))
        .collect();
    let after = lineage_thetas(&next, lineage);

    let probability_before = steps.first().map(|s| s.probability_before).unwrap_or_default();
    let probability_after = steps.last().map(|s| s.probability_after).unwrap_or_default();
    tracing::debug!(
        skill_id = %skill.id,
        events = steps.len(),
        before = probability_before,
        after = probability_after,
        "batch abilities updated"
    );

    Ok(BatchUpdate {
        skill_id: skill.id.clone(),
        abilities: next,
        before,
        after,
        probability_before,
        probability_after,
        steps,
    })
}

/// Theta of every entity containing `skill_id`, keyed by level.
pub fn ability_snapshot(
    graph: &DependencyGraph,
    abilities: &AbilityState,
    skill_id: &str,
) -> Result<Vec<(Level, String, f64)>> {
    let (_, lineage) = resolve(graph, skill_id)?;
    Ok(lineage
        .iter()
        .map(|(level, id)| (level, id.to_string(), abilities.theta(level, id)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph, skill};

    #[test]
    fn test_correct_answer_raises_every_rated_level() {
        let g = graph(vec![skill("a", 0.0, &[])], "a");
        let constants = EngineConstants::default();
        let update = update_abilities(&g, &AbilityState::new(), &OutcomeEvent::new("a", true), &constants)
            .unwrap();

        assert!((update.error - 0.5).abs() < 1e-12);
        assert!((update.abilities.theta(Level::Skill, "a") - 0.2).abs() < 1e-12);
        assert!((update.abilities.theta(Level::Outcome, "o1") - 0.1).abs() < 1e-12);
        assert!((update.abilities.theta(Level::Competency, "c1") - 0.05).abs() < 1e-12);
        // grade has no learning rate by default
        assert!(!update.abilities.grade.contains_key("g1"));
        assert!(update.probability_after > update.probability_before);
    }

    #[test]
    fn test_caller_state_untouched() {
        let g = graph(vec![skill("a", 0.0, &[])], "a");
        let original = AbilityState::new().with_theta(Level::Skill, "a", 0.3);
        let snapshot = original.clone();
        let update =
            update_abilities(&g, &original, &OutcomeEvent::new("a", false), &EngineConstants::default())
                .unwrap();
        assert_eq!(original, snapshot);
        assert!(update.abilities.theta(Level::Skill, "a") < 0.3);
    }

    #[test]
    fn test_unknown_skill() {
        let g = graph(vec![skill("a", 0.0, &[])], "a");
        let err = update_abilities(
            &g,
            &AbilityState::new(),
            &OutcomeEvent::new("zz", true),
            &EngineConstants::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::UnknownSkill("zz".into()));
    }

    #[test]
    fn test_batch_matches_serial_single_updates() {
        let g = graph(vec![skill("a", 0.5, &[])], "a");
        let constants = EngineConstants::default();
        let events = vec![
            OutcomeEvent::new("a", true),
            OutcomeEvent::new("a", false),
            OutcomeEvent::new("a", true),
        ];

        let batch = update_abilities_batch(&g, &AbilityState::new(), &events, &constants).unwrap();

        let mut state = AbilityState::new();
        for event in &events {
            state = update_abilities(&g, &state, event, &constants).unwrap().abilities;
        }
        assert_eq!(batch.abilities, state);
        assert_eq!(batch.steps.len(), 3);
        assert_eq!(batch.before, LevelVector::default());
        assert_eq!(batch.after.skill, state.theta(Level::Skill, "a"));
        assert_eq!(batch.probability_before, batch.steps[0].probability_before);
        assert_eq!(batch.probability_after, batch.steps[2].probability_after);
    }

    #[test]
    fn test_batch_rejects_mixed_and_empty() {
        let g = graph(vec![skill("a", 0.0, &[]), skill("b", 0.0, &[])], "a");
        let constants = EngineConstants::default();
        assert!(matches!(
            update_abilities_batch(&g, &AbilityState::new(), &[], &constants),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            update_abilities_batch(
                &g,
                &AbilityState::new(),
                &[OutcomeEvent::new("a", true), OutcomeEvent::new("b", true)],
                &constants
            ),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ability_snapshot_lists_lineage() {
        let g = graph(vec![skill("a", 0.0, &[])], "a");
        let state = AbilityState::new().with_theta(Level::Domain, "d1", 0.7);
        let snapshot = ability_snapshot(&g, &state, "a").unwrap();
        assert_eq!(snapshot.len(), 6);
        assert!(snapshot.contains(&(Level::Domain, "d1".to_string(), 0.7)));
    }
}
