#![allow(dead_code)]

use skillpath_engine::{build_graph, DependencyGraph, GraphRow, PrerequisiteRow};

/// Difficulty giving probability `p` to a learner whose thetas are all zero
/// (scale 1).
pub fn difficulty_for(p: f64) -> f64 {
    -(p / (1.0 - p)).ln()
}

pub fn graph_row(skill_id: &str, difficulty: f64) -> GraphRow {
    GraphRow {
        subject_id: "math".into(),
        subject_label: "Mathematics".into(),
        domain_id: "number".into(),
        domain_label: "Number".into(),
        competency_id: "counting".into(),
        competency_label: "Counting".into(),
        outcome_id: "count-100".into(),
        outcome_label: "Count to 100".into(),
        skill_id: skill_id.into(),
        skill_label: skill_id.to_uppercase(),
        difficulty,
        grade_id: Some("g1".into()),
        grade_label: Some("Grade 1".into()),
    }
}

pub fn prerequisite(source: &str, target: &str) -> PrerequisiteRow {
    PrerequisiteRow {
        source_skill_id: source.into(),
        target_skill_id: target.into(),
    }
}

/// `skills` are `(id, probability at zero ability)`; `edges` are
/// `(prerequisite, dependent)`.
pub fn graph_with(skills: &[(&str, f64)], edges: &[(&str, &str)], start: &str) -> DependencyGraph {
    let rows: Vec<GraphRow> = skills
        .iter()
        .map(|&(id, p)| graph_row(id, difficulty_for(p)))
        .collect();
    let prereqs: Vec<PrerequisiteRow> = edges
        .iter()
        .map(|&(source, target)| prerequisite(source, target))
        .collect();
    build_graph(&rows, &prereqs, Some(start)).expect("fixture graph")
}

pub fn init_logging() {
    skillpath_engine::logging::init_tracing("skillpath_engine=debug");
}
