use crate::graph::{DependencyGraph, Hierarchy};
use crate::types::{Competency, Domain, Grade, Outcome, Skill, Subject};

pub fn hierarchy() -> Hierarchy {
    Hierarchy {
        grades: vec![Grade {
            id: "g1".into(),
            label: "Grade 1".into(),
        }],
        subjects: vec![Subject {
            id: "s1".into(),
            label: "Math".into(),
            grade_id: Some("g1".into()),
        }],
        domains: vec![Domain {
            id: "d1".into(),
            label: "Number".into(),
            subject_id: "s1".into(),
        }],
        competencies: vec![Competency {
            id: "c1".into(),
            label: "Counting".into(),
            domain_id: "d1".into(),
        }],
        outcomes: vec![Outcome {
            id: "o1".into(),
            label: "Count to 100".into(),
            competency_id: "c1".into(),
        }],
    }
}

pub fn skill(id: &str, difficulty: f64, prerequisites: &[&str]) -> Skill {
    Skill {
        id: id.into(),
        label: id.to_uppercase(),
        difficulty,
        outcome_id: "o1".into(),
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
    }
}

pub fn graph(skills: Vec<Skill>, start: &str) -> DependencyGraph {
    DependencyGraph::new(hierarchy(), skills, start).expect("fixture graph")
}

/// Difficulty that yields `p` for a learner with all thetas at zero and scale 1.
pub fn difficulty_for(p: f64) -> f64 {
    -(p / (1.0 - p)).ln()
}
