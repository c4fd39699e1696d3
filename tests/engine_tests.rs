mod common;

use common::{graph_with, init_logging};
use skillpath_engine::{
    build_graph_snapshot, core_constants, get_skill_probability, recommend_next_skill,
    reset_core_constants, update_core_constants, AbilityState, ConstantRow, EngineConstants,
    EngineError, Level, RecommendOptions, RecommendationContext, RecommendationStatus,
    SkillClass, ZpdRange,
};

fn recommend(graph: &skillpath_engine::DependencyGraph, target: &str) -> RecommendationContext {
    recommend_next_skill(
        graph,
        &AbilityState::new(),
        target,
        &EngineConstants::default(),
        &RecommendOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_single_root_at_half_is_recommended() {
    init_logging();
    let graph = graph_with(&[("a", 0.5)], &[], "a");

    let p = get_skill_probability(&graph, &AbilityState::new(), "a", &EngineConstants::default())
        .unwrap();
    assert!((p - 0.5).abs() < 1e-12);

    let ctx = recommend(&graph, "a");
    assert_eq!(ctx.status, RecommendationStatus::Recommended);
    assert_eq!(ctx.candidate_id.as_deref(), Some("a"));
    assert_eq!(ctx.target_id, "a");
}

#[test]
fn test_too_hard_target_over_mastered_prerequisite_needs_remediation() {
    let graph = graph_with(&[("a", 0.9), ("b", 0.3)], &[("a", "b")], "a");

    let ctx = recommend(&graph, "b");
    assert_eq!(ctx.status, RecommendationStatus::NeedsRemediation);
    assert_eq!(ctx.candidate_id.as_deref(), Some("b"));
    assert!((ctx.probability.unwrap() - 0.3).abs() < 1e-9);
}

#[test]
fn test_chain_below_band_remediates_at_root() {
    let graph = graph_with(
        &[("root", 0.1), ("mid", 0.2), ("top", 0.3)],
        &[("root", "mid"), ("mid", "top")],
        "root",
    );

    let ctx = recommend(&graph, "top");
    assert_eq!(ctx.status, RecommendationStatus::NeedsRemediation);
    assert_eq!(ctx.candidate_id.as_deref(), Some("root"));
    assert_eq!(ctx.traversed, vec!["top", "mid", "root"]);
}

#[test]
fn test_mastered_start_advances_to_dependent() {
    let graph = graph_with(&[("a", 0.9), ("b", 0.6)], &[("a", "b")], "a");

    let ctx = recommend(&graph, "a");
    assert_eq!(ctx.status, RecommendationStatus::Recommended);
    assert_eq!(ctx.candidate_id.as_deref(), Some("b"));
    assert_eq!(ctx.traversed, vec!["a", "b"]);
}

#[test]
fn test_forward_search_passes_through_mastered_dependents() {
    let graph = graph_with(
        &[("a", 0.9), ("b", 0.95), ("c", 0.7)],
        &[("a", "b"), ("b", "c")],
        "a",
    );

    let ctx = recommend(&graph, "a");
    assert_eq!(ctx.status, RecommendationStatus::Recommended);
    assert_eq!(ctx.candidate_id.as_deref(), Some("c"));
}

#[test]
fn test_in_band_dependent_wins_over_earlier_too_hard_one() {
    let graph = graph_with(
        &[("s", 0.9), ("hard", 0.2), ("next", 0.6)],
        &[("s", "hard"), ("s", "next")],
        "s",
    );

    let ctx = recommend(&graph, "s");
    assert_eq!(ctx.status, RecommendationStatus::Recommended);
    assert_eq!(ctx.candidate_id.as_deref(), Some("next"));
}

#[test]
fn test_only_too_hard_dependent_needs_remediation() {
    let graph = graph_with(&[("s", 0.9), ("hard", 0.2)], &[("s", "hard")], "s");

    let ctx = recommend(&graph, "s");
    assert_eq!(ctx.status, RecommendationStatus::NeedsRemediation);
    assert_eq!(ctx.candidate_id.as_deref(), Some("hard"));
    assert!((ctx.probability.unwrap() - 0.2).abs() < 1e-9);
}

#[test]
fn test_everything_mastered_is_auto_mastered() {
    let graph = graph_with(&[("a", 0.9), ("b", 0.95)], &[("a", "b")], "a");

    let ctx = recommend(&graph, "a");
    assert_eq!(ctx.status, RecommendationStatus::AutoMastered);
    assert_eq!(ctx.candidate_id.as_deref(), Some("a"));
}

#[test]
fn test_cycle_terminates_without_repeats() {
    let graph = graph_with(
        &[("a", 0.1), ("b", 0.2), ("c", 0.3)],
        &[("a", "b"), ("b", "c"), ("c", "a")],
        "a",
    );

    for target in ["a", "b", "c"] {
        let ctx = recommend(&graph, target);
        let mut seen = std::collections::HashSet::new();
        assert!(ctx.traversed.iter().all(|id| seen.insert(id.clone())));
        assert!(ctx.traversed.len() <= 3);
    }
}

#[test]
fn test_gap_zone_prerequisite_falls_back_to_nearest() {
    // band [0.3, 0.5]: "gap" sits between the band and the mastered threshold
    let graph = graph_with(
        &[("gap", 0.6), ("x", 0.2), ("t", 0.1)],
        &[("gap", "x"), ("x", "t")],
        "gap",
    );
    let options = RecommendOptions {
        zpd: Some(ZpdRange { min: 0.3, max: 0.5 }),
        ..Default::default()
    };

    let ctx = recommend_next_skill(
        &graph,
        &AbilityState::new(),
        "t",
        &EngineConstants::default(),
        &options,
    )
    .unwrap();
    assert_eq!(ctx.status, RecommendationStatus::NeedsRemediation);
    assert_eq!(ctx.candidate_id.as_deref(), Some("x"));
    assert_eq!(ctx.note.as_deref(), Some("nearest non-mastered prerequisite"));
}

#[test]
fn test_abilities_shift_the_recommendation() {
    let graph = graph_with(&[("a", 0.5), ("b", 0.3)], &[("a", "b")], "a");
    let abilities = AbilityState::new().with_theta(Level::Skill, "a", 10.0);

    let ctx = recommend_next_skill(
        &graph,
        &abilities,
        "b",
        &EngineConstants::default(),
        &RecommendOptions::default(),
    )
    .unwrap();
    // a is now mastered, so b itself is the remediation point
    assert_eq!(ctx.candidate_id.as_deref(), Some("b"));
    assert_eq!(ctx.status, RecommendationStatus::NeedsRemediation);
}

#[test]
fn test_invalid_override_rejected() {
    let graph = graph_with(&[("a", 0.5)], &[], "a");
    let options = RecommendOptions {
        zpd: Some(ZpdRange { min: 0.9, max: 0.1 }),
        ..Default::default()
    };
    let err = recommend_next_skill(
        &graph,
        &AbilityState::new(),
        "a",
        &EngineConstants::default(),
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_unknown_skill_probability_is_fatal() {
    let graph = graph_with(&[("a", 0.5)], &[], "a");
    let err = get_skill_probability(&graph, &AbilityState::new(), "nope", &EngineConstants::default())
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownSkill("nope".into()));
}

#[test]
fn test_constants_rows_reshape_snapshot_until_reset() {
    init_logging();
    let graph = graph_with(
        &[("low", 0.55), ("mid", 0.7), ("high", 0.85)],
        &[("low", "mid"), ("mid", "high")],
        "low",
    );
    let abilities = AbilityState::new();

    let before = build_graph_snapshot(&graph, &abilities, &core_constants(), None).unwrap();
    assert_eq!(before.node("low").unwrap().class, SkillClass::InZpd);
    assert_eq!(before.node("high").unwrap().class, SkillClass::Mastered);

    let rows = [
        ConstantRow::from_fields(&["zpdRange", "min", "0.6"], 1).unwrap(),
        ConstantRow::from_fields(&["zpdRange", "max", "0.9"], 2).unwrap(),
    ];
    let updated = update_core_constants(&rows).unwrap();
    assert_eq!(updated.zpd_range, ZpdRange { min: 0.6, max: 0.9 });

    let during = build_graph_snapshot(&graph, &abilities, &core_constants(), None).unwrap();
    assert_eq!(during.node("low").unwrap().class, SkillClass::TooHard);
    assert_eq!(during.node("mid").unwrap().class, SkillClass::InZpd);
    assert_eq!(during.counts.too_hard, 1);

    let rejected = [ConstantRow::new("zpdRange", "min", f64::NAN)];
    assert!(update_core_constants(&rejected).is_err());
    assert_eq!(core_constants().zpd_range, ZpdRange { min: 0.6, max: 0.9 });

    reset_core_constants();
    let after = build_graph_snapshot(&graph, &abilities, &core_constants(), None).unwrap();
    assert_eq!(after.node("low").unwrap().class, SkillClass::InZpd);
    assert_eq!(after, before);
}

#[test]
fn test_snapshot_serializes_for_presentation() {
    let graph = graph_with(&[("a", 0.9), ("b", 0.6)], &[("a", "b")], "a");
    let snapshot =
        build_graph_snapshot(&graph, &AbilityState::new(), &EngineConstants::default(), Some("a"))
            .unwrap();

    assert_eq!(snapshot.edges.len(), 1);
    assert_eq!(snapshot.counts.mastered, 1);
    assert_eq!(snapshot.counts.in_zpd, 1);

    let json = snapshot.to_json().unwrap();
    assert_eq!(json["nodes"][1]["class"], "in-zpd");
    assert_eq!(json["recommendation"]["status"], "recommended");
    assert_eq!(json["recommendation"]["candidateId"], "b");
}
