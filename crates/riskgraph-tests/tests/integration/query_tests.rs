//! Posterior queries on a textbook network.

use riskgraph_core::{
    load_model, EliminationOrder, Evidence, InferenceConfig, InferenceError, LoadedModel,
    VariableElimination,
};

/// Burglary/earthquake alarm with two callers.
const ALARM: &str = r#"
network Alarm {
    variable Burglary   { states: [no, yes] }
    variable Earthquake { states: [no, yes] }
    variable Alarm      { states: [off, on] }
    variable John       { states: [silent, calls] }
    variable Mary       { states: [silent, calls] }

    edge Burglary -> Alarm
    edge Earthquake -> Alarm
    edge Alarm -> John
    edge Alarm -> Mary

    cpd Burglary   { [0.999], [0.001] }
    cpd Earthquake { [0.998], [0.002] }
    cpd Alarm given Burglary, Earthquake {
        [0.999, 0.71, 0.06, 0.05],
        [0.001, 0.29, 0.94, 0.95]
    }
    cpd John given Alarm { [0.95, 0.1], [0.05, 0.9] }
    cpd Mary given Alarm { [0.99, 0.3], [0.01, 0.7] }

    evidence BothCall { John = calls, Mary = calls }
}
"#;

fn model() -> LoadedModel {
    load_model(ALARM).expect("alarm model")
}

fn assert_close(actual: f64, expected: f64, tol: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{} mismatch: expected {:.15}, got {:.15}, diff={:.3e}",
        label,
        expected,
        actual,
        (actual - expected).abs()
    );
}

#[test]
fn burglary_given_both_calls() {
    let model = model();
    let engine = VariableElimination::new(&model.network);
    let evidence = model.require_evidence("BothCall").expect("evidence");
    let p = engine.probability("Burglary", "yes", evidence).expect("query");
    // Known value for this network: 0.284171835...
    assert_close(p, 0.284_171_835_364_393_9, 1e-9, "P(B | j, m)");
}

#[test]
fn joint_query_is_normalized_and_ordered() {
    let model = model();
    let engine = VariableElimination::new(&model.network);
    let evidence = model.require_evidence("BothCall").expect("evidence");
    let joint = engine
        .query(&["Earthquake", "Burglary"], evidence)
        .expect("query");
    assert_eq!(joint.variables(), &["Earthquake".to_string(), "Burglary".to_string()]);
    assert_close(joint.total(), 1.0, 1e-12, "total");
    let burglary = joint.marginal("Burglary").expect("marginal");
    assert_close(burglary[1], 0.284_171_835_364_393_9, 1e-9, "marginal of joint");
}

#[test]
fn diagnostics_reflect_pruning() {
    let model = model();
    let engine = VariableElimination::new(&model.network);
    let (_, diagnostics) = engine
        .query_with_diagnostics(&["Alarm"], &Evidence::new().with("Burglary", "yes"))
        .expect("query");
    // John and Mary are barren for this query.
    assert_eq!(diagnostics.pruned_count, 2);
    assert_eq!(diagnostics.elimination_order, vec!["Earthquake".to_string()]);
    assert_close(diagnostics.evidence_probability, 0.001, 1e-15, "P(evidence)");
}

#[test]
fn map_query_finds_quiet_night() {
    let model = model();
    let engine = VariableElimination::new(&model.network);
    let map = engine
        .map_query(&["Burglary", "Earthquake"], &Evidence::new().with("John", "calls"))
        .expect("map");
    assert_eq!(
        map.assignment,
        vec![
            ("Burglary".to_string(), "no".to_string()),
            ("Earthquake".to_string(), "no".to_string()),
        ]
    );
    assert!(map.probability > 0.5);
}

#[test]
fn heuristics_agree_without_pruning() {
    let model = model();
    let evidence = Evidence::new().with("Mary", "calls");
    let reference = VariableElimination::new(&model.network)
        .probability("Burglary", "yes", &evidence)
        .expect("reference");
    for order in [
        EliminationOrder::MinNeighbors,
        EliminationOrder::MinWeight,
        EliminationOrder::MinFill,
        EliminationOrder::Explicit(vec![
            "John".into(),
            "Alarm".into(),
            "Earthquake".into(),
        ]),
    ] {
        let engine = VariableElimination::with_config(
            &model.network,
            InferenceConfig {
                elimination_order: order.clone(),
                prune_barren: false,
                ..InferenceConfig::default()
            },
        )
        .expect("engine");
        let p = engine
            .probability("Burglary", "yes", &evidence)
            .expect("query");
        assert_close(p, reference, 1e-12, &format!("{:?}", order));
    }
}

#[test]
fn explicit_order_rejects_unknown_names() {
    let model = model();
    let engine = VariableElimination::with_config(
        &model.network,
        InferenceConfig {
            elimination_order: EliminationOrder::Explicit(vec!["Dog".into()]),
            ..InferenceConfig::default()
        },
    )
    .expect("engine");
    let err = engine.query(&["Burglary"], &Evidence::new()).unwrap_err();
    assert!(matches!(err, InferenceError::UnknownVariable(_)));
}

#[test]
fn empty_explicit_order_is_a_config_error() {
    let model = model();
    let result = VariableElimination::with_config(
        &model.network,
        InferenceConfig {
            elimination_order: EliminationOrder::Explicit(Vec::new()),
            ..InferenceConfig::default()
        },
    );
    assert!(matches!(result, Err(InferenceError::Validation(_))));
}

#[test]
fn threshold_turns_rare_evidence_degenerate() {
    let model = model();
    let engine = VariableElimination::with_config(
        &model.network,
        InferenceConfig {
            degenerate_threshold: 0.01,
            ..InferenceConfig::default()
        },
    )
    .expect("engine");
    // P(Burglary = yes) = 0.001 falls under the threshold.
    let err = engine
        .query(&["Alarm"], &Evidence::new().with("Burglary", "yes"))
        .unwrap_err();
    assert!(matches!(err, InferenceError::DegenerateEvidence(_)));
}
