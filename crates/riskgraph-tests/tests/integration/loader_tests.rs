//! Model descriptions through the frontend into a network.

use riskgraph_core::{load_model, Evidence, InferenceError, VariableElimination};
use riskgraph_frontend::{parse_model, FrontendError};

const WEATHER: &str = r#"
// Three-state weather driving a binary commute delay.
network Weather {
    variable Sky   { states: [clear, cloudy, storm] }
    variable Delay { states: [no, yes] }

    edge Sky -> Delay

    cpd Sky { [0.6], [0.3], [0.1] }
    cpd Delay given Sky {
        [0.95, 0.8, 0.3],
        [0.05, 0.2, 0.7],
    }

    evidence Stormy { Sky = storm }
    evidence Late   { Delay = yes }
}
"#;

#[test]
fn labelled_states_flow_through_to_queries() {
    let model = load_model(WEATHER).expect("model");
    let engine = VariableElimination::new(&model.network);

    let stormy = model.require_evidence("Stormy").expect("evidence");
    let delay = engine.query(&["Delay"], stormy).expect("query");
    assert_eq!(delay.states(0), Some(&["no".to_string(), "yes".to_string()][..]));
    assert!((delay.probability_of("Delay", "yes").expect("yes") - 0.7).abs() < 1e-12);

    let late = model.require_evidence("Late").expect("evidence");
    let sky = engine.query(&["Sky"], late).expect("query");
    let p_late = 0.6 * 0.05 + 0.3 * 0.2 + 0.1 * 0.7;
    assert!((sky.probability_of("Sky", "storm").expect("storm") - 0.07 / p_late).abs() < 1e-12);
}

#[test]
fn evidence_sets_keep_declaration_order() {
    let model = load_model(WEATHER).expect("model");
    let names: Vec<&str> = model.evidence_sets.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Stormy", "Late"]);
    assert_eq!(
        model.evidence("Late"),
        Some(&Evidence::new().with("Delay", "yes"))
    );
}

#[test]
fn frontend_reports_source_locations() {
    let source = "network N {\n  variable A { states: [0, 1] }\n  evidence E { A = 2 }\n}";
    let err = load_model(source).unwrap_err();
    match err {
        InferenceError::Validation(msg) => {
            assert!(msg.contains("evidence 'E'"), "{}", msg);
            assert!(msg.contains("(at 3:"), "{}", msg);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn parser_rejects_missing_arrow() {
    let err = parse_model("network N { edge A B }").unwrap_err();
    assert!(matches!(err, FrontendError::ParseError(_)));
}

#[test]
fn structural_errors_come_from_the_core() {
    // Frontend validation passes: all names resolve.
    let source = r#"
        network N {
            variable A { states: [0, 1] }
            variable B { states: [0, 1] }
            edge A -> B
            cpd A { [0.5], [0.5] }
            cpd B { [0.5], [0.5] }
        }
    "#;
    let ast = parse_model(source).expect("parse");
    riskgraph_frontend::validate_model(&ast).expect("names are valid");
    let err = load_model(source).unwrap_err();
    assert!(matches!(err, InferenceError::Structure(_)), "{:?}", err);
}
