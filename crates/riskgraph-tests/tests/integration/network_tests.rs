//! Network construction and structural validation.

use riskgraph_core::{
    BayesianNetwork, BuildConfig, InferenceError, NetworkBuilder, TabularCpd, Variable,
};

fn binary(name: &str) -> Variable {
    Variable::binary(name).expect("variable")
}

fn coin(name: &str) -> TabularCpd {
    TabularCpd::prior(name, &[0.5, 0.5]).expect("cpd")
}

fn structure_error(result: Result<BayesianNetwork, InferenceError>) -> String {
    match result {
        Err(InferenceError::Structure(msg)) => msg,
        other => panic!("expected structure error, got {:?}", other),
    }
}

#[test]
fn three_variable_cycle_is_rejected() {
    let cpd = |child: &str, parent: &str| {
        TabularCpd::new(child, [parent], vec![vec![0.5, 0.5], vec![0.5, 0.5]]).expect("cpd")
    };
    let msg = structure_error(BayesianNetwork::build(
        vec![binary("A"), binary("B"), binary("C")],
        [("A", "B"), ("B", "C"), ("C", "A")],
        vec![cpd("A", "C"), cpd("B", "A"), cpd("C", "B")],
    ));
    assert!(msg.contains("cycle"), "{}", msg);
}

#[test]
fn variable_without_cpd_is_rejected() {
    let msg = structure_error(BayesianNetwork::build(
        vec![binary("A"), binary("B")],
        Vec::<(&str, &str)>::new(),
        vec![coin("A")],
    ));
    assert!(msg.contains('B'), "{}", msg);
}

#[test]
fn cpd_for_unknown_variable_is_rejected() {
    structure_error(BayesianNetwork::build(
        vec![binary("A")],
        Vec::<(&str, &str)>::new(),
        vec![coin("A"), coin("Z")],
    ));
}

#[test]
fn parent_list_must_match_edges() {
    let msg = structure_error(BayesianNetwork::build(
        vec![binary("A"), binary("B")],
        Vec::<(&str, &str)>::new(),
        vec![
            coin("A"),
            TabularCpd::new("B", ["A"], vec![vec![0.5, 0.5], vec![0.5, 0.5]]).expect("cpd"),
        ],
    ));
    assert!(msg.contains("parents"), "{}", msg);
}

#[test]
fn table_shape_must_match_domains() {
    let three = Variable::new("T", ["lo", "mid", "hi"]).expect("variable");
    // Two rows for a three-state variable.
    structure_error(BayesianNetwork::build(
        vec![three],
        Vec::<(&str, &str)>::new(),
        vec![TabularCpd::prior("T", &[0.5, 0.5]).expect("cpd")],
    ));
}

#[test]
fn parent_columns_beyond_addressable_are_rejected() {
    let parents: Vec<String> = (0..64).map(|i| format!("P{}", i)).collect();
    let mut variables: Vec<Variable> = parents.iter().map(|p| binary(p)).collect();
    variables.push(binary("C"));
    let edges: Vec<(&str, &str)> = parents.iter().map(|p| (p.as_str(), "C")).collect();
    let mut cpds: Vec<TabularCpd> = parents.iter().map(|p| coin(p)).collect();
    cpds.push(
        TabularCpd::new("C", parents.iter().map(String::as_str), vec![vec![0.5], vec![0.5]])
            .expect("cpd"),
    );

    let msg = structure_error(BayesianNetwork::build(variables, edges, cpds));
    assert!(msg.contains("more columns than addressable"), "{}", msg);
}

#[test]
fn column_tolerance_is_configurable() {
    let almost = || TabularCpd::prior("A", &[0.5, 0.5001]).expect("cpd");
    structure_error(BayesianNetwork::build(
        vec![binary("A")],
        Vec::<(&str, &str)>::new(),
        vec![almost()],
    ));
    BayesianNetwork::build_with_config(
        vec![binary("A")],
        Vec::<(&str, &str)>::new(),
        vec![almost()],
        BuildConfig {
            column_tolerance: 1e-3,
        },
    )
    .expect("loose tolerance accepts the table");
}

#[test]
fn negative_entries_are_rejected_at_cpd_construction() {
    let result = TabularCpd::prior("A", &[1.2, -0.2]);
    assert!(matches!(result, Err(InferenceError::Structure(_))));
}

#[test]
fn builder_exposes_structure() {
    let mut builder = NetworkBuilder::new();
    builder
        .add_variable(binary("Smoking"))
        .add_variable(binary("Pollution"))
        .add_variable(binary("Cancer"))
        .add_variable(binary("Xray"))
        .add_edge("Smoking", "Cancer")
        .add_edge("Pollution", "Cancer")
        .add_edge("Cancer", "Xray")
        .add_cpd(TabularCpd::prior("Smoking", &[0.7, 0.3]).expect("cpd"))
        .add_cpd(TabularCpd::prior("Pollution", &[0.9, 0.1]).expect("cpd"))
        .add_cpd(
            TabularCpd::new(
                "Cancer",
                ["Smoking", "Pollution"],
                vec![vec![0.999, 0.98, 0.97, 0.95], vec![0.001, 0.02, 0.03, 0.05]],
            )
            .expect("cpd"),
        )
        .add_cpd(
            TabularCpd::new("Xray", ["Cancer"], vec![vec![0.8, 0.1], vec![0.2, 0.9]])
                .expect("cpd"),
        );
    let network = builder.build().expect("network");

    assert_eq!(network.len(), 4);
    assert_eq!(
        network.topological_order(),
        vec!["Smoking", "Pollution", "Cancer", "Xray"]
    );
    assert_eq!(network.children("Cancer"), Some(vec!["Xray"]));
    assert_eq!(network.parents("Cancer"), Some(vec!["Smoking", "Pollution"]));
    assert_eq!(
        network.markov_blanket("Smoking"),
        Some(vec!["Pollution", "Cancer"])
    );
    assert_eq!(network.parameter_count(), 1 + 1 + 4 + 2);
    assert_eq!(network.cpd("Cancer").map(|c| c.shape()), Some((2, 4)));
    assert!(network.variable("Dyspnoea").is_none());
}
