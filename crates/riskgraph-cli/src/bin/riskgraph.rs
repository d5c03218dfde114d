//! Riskgraph CLI - run posterior queries and what-if risk comparisons
//!
//! Usage:
//!   riskgraph <file>                                  # Validate a model file
//!   riskgraph <file> --list                           # Show variables and evidence sets
//!   riskgraph --builtin --query Discipline --evidence Parenting=1
//!   riskgraph --builtin --compare                     # Baseline vs. every other evidence set
//!   riskgraph <file> --compare --outcome Y --baseline Base --scenario Treated -o json
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::process;

use clap::{Parser, ValueEnum};
use riskgraph_core::model::juvenile;
use riskgraph_core::{
    compare_many, juvenile_risk_network, load_model, BayesianNetwork, EliminationOrder, Evidence,
    InferenceConfig, JointDistribution, QueryDiagnostics, ScenarioComparison, StateRef,
    VariableElimination,
};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "riskgraph")]
#[command(version)]
#[command(about = "Riskgraph - exact inference for discrete risk models")]
#[command(
    long_about = "Load a discrete Bayesian network, query posteriors, and compare the risk of an outcome under baseline and intervention evidence"
)]
struct Cli {
    /// Model description file
    #[arg(value_name = "FILE", required_unless_present = "builtin")]
    file: Option<String>,

    /// Use the built-in juvenile risk model instead of a file
    #[arg(long, conflicts_with = "file")]
    builtin: bool,

    /// List variables and evidence sets
    #[arg(short, long)]
    list: bool,

    /// Query variable (repeat for a joint query)
    #[arg(short, long = "query", value_name = "VAR")]
    queries: Vec<String>,

    /// Evidence assignment for --query
    #[arg(short, long = "evidence", value_name = "VAR=STATE", value_parser = parse_assignment)]
    evidence: Vec<(String, String)>,

    /// Compare an outcome's risk across evidence sets
    #[arg(short, long)]
    compare: bool,

    /// Outcome variable for --compare (built-in model: Discipline)
    #[arg(long, value_name = "VAR")]
    outcome: Option<String>,

    /// Adverse state of the outcome (default: its last state)
    #[arg(long, value_name = "STATE")]
    adverse: Option<String>,

    /// Baseline evidence set (default: the first declared)
    #[arg(long, value_name = "SET")]
    baseline: Option<String>,

    /// Scenario evidence set (repeatable; default: every other set)
    #[arg(long = "scenario", value_name = "SET")]
    scenarios: Vec<String>,

    /// Elimination order heuristic
    #[arg(long, value_enum, default_value_t = OrderArg::ReverseTopological)]
    order: OrderArg,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    ReverseTopological,
    MinNeighbors,
    MinWeight,
    MinFill,
}

impl From<OrderArg> for EliminationOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::ReverseTopological => EliminationOrder::ReverseTopological,
            OrderArg::MinNeighbors => EliminationOrder::MinNeighbors,
            OrderArg::MinWeight => EliminationOrder::MinWeight,
            OrderArg::MinFill => EliminationOrder::MinFill,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
}

/// A network plus its named evidence sets, from a file or the built-in model.
struct Model<'a> {
    name: String,
    network: &'a BayesianNetwork,
    evidence_sets: Vec<(String, Evidence)>,
}

impl Model<'_> {
    fn evidence(&self, name: &str) -> CliResult<&Evidence> {
        self.evidence_sets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
            .ok_or_else(|| format!("model '{}' has no evidence set '{}'", self.name, name).into())
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((var, state)) if !var.trim().is_empty() && !state.trim().is_empty() => {
            Ok((var.trim().to_string(), state.trim().to_string()))
        }
        _ => Err(format!("expected VAR=STATE, got '{}'", raw)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> CliResult<()> {
    let loaded;
    let model = if cli.builtin {
        Model {
            name: "JuvenileRisk".to_string(),
            network: juvenile_risk_network()?,
            evidence_sets: juvenile::evidence_sets()
                .into_iter()
                .map(|(name, evidence)| (name.to_string(), evidence))
                .collect(),
        }
    } else {
        let path = cli.file.as_deref().ok_or("no model file given")?;
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading file '{}': {}", path, e))?;
        loaded = load_model(&source)?;
        tracing::debug!(model = %loaded.name, variables = loaded.network.len(), "loaded model");
        Model {
            name: loaded.name.clone(),
            network: &loaded.network,
            evidence_sets: loaded.evidence_sets.clone(),
        }
    };

    let config = InferenceConfig {
        elimination_order: cli.order.into(),
        ..InferenceConfig::default()
    };
    let engine = VariableElimination::with_config(model.network, config)?;

    if cli.list {
        print_listing(&model, cli.output)?;
    }
    if !cli.queries.is_empty() {
        run_query(&model, &engine, cli)?;
    }
    if cli.compare {
        run_compare(&model, &engine, cli)?;
    }
    if !cli.list && cli.queries.is_empty() && !cli.compare {
        println!(
            "✓ Model '{}' is valid: {} variables, {} edges, {} evidence sets",
            model.name,
            model.network.len(),
            model.network.edges().len(),
            model.evidence_sets.len()
        );
    }
    Ok(())
}

fn print_listing(model: &Model<'_>, format: OutputFormat) -> CliResult<()> {
    let network = model.network;
    match format {
        OutputFormat::Json => {
            let variables: Vec<_> = network
                .topological_order()
                .into_iter()
                .filter_map(|name| network.variable(name))
                .map(|v| {
                    json!({
                        "name": v.name(),
                        "states": v.states().collect::<Vec<_>>(),
                        "parents": network.parents(v.name()).unwrap_or_default(),
                    })
                })
                .collect();
            let sets: Vec<&str> = model.evidence_sets.iter().map(|(n, _)| n.as_str()).collect();
            let out = json!({
                "model": model.name,
                "variables": variables,
                "parameters": network.parameter_count(),
                "evidence_sets": sets,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Summary => {
            println!("Model '{}' ({} free parameters)", model.name, network.parameter_count());
            println!("\nVariables ({}):", network.len());
            for name in network.topological_order() {
                let Some(variable) = network.variable(name) else {
                    continue;
                };
                let states: Vec<&str> = variable.states().collect();
                let parents = network.parents(name).unwrap_or_default();
                if parents.is_empty() {
                    println!("  - {} [{}]", name, states.join(", "));
                } else {
                    println!(
                        "  - {} [{}] given {}",
                        name,
                        states.join(", "),
                        parents.join(", ")
                    );
                }
            }
            if !model.evidence_sets.is_empty() {
                println!("\nEvidence sets ({}):", model.evidence_sets.len());
                for (name, evidence) in &model.evidence_sets {
                    println!("  - {} {{{}}}", name, describe(evidence));
                }
            }
        }
    }
    Ok(())
}

fn run_query(model: &Model<'_>, engine: &VariableElimination<'_>, cli: &Cli) -> CliResult<()> {
    let evidence: Evidence = cli.evidence.iter().cloned().collect();
    let (distribution, diagnostics) = engine.query_with_diagnostics(&cli.queries, &evidence)?;
    match cli.output {
        OutputFormat::Json => {
            let out = json!({
                "model": model.name,
                "query": cli.queries,
                "evidence": cli.evidence.iter().cloned().collect::<std::collections::BTreeMap<_, _>>(),
                "distribution": distribution,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Summary => print_distribution(&distribution, &evidence, &diagnostics),
    }
    Ok(())
}

fn print_distribution(
    distribution: &JointDistribution,
    evidence: &Evidence,
    diagnostics: &QueryDiagnostics,
) {
    let given = if evidence.is_empty() {
        String::new()
    } else {
        format!(" | {}", describe(evidence))
    };
    println!("P({}{})", distribution.variables().join(", "), given);
    for (labels, p) in distribution.entries() {
        println!("  {:<24} {:.4}", labels.join(", "), p);
    }
    println!(
        "\n{} eliminated, {} pruned, largest factor {} entries, P(evidence) = {:.6}",
        diagnostics.elimination_order.len(),
        diagnostics.pruned_count,
        diagnostics.max_factor_size,
        diagnostics.evidence_probability
    );
}

fn run_compare(model: &Model<'_>, engine: &VariableElimination<'_>, cli: &Cli) -> CliResult<()> {
    let outcome = match (&cli.outcome, cli.builtin) {
        (Some(outcome), _) => outcome.clone(),
        (None, true) => juvenile::OUTCOME.to_string(),
        (None, false) => return Err("--compare needs --outcome VAR".into()),
    };
    let adverse: StateRef = match &cli.adverse {
        Some(label) => StateRef::from(label.as_str()),
        None => {
            let variable = model
                .network
                .variable(&outcome)
                .ok_or_else(|| format!("unknown outcome variable '{}'", outcome))?;
            StateRef::Index(variable.cardinality() - 1)
        }
    };

    let baseline_name = match &cli.baseline {
        Some(name) => name.clone(),
        None => model
            .evidence_sets
            .first()
            .map(|(name, _)| name.clone())
            .ok_or("--compare needs at least one evidence set in the model")?,
    };
    let baseline = model.evidence(&baseline_name)?;

    let scenario_names: Vec<String> = if cli.scenarios.is_empty() {
        model
            .evidence_sets
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| *name != baseline_name)
            .collect()
    } else {
        cli.scenarios.clone()
    };
    if scenario_names.is_empty() {
        return Err("--compare needs at least one scenario evidence set".into());
    }
    let scenarios = scenario_names
        .iter()
        .map(|name| Ok((name.clone(), model.evidence(name)?.clone())))
        .collect::<CliResult<Vec<_>>>()?;

    let results = compare_many(engine, &outcome, adverse, baseline, &scenarios)?;

    match cli.output {
        OutputFormat::Json => {
            let comparisons: Vec<_> = results
                .iter()
                .map(|(name, comparison)| json!({ "scenario": name, "result": comparison }))
                .collect();
            let out = json!({
                "model": model.name,
                "baseline": baseline_name,
                "comparisons": comparisons,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Summary => {
            if let Some((_, first)) = results.first() {
                println!(
                    "P({} = {}) under '{}': {:.2}%\n",
                    first.outcome,
                    first.adverse_state,
                    baseline_name,
                    first.baseline_percent()
                );
            }
            for (name, comparison) in &results {
                print_comparison(name, comparison);
            }
        }
    }
    Ok(())
}

fn print_comparison(name: &str, comparison: &ScenarioComparison) {
    println!("  {}: {:.2}%", name, comparison.scenario_percent());
    if comparison.risk_increased() {
        println!(
            "    risk increases by {:.2} points",
            -comparison.absolute_reduction_points()
        );
    } else {
        println!(
            "    absolute reduction {:.2} points",
            comparison.absolute_reduction_points()
        );
    }
    if comparison.baseline_risk > 0.0 {
        println!(
            "    relative reduction {:.2}%",
            comparison.relative_reduction_percent()
        );
    } else {
        println!("    relative reduction undefined (baseline risk is zero)");
    }
}

fn describe(evidence: &Evidence) -> String {
    evidence
        .iter()
        .map(|(var, state)| format!("{}={}", var, state))
        .collect::<Vec<_>>()
        .join(", ")
}
