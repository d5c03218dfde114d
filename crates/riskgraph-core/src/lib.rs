//! # Riskgraph Core
//!
//! Exact inference over small discrete Bayesian networks, built for
//! what-if risk comparisons: how likely is an adverse outcome under a
//! baseline assignment of controllable factors, and how much does an
//! intervention change it.
//!
//! ```
//! use riskgraph_core::{compare, juvenile_risk_network, VariableElimination};
//! use riskgraph_core::model::juvenile::{self, ADVERSE_STATE, OUTCOME};
//!
//! let network = juvenile_risk_network()?;
//! let engine = VariableElimination::new(network);
//! let result = compare(
//!     &engine,
//!     OUTCOME,
//!     ADVERSE_STATE,
//!     &juvenile::baseline_evidence(),
//!     &juvenile::full_intervention_evidence(),
//! )?;
//! assert!((result.baseline_risk - 0.6).abs() < 1e-9);
//! # Ok::<(), riskgraph_core::InferenceError>(())
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod model;

// Re-export commonly used types
pub use engine::cpd::TabularCpd;
pub use engine::distribution::JointDistribution;
pub use engine::elimination::{InferenceConfig, MapAssignment, QueryDiagnostics, VariableElimination};
pub use engine::errors::InferenceError;
pub use engine::evidence::Evidence;
pub use engine::factor::Factor;
pub use engine::network::{BayesianNetwork, BuildConfig, NetworkBuilder};
pub use engine::ordering::EliminationOrder;
pub use engine::scenario::{compare, compare_many, ScenarioComparison};
pub use engine::variable::{StateRef, Variable, VariableId};
pub use model::juvenile::juvenile_risk_network;
pub use model::loader::{build_model, load_model, LoadedModel};
