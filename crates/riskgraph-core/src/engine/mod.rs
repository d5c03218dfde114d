//! The inference engine for discrete Bayesian networks.
//!
//! This module provides:
//! - **variable**: named variables with labelled, finite state domains
//! - **factor**: weight tables and their restrict/marginalize/product algebra
//! - **cpd**: conditional probability tables
//! - **network**: validated DAG of variables and CPDs
//! - **evidence**: partial assignments used to condition queries
//! - **elimination**: exact posterior queries by variable elimination
//! - **ordering**: elimination order heuristics
//! - **scenario**: baseline vs. intervention risk comparison

pub mod cpd;
pub mod distribution;
pub mod elimination;
pub mod errors;
pub mod evidence;
pub mod factor;
pub mod network;
pub mod ordering;
pub mod scenario;
pub mod variable;
