//! Integration test harness for the riskgraph workspace.
