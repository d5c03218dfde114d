//! Ready-made networks and loading networks from model descriptions.

pub mod juvenile;
pub mod loader;
