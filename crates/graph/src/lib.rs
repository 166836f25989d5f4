//! The routing workflow and its configuration. [`ChatGraph`] runs one
//! user turn; [`build_graph`] assembles it from a [`GraphConfig`].

pub mod config;
pub mod runner;

pub use config::{build_graph, CheckpointConfig, GraphConfig, SearchConfig};
pub use runner::ChatGraph;
