//! Shared application state.

use std::time::Instant;

use quorum_graph::ChatGraph;

pub struct AppState {
    pub graph: ChatGraph,
    start_time: Instant,
}

impl AppState {
    pub fn new(graph: ChatGraph) -> Self {
        Self {
            graph,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
