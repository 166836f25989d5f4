use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use quorum_agents::tools::{PythonSandboxFactory, TavilySearch};
use quorum_agents::{CoderAgent, ResearcherAgent, Specialist, SupervisorNode, ValidatorNode};
use quorum_checkpoint::FileCheckpointStore;
use quorum_common::{QuorumError, Result};
use quorum_llm::{build_llm_client, LlmConfig};
use serde::{Deserialize, Serialize};

use crate::runner::ChatGraph;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// If not set, read from the TAVILY_API_KEY environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("TAVILY_API_KEY").ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "./data/checkpoints".to_string()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Top-level configuration for the workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub provider: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_sandbox_timeout_secs")]
    pub sandbox_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_sandbox_timeout_secs() -> u64 {
    30
}

impl GraphConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

/// Wire up the full graph from configuration: LLM client stack, search,
/// sandbox factory, checkpoint store, and the nodes on top of them.
pub fn build_graph(config: &GraphConfig) -> Result<ChatGraph> {
    let llm = build_llm_client(&config.provider)?;

    let search_key = config.search.resolve_api_key().ok_or_else(|| {
        QuorumError::Config(
            "Search API key not configured (set search.api_key or TAVILY_API_KEY)".to_string(),
        )
    })?;
    let search = Arc::new(TavilySearch::new(search_key, config.search.max_results));

    let sandboxes = Arc::new(PythonSandboxFactory::new(Duration::from_secs(
        config.sandbox_timeout_secs,
    )));

    let specialists: Vec<Arc<dyn Specialist>> = vec![
        Arc::new(ResearcherAgent::new(llm.clone(), search)),
        Arc::new(CoderAgent::new(llm.clone(), sandboxes)),
    ];

    let store = Arc::new(FileCheckpointStore::new(config.checkpoint.db_path.clone()));

    ChatGraph::new(
        SupervisorNode::new(llm.clone()),
        ValidatorNode::new(llm),
        specialists,
        store,
        config.max_attempts,
    )
}
