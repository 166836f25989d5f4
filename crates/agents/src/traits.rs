use async_trait::async_trait;
use quorum_common::{ConversationState, Message, NextNode, Origin, Result};

/// The specialists the supervisor can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialistKind {
    Researcher,
    Coder,
}

impl SpecialistKind {
    pub fn origin(&self) -> Origin {
        match self {
            SpecialistKind::Researcher => Origin::Researcher,
            SpecialistKind::Coder => Origin::Coder,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpecialistKind::Researcher => "researcher",
            SpecialistKind::Coder => "coder",
        }
    }

    /// Parse a routing label, case-insensitively. Unknown labels are the
    /// caller's problem; the runner falls back to a default specialist.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "researcher" => Some(SpecialistKind::Researcher),
            "coder" => Some(SpecialistKind::Coder),
            _ => None,
        }
    }

    pub fn next_node(&self) -> NextNode {
        match self {
            SpecialistKind::Researcher => NextNode::Researcher,
            SpecialistKind::Coder => NextNode::Coder,
        }
    }
}

impl std::fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A worker node that reads the conversation and produces one answer
/// message attributed to its origin.
#[async_trait]
pub trait Specialist: Send + Sync {
    fn kind(&self) -> SpecialistKind;

    async fn answer(&self, state: &ConversationState) -> Result<Message>;
}
