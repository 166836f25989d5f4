//! Common types shared across the quorum crates.
//!
//! This crate provides the foundational conversation model that the
//! workflow nodes, graph runner, and HTTP layer all operate on.

pub mod error;
pub mod message;
pub mod state;

pub use error::{QuorumError, Result};
pub use message::{Message, Origin};
pub use state::{ConversationState, NextNode, RoutingDecision, NO_ANSWER_FALLBACK};
