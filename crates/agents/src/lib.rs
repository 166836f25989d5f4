//! Workflow nodes: the supervisor that routes, the specialists that
//! answer, and the validator that gates answers before they reach the
//! user.

pub mod coder;
pub mod decision;
pub mod researcher;
pub mod supervisor;
pub mod tools;
pub mod traits;
pub mod validator;

pub use coder::CoderAgent;
pub use decision::parse_decision;
pub use researcher::ResearcherAgent;
pub use supervisor::SupervisorNode;
pub use traits::{Specialist, SpecialistKind};
pub use validator::{ValidatorNode, NO_ANSWER_SENTINEL};
