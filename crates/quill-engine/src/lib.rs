//! Generation engine: decides how to build the writing prompt, drives the
//! agents, and commits finished segments into the session history.

pub mod classifier;
pub mod error;
pub mod operation;
pub mod orchestrator;
pub mod prompt;

pub use classifier::{classify, Classification};
pub use error::EngineError;
pub use operation::{Operation, OperationKind, Overrides};
pub use orchestrator::{EventStream, GenerationOrchestrator, OrchestratorConfig, SEGMENT_SEPARATOR};
