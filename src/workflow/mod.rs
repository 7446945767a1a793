//! The task workflow: phases, state, templates, and the engine that drives them.

pub mod defaults;
pub mod engine;
pub mod file_refs;
pub mod state;
pub mod status;
pub mod step;
pub mod template;

pub use engine::WorkflowEngine;
pub use state::{TaskMode, TaskState};
pub use step::WorkflowStep;
