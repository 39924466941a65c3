pub mod orchestrator;
pub mod summary;

pub use orchestrator::{WalkOrchestrator, WalkOrchestratorBuilder, WalkState};
pub use summary::WalkSummary;
