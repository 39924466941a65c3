pub mod engine;

pub use engine::{CaptureEngine, CaptureOutcome, CaptureResult, CaptureSession, RewardRequest};
