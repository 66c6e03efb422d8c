//! Error types shared across the engine.

mod engine_error;

pub use engine_error::EngineError;
