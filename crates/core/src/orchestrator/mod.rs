//! End-to-end mashup orchestration.
//!
//! The orchestrator owns the stage sequence and the run workspace. Front
//! ends depend only on the [`MashupRunner`] trait.

mod runner;

pub use runner::{MashupOrchestrator, MashupRunner};
