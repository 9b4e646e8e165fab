//! Batch Lifecycle Module
//!
//! This module owns every write path a batch can take:
//! - BatchOrchestrator: transactional creation with identifier allocation
//! - UpdateAppender: append-only timeline growth and stage advancement
//! - RecallGate: the one-way administrative recall flag

pub mod orchestrator;

mod appender;
mod recall;


pub use appender::UpdateAppender;
pub use orchestrator::BatchOrchestrator;
pub use recall::RecallGate;
