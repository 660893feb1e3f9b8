//! Run orchestration: scratch/output handling and the per-run state machine

pub mod config;
pub mod organizer;
pub mod run;

pub use config::PipelineConfig;
pub use organizer::{sanitize_component, OutputOrganizer, ScratchDir};
pub use run::{Pipeline, Preview, RunOutcome, RunState};
