//! Services - the discovery-and-notification pipeline
//!
//! This module contains the core business logic services:
//! - `collection` - snapshot of already-collected species
//! - `scanner` - heartbeat to sightings
//! - `filter` - drops collected species from the sightings
//! - `pipeline` - stage orchestration and the top-level invocation boundary
//! - `scheduler` - repeated invocations until shutdown

pub mod collection;
pub mod filter;
pub mod pipeline;
pub mod scanner;
pub mod scheduler;

// Re-export commonly used types
pub use collection::CollectionSnapshot;
pub use filter::SightingFilter;
pub use pipeline::{invoke, Completion, Pipeline, PipelineError, RunReport};
pub use scanner::{ProximityScanner, ScanError};
pub use scheduler::run_every;
