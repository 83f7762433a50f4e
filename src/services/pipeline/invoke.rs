//! Top-level invocation boundary
//!
//! Converts whatever a run produces into exactly one terminal signal for the
//! runtime. The run executes on its own task so a panic inside any stage is
//! reported as a failure instead of taking the process down.

use super::{new_run_id, Pipeline, RunReport};
use crate::domain::types::Stage;
use crate::io::locator::LocationProvider;
use crate::io::session::SessionConnector;
use crate::io::webhook::WebhookTransport;
use std::sync::Arc;
use tracing::error;

/// Terminal outcome of one invocation
#[derive(Debug)]
pub enum Completion {
    /// Full pipeline completed, including the no-location short-circuit
    Succeeded(RunReport),
    /// A fatal stage error or a panic; `stage` is `None` for panics
    Failed { run_id: String, stage: Option<Stage>, error: String },
}

impl Completion {
    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Succeeded(_))
    }
}

pub async fn invoke<L, C, T>(pipeline: Arc<Pipeline<L, C, T>>) -> Completion
where
    L: LocationProvider + 'static,
    C: SessionConnector + 'static,
    T: WebhookTransport + 'static,
{
    let run_id = new_run_id();
    let task_run_id = run_id.clone();
    let handle = tokio::spawn(async move { pipeline.run_with_id(task_run_id).await });

    match handle.await {
        Ok(Ok(report)) => {
            report.log();
            Completion::Succeeded(report)
        }
        Ok(Err(e)) => {
            let stage = e.stage();
            error!(run_id = %run_id, stage = %stage, error = %e, "run_failed");
            Completion::Failed { run_id, stage: Some(stage), error: e.to_string() }
        }
        Err(join_error) => {
            let error = if join_error.is_panic() {
                let payload = join_error.into_panic();
                if let Some(msg) = payload.downcast_ref::<&str>() {
                    format!("run panicked: {}", msg)
                } else if let Some(msg) = payload.downcast_ref::<String>() {
                    format!("run panicked: {}", msg)
                } else {
                    "run panicked".to_string()
                }
            } else {
                "run cancelled".to_string()
            };
            error!(run_id = %run_id, error = %error, "run_failed");
            Completion::Failed { run_id, stage: None, error }
        }
    }
}
