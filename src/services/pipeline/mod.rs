//! Discovery-and-notification pipeline
//!
//! Stages run strictly in order, each awaiting the previous:
//! `ResolveLocation -> InitializeSession -> FetchCollection -> ScanProximity
//! -> FilterCandidates -> DispatchAll`.
//!
//! Every stage returns a `Result`; the first `Err` short-circuits the run.
//! A missing device location ends the run successfully with nothing sent.
//! Dispatch is one candidate at a time so a fatal webhook error stops the
//! remaining sends and delivery order always equals candidate order.

mod invoke;

pub use invoke::{invoke, Completion};

use crate::domain::species::SpeciesTable;
use crate::domain::types::{Coordinates, NotificationCandidate, NotificationOutcome, Stage};
use crate::io::locator::{LocationProvider, ProviderError};
use crate::io::session::{
    AuthError, FetchError, GameSession, LocationUpdateError, SessionConnector, SessionCredentials,
};
use crate::io::webhook::{DispatchError, NotificationDispatcher, WebhookTransport};
use crate::services::collection::CollectionSnapshot;
use crate::services::filter::SightingFilter;
use crate::services::scanner::{ProximityScanner, ScanError};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) run id
pub fn new_run_id() -> String {
    Uuid::now_v7().to_string()
}


#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("location lookup failed: {0}")]
    Location(#[from] ProviderError),
    #[error("session login failed: {0}")]
    Login(#[from] AuthError),
    #[error("session location update failed: {0}")]
    SetLocation(#[from] LocationUpdateError),
    #[error("inventory fetch failed: {0}")]
    Inventory(#[source] FetchError),
    #[error("heartbeat fetch failed: {0}")]
    Heartbeat(#[source] FetchError),
    #[error("proximity scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("dispatch aborted after {delivered_before_abort} delivered: {source}")]
    Dispatch {
        delivered_before_abort: usize,
        #[source]
        source: DispatchError,
    },
}

impl PipelineError {
    /// Stage the run was in when it failed
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Location(_) => Stage::ResolveLocation,
            PipelineError::Login(_) | PipelineError::SetLocation(_) => Stage::InitializeSession,
            PipelineError::Inventory(_) => Stage::FetchCollection,
            PipelineError::Heartbeat(_) | PipelineError::Scan(_) => Stage::ScanProximity,
            PipelineError::Dispatch { .. } => Stage::DispatchAll,
        }
    }
}

/// Result of one successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: OffsetDateTime,
    /// `None` when no matching device reported a location
    pub location: Option<Coordinates>,
    pub collected: usize,
    pub sightings: usize,
    pub candidates: usize,
    /// One entry per candidate, in dispatch order
    pub outcomes: Vec<NotificationOutcome>,
}

impl RunReport {
    fn empty(run_id: String, started_at: OffsetDateTime) -> Self {
        Self {
            run_id,
            started_at,
            location: None,
            collected: 0,
            sightings: 0,
            candidates: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.delivered).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.delivered).count()
    }

    /// RFC 3339 start timestamp (UTC)
    pub fn started_at_rfc3339(&self) -> String {
        self.started_at.format(&Rfc3339).unwrap_or_default()
    }

    /// Log the run summary
    pub fn log(&self) {
        let elapsed_ms = (OffsetDateTime::now_utc() - self.started_at).whole_milliseconds().max(0) as u64;
        info!(
            run_id = %self.run_id,
            started_at = %self.started_at_rfc3339(),
            location_found = self.location.is_some(),
            collected = self.collected,
            sightings = self.sightings,
            candidates = self.candidates,
            delivered = self.delivered(),
            rejected = self.rejected(),
            elapsed_ms = elapsed_ms,
            "run_summary"
        );
    }
}

/// Wires the collaborators together; cheap to share, one run per `run()` call
pub struct Pipeline<L, C, T> {
    locator: L,
    connector: C,
    credentials: SessionCredentials,
    scanner: ProximityScanner,
    dispatcher: NotificationDispatcher<T>,
}

impl<L, C, T> Pipeline<L, C, T>
where
    L: LocationProvider,
    C: SessionConnector,
    T: WebhookTransport,
{
    pub fn new(
        locator: L,
        connector: C,
        credentials: SessionCredentials,
        species: Arc<SpeciesTable>,
        dispatcher: NotificationDispatcher<T>,
    ) -> Self {
        Self { locator, connector, credentials, scanner: ProximityScanner::new(species), dispatcher }
    }

    /// Execute one full run with a fresh run id
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.run_with_id(new_run_id()).await
    }

    /// Execute one run; every event emitted by the stages carries `run_id`
    pub async fn run_with_id(&self, run_id: String) -> Result<RunReport, PipelineError> {
        let span = info_span!("run", run_id = %run_id);
        self.execute(run_id).instrument(span).await
    }

    async fn execute(&self, run_id: String) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::empty(run_id, OffsetDateTime::now_utc());

        // ResolveLocation
        debug!(stage = %Stage::ResolveLocation, "stage_start");
        let Some(location) = self.locator.current_location().await? else {
            info!("no_device_location");
            return Ok(report);
        };
        report.location = Some(location);
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            "location_resolved"
        );

        // InitializeSession: the session lives only for this run
        debug!(stage = %Stage::InitializeSession, "stage_start");
        let mut session = self.connector.login(&self.credentials).await?;
        session.set_location(location).await?;

        // FetchCollection
        debug!(stage = %Stage::FetchCollection, "stage_start");
        let inventory = session.fetch_inventory().await.map_err(PipelineError::Inventory)?;
        let snapshot = CollectionSnapshot::build(&inventory);
        report.collected = snapshot.len();

        // ScanProximity
        debug!(stage = %Stage::ScanProximity, "stage_start");
        let heartbeat = session.heartbeat().await.map_err(PipelineError::Heartbeat)?;
        let sightings = self.scanner.scan(heartbeat)?;
        report.sightings = sightings.len();

        // FilterCandidates
        debug!(stage = %Stage::FilterCandidates, "stage_start");
        let candidates = SightingFilter::filter(sightings, &snapshot);
        report.candidates = candidates.len();
        info!(
            collected = report.collected,
            sightings = report.sightings,
            candidates = report.candidates,
            "candidates_selected"
        );

        // DispatchAll
        debug!(stage = %Stage::DispatchAll, "stage_start");
        report.outcomes = self.dispatch_all(&candidates).await?;

        Ok(report)
    }

    /// Deliver candidates in order, one in flight at a time. A rejected
    /// candidate is recorded and skipped; a fatal error stops the loop.
    pub async fn dispatch_all(
        &self,
        candidates: &[NotificationCandidate],
    ) -> Result<Vec<NotificationOutcome>, PipelineError> {
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match self.dispatcher.deliver(candidate).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) => {
                    let delivered_before_abort = outcomes.iter().filter(|o| o.delivered).count();
                    return Err(PipelineError::Dispatch { delivered_before_abort, source });
                }
            }
        }

        Ok(outcomes)
    }
}
