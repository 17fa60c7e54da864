//!
//! Print job orchestration
//!
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    backend::PrintBackend,
    channel::PrintStatusChannel,
    error::PrintError,
    fetch::{DocumentFetcher, HttpDocumentFetcher, DEFAULT_FETCH_TIMEOUT},
    model::{AttemptId, JobId, Locale, PipelineOutcome, PrintStatus, TargetId},
    payload::{Base64Encoder, PayloadEncoder},
    request::PrintJobRequest,
    selection::{NoSelection, TargetSelection},
};

/// Default submit timeout
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum time a status banner stays visible before the terminal status
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Pipeline tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub fetch_timeout: Duration,
    pub submit_timeout: Duration,
    pub settle_delay: Duration,
    pub locale: Locale,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            locale: Locale::default(),
        }
    }
}

/// Targets with a submit in progress
#[derive(Debug, Default)]
struct InFlight(Mutex<HashSet<TargetId>>);

struct InFlightGuard<'a> {
    registry: &'a InFlight,
    target: TargetId,
}

impl InFlight {
    fn acquire(&self, target: &TargetId) -> Result<InFlightGuard<'_>, PrintError> {
        let mut targets = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !targets.insert(target.clone()) {
            return Err(PrintError::TargetBusy(target.clone()));
        }
        Ok(InFlightGuard {
            registry: self,
            target: target.clone(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.target);
    }
}

/// Builder to create print job orchestrator
pub struct PrintJobOrchestratorBuilder {
    backend: Arc<dyn PrintBackend>,
    fetcher: Option<Arc<dyn DocumentFetcher>>,
    encoder: Arc<dyn PayloadEncoder>,
    selection: Arc<dyn TargetSelection>,
    channel: PrintStatusChannel,
    config: PipelineConfig,
}

impl PrintJobOrchestratorBuilder {
    fn new(backend: Arc<dyn PrintBackend>) -> Self {
        PrintJobOrchestratorBuilder {
            backend,
            fetcher: None,
            encoder: Arc::new(Base64Encoder),
            selection: Arc::new(NoSelection),
            channel: PrintStatusChannel::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Use a custom document fetcher. Default is [`HttpDocumentFetcher`] with the fetch timeout.
    pub fn fetcher<F>(mut self, fetcher: F) -> Self
    where
        F: DocumentFetcher + 'static,
    {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Use a custom payload encoder. Default is [`Base64Encoder`].
    pub fn encoder<E>(mut self, encoder: E) -> Self
    where
        E: PayloadEncoder + 'static,
    {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Store consulted when a request names no target
    pub fn selection(mut self, selection: Arc<dyn TargetSelection>) -> Self {
        self.selection = selection;
        self
    }

    /// Channel receiving status transitions
    pub fn channel(mut self, channel: PrintStatusChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Replace the whole pipeline configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fetch_timeout(mut self, duration: Duration) -> Self {
        self.config.fetch_timeout = duration;
        self
    }

    pub fn submit_timeout(mut self, duration: Duration) -> Self {
        self.config.submit_timeout = duration;
        self
    }

    pub fn settle_delay(mut self, duration: Duration) -> Self {
        self.config.settle_delay = duration;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> PrintJobOrchestrator {
        let fetch_timeout = self.config.fetch_timeout;
        PrintJobOrchestrator {
            backend: self.backend,
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(HttpDocumentFetcher::new(fetch_timeout))),
            encoder: self.encoder,
            selection: self.selection,
            channel: self.channel,
            config: self.config,
            attempts: AtomicU64::new(0),
            in_flight: InFlight::default(),
        }
    }
}

/// Print pipeline: fetch, encode and submit one document per invocation.
///
/// Every invocation gets a fresh [`AttemptId`], writes [`PrintStatus::Printing`]
/// and ends in exactly one terminal status, written to the status channel and
/// returned as a [`PipelineOutcome`]. Nothing is retried. At most one attempt per
/// target may be between target resolution and the end of its submit; overlapping
/// attempts for a busy target fail with [`PrintStatus::SubmitFailed`] before any I/O.
pub struct PrintJobOrchestrator {
    backend: Arc<dyn PrintBackend>,
    fetcher: Arc<dyn DocumentFetcher>,
    encoder: Arc<dyn PayloadEncoder>,
    selection: Arc<dyn TargetSelection>,
    channel: PrintStatusChannel,
    config: PipelineConfig,
    attempts: AtomicU64,
    in_flight: InFlight,
}

impl PrintJobOrchestrator {
    /// Create orchestrator with default options
    pub fn new<B>(backend: B) -> Self
    where
        B: PrintBackend + 'static,
    {
        PrintJobOrchestrator::builder(backend).build()
    }

    /// Create orchestrator builder for setting extra options
    pub fn builder<B>(backend: B) -> PrintJobOrchestratorBuilder
    where
        B: PrintBackend + 'static,
    {
        PrintJobOrchestratorBuilder::new(Arc::new(backend))
    }

    /// Create orchestrator builder around a shared backend
    pub fn builder_shared(backend: Arc<dyn PrintBackend>) -> PrintJobOrchestratorBuilder {
        PrintJobOrchestratorBuilder::new(backend)
    }

    pub fn backend(&self) -> &dyn PrintBackend {
        self.backend.as_ref()
    }

    /// Status channel written by this orchestrator
    pub fn channel(&self) -> &PrintStatusChannel {
        &self.channel
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline for one request
    pub async fn print(&self, request: &PrintJobRequest) -> PipelineOutcome {
        self.print_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run the pipeline, aborting the in-flight stage once `cancel` fires.
    ///
    /// A cancelled attempt resets the channel to [`PrintStatus::Idle`] unless a
    /// newer attempt has started since.
    pub async fn print_with_cancel(&self, request: &PrintJobRequest, cancel: &CancellationToken) -> PipelineOutcome {
        let attempt = AttemptId(self.attempts.fetch_add(1, Ordering::SeqCst) + 1);
        let started = Instant::now();
        self.channel.write(PrintStatus::Printing, attempt);
        info!("Print attempt {} started for {}", attempt, request.locator());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PrintError::Cancelled),
            result = self.run(attempt, request) => result,
        };

        if settles(&result) {
            tokio::select! {
                _ = cancel.cancelled() => debug!("Attempt {} cancelled during settle delay", attempt),
                _ = sleep(self.config.settle_delay) => {}
            }
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.finish(attempt, result, duration_ms)
    }

    async fn run(&self, attempt: AttemptId, request: &PrintJobRequest) -> Result<JobId, PrintError> {
        let target = request
            .target()
            .filter(|t| !t.is_blank())
            .cloned()
            .or_else(|| self.selection.selected_target().filter(|t| !t.is_blank()))
            .ok_or(PrintError::NoTargetSelected)?;
        debug!("Attempt {} resolved printer {}", attempt, target);

        let _guard = self.in_flight.acquire(&target)?;

        let fetch_timeout = self.config.fetch_timeout;
        let document = timeout(fetch_timeout, self.fetcher.fetch(request.locator()))
            .await
            .map_err(|_| PrintError::FetchTimeout(fetch_timeout))??;

        let payload = self.encoder.encode(&document)?;

        let submit_timeout = self.config.submit_timeout;
        timeout(submit_timeout, self.backend.submit(&target, &payload, request))
            .await
            .map_err(|_| PrintError::SubmitTimeout(submit_timeout))?
    }

    fn finish(&self, attempt: AttemptId, result: Result<JobId, PrintError>, duration_ms: u64) -> PipelineOutcome {
        let locale = self.config.locale;
        let (status, job_id, detail) = match result {
            Ok(job_id) => {
                info!("Attempt {} printed as job {} in {} ms", attempt, job_id, duration_ms);
                (PrintStatus::Success, Some(job_id), None)
            }
            Err(PrintError::Cancelled) => {
                info!("Attempt {} cancelled after {} ms", attempt, duration_ms);
                self.channel.write(PrintStatus::Idle, attempt);
                let status = PrintError::Cancelled.status();
                return PipelineOutcome {
                    succeeded: false,
                    status,
                    message: status.message(locale).to_owned(),
                    detail: Some(PrintError::Cancelled.to_string()),
                    duration_ms,
                    attempt,
                    job_id: None,
                };
            }
            Err(e) => {
                let status = e.status();
                if status.is_unexpected() {
                    error!("Attempt {} failed: {}", attempt, e);
                } else {
                    warn!("Attempt {} failed with {}: {}", attempt, status, e);
                }
                (status, None, Some(e.to_string()))
            }
        };

        if !self.channel.write(status, attempt) {
            debug!("Attempt {} superseded, status {} not published", attempt, status);
        }

        PipelineOutcome {
            succeeded: status.is_success(),
            status,
            message: status.message(locale).to_owned(),
            detail,
            duration_ms,
            attempt,
            job_id,
        }
    }
}

/// Fail-fast and cancelled attempts report immediately
fn settles(result: &Result<JobId, PrintError>) -> bool {
    !matches!(result, Err(PrintError::NoTargetSelected) | Err(PrintError::Cancelled))
}
