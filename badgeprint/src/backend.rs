//!
//! Print backend abstraction
//!
use async_trait::async_trait;

use crate::{
    error::PrintError,
    model::{JobId, PrintTarget, TargetId},
    payload::TransportPayload,
    request::PrintJobRequest,
};

/// Transport adapter for a print relay service.
///
/// Both calls make exactly one attempt. A successful [`submit`](PrintBackend::submit)
/// prints a physical page, so callers must never repeat it for the same logical request.
#[async_trait]
pub trait PrintBackend: Send + Sync {
    /// List the printers currently known to the backend.
    ///
    /// Failures are reported as [`PrintError::Discovery`].
    async fn list_targets(&self) -> Result<Vec<PrintTarget>, PrintError>;

    /// Submit a job and return the backend job id
    async fn submit(
        &self,
        target: &TargetId,
        payload: &TransportPayload,
        job: &PrintJobRequest,
    ) -> Result<JobId, PrintError>;
}
