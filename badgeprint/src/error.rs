//!
//! Print pipeline error
//!
use std::{io, path::PathBuf, time::Duration};

use http::uri::InvalidUri;

use crate::model::{PrintStatus, TargetId};

/// Print pipeline error
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("No printer selected")]
    /// Neither the request nor the selection store named a target
    NoTargetSelected,

    #[error("Document not found: {}", .path.display())]
    /// Local document is absent or unreadable
    DocumentNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Document request failed with HTTP status {0}")]
    /// Remote document request returned a non-2xx status
    FetchStatus(u16),

    #[error("Document download failed: {0}")]
    /// Network error while downloading a remote document
    Fetch(#[source] reqwest::Error),

    #[error("Document download timed out after {0:?}")]
    /// Document fetch exceeded its timeout
    FetchTimeout(Duration),

    #[error("Malformed transport payload: {0}")]
    /// Payload could not be decoded
    Encode(#[from] base64::DecodeError),

    #[error("A print job is already in flight for printer {0}")]
    /// Another attempt holds the in-flight guard for this target
    TargetBusy(TargetId),

    #[error("Print job rejected with HTTP status {status}: {message}")]
    /// Backend answered with a non-success status
    SubmitRejected { status: u16, message: String },

    #[error("Print job submission failed: {0}")]
    /// Network error while submitting a job
    Submit(#[source] reqwest::Error),

    #[error("Print job submission timed out after {0:?}")]
    /// Submit exceeded its timeout
    SubmitTimeout(Duration),

    #[error("Malformed backend response: {0}")]
    /// Backend response body could not be decoded
    MalformedResponse(#[from] serde_json::Error),

    #[error("Printer discovery failed: {0}")]
    /// Target listing failed
    Discovery(String),

    #[error("Unsupported document locator: {0}")]
    /// Locator scheme is neither `file` nor `http(s)`
    InvalidLocator(String),

    #[error(transparent)]
    /// Invalid URI
    InvalidUri(#[from] InvalidUri),

    #[error("Invalid print options: {0}")]
    /// Options violate an invariant
    InvalidOptions(String),

    #[error("Print attempt cancelled")]
    /// Caller abandoned the attempt
    Cancelled,
}

impl PrintError {
    /// Map this error to the status reported to the user.
    ///
    /// Discovery, locator and option errors happen outside of the pipeline proper
    /// and land in the [`PrintStatus::UnknownError`] bucket.
    pub fn status(&self) -> PrintStatus {
        match self {
            PrintError::NoTargetSelected => PrintStatus::NoTargetSelected,
            PrintError::DocumentNotFound { .. } => PrintStatus::DocumentNotFound,
            PrintError::FetchStatus(_) | PrintError::Fetch(_) | PrintError::FetchTimeout(_) => PrintStatus::FetchFailed,
            PrintError::TargetBusy(_)
            | PrintError::SubmitRejected { .. }
            | PrintError::Submit(_)
            | PrintError::SubmitTimeout(_)
            | PrintError::MalformedResponse(_) => PrintStatus::SubmitFailed,
            PrintError::Encode(_)
            | PrintError::Discovery(_)
            | PrintError::InvalidLocator(_)
            | PrintError::InvalidUri(_)
            | PrintError::InvalidOptions(_)
            | PrintError::Cancelled => PrintStatus::UnknownError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let not_found = PrintError::DocumentNotFound {
            path: PathBuf::from("/missing.pdf"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(not_found.status(), PrintStatus::DocumentNotFound);
        assert_eq!(PrintError::FetchStatus(404).status(), PrintStatus::FetchFailed);
        assert_eq!(
            PrintError::FetchTimeout(Duration::from_secs(10)).status(),
            PrintStatus::FetchFailed
        );
        assert_eq!(
            PrintError::TargetBusy(TargetId::from("34")).status(),
            PrintStatus::SubmitFailed
        );
        assert_eq!(
            PrintError::SubmitTimeout(Duration::from_secs(30)).status(),
            PrintStatus::SubmitFailed
        );
        assert_eq!(PrintError::NoTargetSelected.status(), PrintStatus::NoTargetSelected);
        assert_eq!(PrintError::Cancelled.status(), PrintStatus::UnknownError);
    }

    #[test]
    fn test_rejected_message() {
        let err = PrintError::SubmitRejected {
            status: 401,
            message: "API key not found".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Print job rejected with HTTP status 401: API key not found"
        );
    }
}
