//!
//! Client-side print job dispatch for cloud print relays. This crate can be used in several ways:
//! * running the whole pipeline (fetch, encode, submit) with [`PrintJobOrchestrator`](orchestrator::PrintJobOrchestrator).
//! * using the built-in PrintNode client directly for discovery and job submission.
//! * plugging custom fetchers, encoders or backends into the orchestrator through its traits.
//!
//! The following feature flags are supported:
//! * `native-tls` - HTTPS via the `native-tls` crate (default)
//! * `rustls` - HTTPS via `rustls` with native root certificates
//!
//! Implementation notes:
//! * every print attempt ends in exactly one [`PrintStatus`](model::PrintStatus), nothing is retried.
//! * status changes are published through a [`PrintStatusChannel`](channel::PrintStatusChannel);
//!   a late result of an older attempt never replaces the status of a newer one.
//! * at most one attempt per printer submits at a time; overlapping attempts are rejected.
//!
//! Usage example:
//!
//!```rust,no_run
//! use badgeprint::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrintNodeClient::new("api-key");
//!     let orchestrator = PrintJobOrchestrator::new(client);
//!
//!     let request = PrintJobRequest::builder("https://example.com/badge.pdf".parse()?)
//!         .target("71482")
//!         .high_quality(true)
//!         .build()?;
//!
//!     let outcome = orchestrator.print(&request).await;
//!     println!("{}: {}", outcome.status, outcome.message);
//!     Ok(())
//! }
//!```

pub mod backend;
pub mod channel;
pub mod client;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod model;
pub mod orchestrator;
pub mod payload;
pub mod request;
pub mod selection;
pub mod util;

#[cfg(test)]
mod testutil;

pub(crate) const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"), ";reqwest");

pub mod prelude {
    //!
    //! Common imports
    //!
    pub use http::Uri;
    pub use tokio_util::sync::CancellationToken;

    pub use crate::{
        backend::PrintBackend,
        channel::{PrintStatusChannel, StatusUpdate},
        client::{PrintNodeClient, PrintNodeClientBuilder},
        fetch::{DocumentFetcher, HttpDocumentFetcher},
        locator::DocumentLocator,
        model::*,
        orchestrator::{PipelineConfig, PrintJobOrchestrator, PrintJobOrchestratorBuilder},
        payload::{Base64Encoder, Document, PayloadEncoder, TransportPayload},
        request::{Duplex, Orientation, PrintJobRequest, PrintOptions, PrintQuality},
        selection::{NoSelection, SelectedTarget, TargetSelection},
    };

    pub use super::error::PrintError;
}
