//!
//! Print status broadcasting
//!
use std::sync::Arc;

use futures_util::stream::{self, Stream};
use log::trace;
use tokio::sync::watch;

use crate::model::{AttemptId, PrintStatus};

/// Current status together with the attempt that wrote it
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: PrintStatus,
    pub attempt: AttemptId,
}

/// Single-slot, last-write-wins status broadcaster.
///
/// Holds exactly one current status. Writes tagged with an attempt older than
/// the newest attempt seen so far are dropped, so a slow attempt resolving late
/// cannot hide the status of a newer one. Cloning yields another handle to the
/// same slot.
#[derive(Debug, Clone)]
pub struct PrintStatusChannel {
    inner: Arc<watch::Sender<StatusUpdate>>,
}

impl Default for PrintStatusChannel {
    fn default() -> Self {
        PrintStatusChannel::new()
    }
}

impl PrintStatusChannel {
    /// Create channel holding [`PrintStatus::Idle`]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(StatusUpdate::default());
        PrintStatusChannel {
            inner: Arc::new(sender),
        }
    }

    /// Replace the current status. Returns false when the write was stale.
    pub fn write(&self, status: PrintStatus, attempt: AttemptId) -> bool {
        let mut stale = false;
        self.inner.send_if_modified(|current| {
            if attempt < current.attempt {
                stale = true;
                return false;
            }
            let changed = current.status != status || current.attempt != attempt;
            *current = StatusUpdate { status, attempt };
            changed
        });
        if stale {
            trace!("Dropping stale status {status} from attempt {attempt}");
        }
        !stale
    }

    /// Current status
    pub fn read(&self) -> PrintStatus {
        self.inner.borrow().status
    }

    /// Current status and the attempt that wrote it
    pub fn current(&self) -> StatusUpdate {
        *self.inner.borrow()
    }

    /// Newest attempt seen by the channel
    pub fn attempt(&self) -> AttemptId {
        self.inner.borrow().attempt
    }

    /// Reset to [`PrintStatus::Idle`], keeping the attempt high-water mark
    pub fn clear(&self) {
        self.inner.send_if_modified(|current| {
            if current.status == PrintStatus::Idle {
                return false;
            }
            current.status = PrintStatus::Idle;
            true
        });
    }

    /// Receiver notified on every accepted change
    pub fn subscribe(&self) -> watch::Receiver<StatusUpdate> {
        self.inner.subscribe()
    }

    /// Stream of status changes, starting with the current value.
    ///
    /// Intermediate values may be skipped when the consumer is slower than the writer.
    pub fn updates(&self) -> impl Stream<Item = StatusUpdate> + Send + 'static {
        let mut receiver = self.subscribe();
        receiver.mark_changed();
        stream::unfold(receiver, |mut receiver| async move {
            receiver.changed().await.ok()?;
            let update = *receiver.borrow_and_update();
            Some((update, receiver))
        })
    }
}
