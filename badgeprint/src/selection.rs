//!
//! Target selection store
//!
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use crate::{
    model::{PrintTarget, TargetId},
    request::{PrintOptions, PrintQuality},
};

/// Source of the last printer picked by the user.
///
/// Consulted by the orchestrator when a request does not name a target.
pub trait TargetSelection: Send + Sync {
    fn selected_target(&self) -> Option<TargetId>;
}

/// No selection at all; every request must name its target
#[derive(Debug, Copy, Clone, Default)]
pub struct NoSelection;

impl TargetSelection for NoSelection {
    fn selected_target(&self) -> Option<TargetId> {
        None
    }
}

/// In-memory selection holding a snapshot of the selected printer
#[derive(Debug, Default)]
pub struct SelectedTarget {
    target: Mutex<Option<PrintTarget>>,
}

impl SelectedTarget {
    pub fn new() -> Self {
        SelectedTarget::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PrintTarget>> {
        self.target.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn select(&self, target: PrintTarget) {
        info!("Selected printer {} ({})", target.display_name, target.id);
        *self.lock() = Some(target);
    }

    pub fn deselect(&self) {
        *self.lock() = None;
    }

    /// Snapshot of the selected printer, possibly stale
    pub fn selected(&self) -> Option<PrintTarget> {
        self.lock().clone()
    }

    /// Check the selection against a fresh discovery result.
    ///
    /// A selected printer that vanished or went offline is dropped; a printer
    /// still present is replaced by its fresh snapshot. Returns whether a
    /// selection remains.
    pub fn revalidate(&self, discovered: &[PrintTarget]) -> bool {
        let mut selected = self.lock();
        let Some(current) = selected.as_ref() else {
            return false;
        };

        match discovered.iter().find(|t| t.id == current.id && t.is_online()) {
            Some(fresh) => {
                *selected = Some(fresh.clone());
                true
            }
            None => {
                info!("Selected printer {} is no longer available", current.id);
                *selected = None;
                false
            }
        }
    }

    /// Default job options for the selected printer
    pub fn default_options(&self, quality: PrintQuality) -> PrintOptions {
        match self.lock().as_ref() {
            Some(target) => PrintOptions::for_target(target, quality),
            None => PrintOptions {
                quality,
                ..PrintOptions::default()
            },
        }
    }
}

impl TargetSelection for SelectedTarget {
    fn selected_target(&self) -> Option<TargetId> {
        self.lock().as_ref().map(|t| t.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Availability, Capabilities};

    use super::*;

    fn target(id: &str, availability: Availability) -> PrintTarget {
        PrintTarget {
            id: TargetId::from(id),
            display_name: format!("Printer {id}"),
            description: None,
            availability,
            capabilities: Capabilities::default(),
        }
    }

    #[test]
    fn test_select_and_deselect() {
        let selection = SelectedTarget::new();
        assert!(selection.selected_target().is_none());

        selection.select(target("34", Availability::Online));
        assert_eq!(selection.selected_target(), Some(TargetId::from("34")));

        selection.deselect();
        assert!(selection.selected().is_none());
    }

    #[test]
    fn test_revalidate_drops_vanished_target() {
        let selection = SelectedTarget::new();
        selection.select(target("34", Availability::Online));

        assert!(!selection.revalidate(&[target("35", Availability::Online)]));
        assert!(selection.selected_target().is_none());
    }

    #[test]
    fn test_revalidate_drops_offline_target() {
        let selection = SelectedTarget::new();
        selection.select(target("34", Availability::Online));

        assert!(!selection.revalidate(&[target("34", Availability::Offline)]));
        assert!(selection.selected_target().is_none());
    }

    #[test]
    fn test_revalidate_refreshes_snapshot() {
        let selection = SelectedTarget::new();
        selection.select(target("34", Availability::Online));

        let mut fresh = target("34", Availability::Online);
        fresh.display_name = "Renamed".to_owned();
        assert!(selection.revalidate(&[fresh]));
        assert_eq!(selection.selected().unwrap().display_name, "Renamed");
    }

    #[test]
    fn test_default_options_without_selection() {
        let selection = SelectedTarget::new();
        let options = selection.default_options(PrintQuality::Standard);
        assert_eq!(options.resolution_dpi(), 300);
        assert_eq!(options.copies, 1);
    }
}
