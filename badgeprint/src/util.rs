//!
//! High-level discovery helpers
//!
use std::time::Duration;

use log::{debug, warn};

use crate::{
    backend::PrintBackend,
    error::PrintError,
    model::{PrintTarget, TargetId},
};

/// Default timeout for a discovery round-trip
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(8);

/// List printers, giving up after `timeout`
pub async fn discover_targets(backend: &dyn PrintBackend, timeout: Duration) -> Result<Vec<PrintTarget>, PrintError> {
    debug!("Discovering printers");
    match tokio::time::timeout(timeout, backend.list_targets()).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Printer discovery timed out after {:?}", timeout);
            Err(PrintError::Discovery(format!("timed out after {timeout:?}")))
        }
    }
}

/// Printers currently online
pub fn online_targets(targets: &[PrintTarget]) -> Vec<&PrintTarget> {
    targets.iter().filter(|t| t.is_online()).collect()
}

/// Case-insensitive search on printer name, description and id
pub fn search_targets<'a>(targets: &'a [PrintTarget], query: &str) -> Vec<&'a PrintTarget> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return targets.iter().collect();
    }

    targets
        .iter()
        .filter(|t| {
            t.display_name.to_lowercase().contains(&query)
                || t.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || t.id.as_str().to_lowercase() == query
        })
        .collect()
}

/// Look up a printer by id in a discovery result
pub fn find_target<'a>(targets: &'a [PrintTarget], id: &TargetId) -> Option<&'a PrintTarget> {
    targets.iter().find(|t| &t.id == id)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::{
        model::{Availability, Capabilities, JobId},
        payload::TransportPayload,
        request::PrintJobRequest,
    };

    use super::*;

    fn targets() -> Vec<PrintTarget> {
        vec![
            PrintTarget {
                id: TargetId::from("34"),
                display_name: "Zebra ZD421".to_owned(),
                description: Some("Accueil badges".to_owned()),
                availability: Availability::Online,
                capabilities: Capabilities::default(),
            },
            PrintTarget {
                id: TargetId::from("35"),
                display_name: "Office Laser".to_owned(),
                description: None,
                availability: Availability::Offline,
                capabilities: Capabilities::default(),
            },
        ]
    }

    struct SlowBackend;

    #[async_trait]
    impl PrintBackend for SlowBackend {
        async fn list_targets(&self) -> Result<Vec<PrintTarget>, PrintError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(targets())
        }

        async fn submit(&self, _: &TargetId, _: &TransportPayload, _: &PrintJobRequest) -> Result<JobId, PrintError> {
            unreachable!()
        }
    }

    #[test]
    fn test_search_targets() {
        let targets = targets();
        assert_eq!(search_targets(&targets, "zebra").len(), 1);
        assert_eq!(search_targets(&targets, "BADGES")[0].id, TargetId::from("34"));
        assert_eq!(search_targets(&targets, "35")[0].display_name, "Office Laser");
        assert_eq!(search_targets(&targets, "  ").len(), 2);
        assert!(search_targets(&targets, "plotter").is_empty());
    }

    #[test]
    fn test_online_and_find() {
        let targets = targets();
        let online = online_targets(&targets);
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].id, TargetId::from("34"));
        assert!(find_target(&targets, &TargetId::from("35")).is_some());
        assert!(find_target(&targets, &TargetId::from("99")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_timeout() {
        let result = discover_targets(&SlowBackend, DEFAULT_DISCOVERY_TIMEOUT).await;
        assert!(matches!(result, Err(PrintError::Discovery(_))));
    }
}
