//! Source availability listing.
//!
//! Backs `tally sources` and `GET /sources`: one row per registered adapter
//! with its readiness and, when misconfigured, the reason.

use serde::Serialize;

use character_tally_core::Source;

use crate::traits::{AdapterRegistry, Availability};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: Source,
    pub status: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Status of every registered adapter, in registration order.
pub fn source_statuses(registry: &AdapterRegistry) -> Vec<SourceStatus> {
    registry
        .adapters()
        .iter()
        .map(|adapter| {
            let (status, reason) = match adapter.availability() {
                Availability::Ready => ("ready", None),
                Availability::Misconfigured(reason) => ("misconfigured", Some(reason)),
            };
            SourceStatus {
                source: adapter.source(),
                status,
                description: adapter.description().to_string(),
                reason,
            }
        })
        .collect()
}

pub fn print_sources(registry: &AdapterRegistry) {
    println!("{:<16} {:<14} DESCRIPTION", "SOURCE", "STATUS");
    for row in source_statuses(registry) {
        let description = match &row.reason {
            Some(reason) => format!("{} ({})", row.description, reason),
            None => row.description.clone(),
        };
        println!("{:<16} {:<14} {}", row.source, row.status, description);
    }
}
