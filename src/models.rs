//! Serializable views handed to the reporting layer

use crate::activity::Activity;
use crate::stats::Stats;
use crate::traffic::Traffic;
use serde::Serialize;
use std::collections::BTreeMap;

/// Stats, protocol tally and traffic table of one queue at one instant
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub interface: String,
    pub active: bool,
    pub stats: Stats,
    pub protos: BTreeMap<String, u64>,
    pub traffic: BTreeMap<String, Traffic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    /// RFC 3339, UTC
    pub timestamp: String,
    #[serde(flatten)]
    pub activity: Activity,
}

impl ActivityRecord {
    pub fn now(activity: Activity) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            activity,
        }
    }
}
