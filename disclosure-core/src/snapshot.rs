//! Point-in-time engine state for persistence and replay

use crate::{
    events::EventLog,
    period::ReportingPeriod,
    submission::{ConfidentialReport, RateLimitState},
    types::{AccessGrant, PeriodId, Principal},
    Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete workflow state
///
/// Collaborator-side permissions are not part of the snapshot; the gateway
/// owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Time the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// System owner
    pub owner: Principal,

    /// Regulator at snapshot time
    pub regulator: Principal,

    /// Authorized entities
    pub entities: Vec<Principal>,

    /// All periods in id order
    pub periods: Vec<ReportingPeriod>,

    /// Current period
    pub current_period: PeriodId,

    /// All reports in id order
    pub reports: Vec<ConfidentialReport>,

    /// Rate-limit state per submitter
    pub rate_limits: Vec<(Principal, RateLimitState)>,

    /// Access grants, grouped by report in grant order
    pub grants: Vec<AccessGrant>,

    /// Event log
    pub events: EventLog,
}

impl EngineSnapshot {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
