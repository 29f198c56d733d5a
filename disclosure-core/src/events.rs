//! Append-only event log for external observers

use crate::types::{PeriodId, Principal, ReportId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// Entity authorized to submit (also emitted when already authorized)
    EntityAuthorized {
        /// Entity
        entity: Principal,
    },
    /// Entity authorization revoked (also emitted when not authorized)
    EntityRevoked {
        /// Entity
        entity: Principal,
    },
    /// Regulator replaced by the owner
    RegulatorUpdated {
        /// Outgoing regulator
        previous: Principal,
        /// Incoming regulator
        current: Principal,
    },
    /// New reporting period opened
    ReportingPeriodCreated {
        /// Period id
        period_id: PeriodId,
        /// Start time
        start: DateTime<Utc>,
        /// End time
        end: DateTime<Utc>,
        /// Submission deadline
        deadline: DateTime<Utc>,
    },
    /// Reporting period closed
    ReportingPeriodClosed {
        /// Period id
        period_id: PeriodId,
    },
    /// Report submitted
    ReportSubmitted {
        /// Submitting entity
        submitter: Principal,
        /// Report id
        report_id: ReportId,
        /// Period id
        period_id: PeriodId,
    },
    /// Report verified
    ReportVerified {
        /// Report id
        report_id: ReportId,
        /// Verifying regulator
        regulator: Principal,
    },
    /// Report processed
    ReportProcessed {
        /// Report id
        report_id: ReportId,
    },
    /// Analyst granted decryption access
    AccessGranted {
        /// Report id
        report_id: ReportId,
        /// Analyst
        analyst: Principal,
    },
}

/// Event as stored in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0
    pub sequence: u64,
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,
    /// Time the emitting operation ran
    pub recorded_at: DateTime<Utc>,
    /// Event payload
    pub event: WorkflowEvent,
}

/// Append-only event log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number
    pub fn append(&mut self, recorded_at: DateTime<Utc>, event: WorkflowEvent) -> u64 {
        let sequence = self.records.len() as u64;
        tracing::debug!("event #{}: {:?}", sequence, event);
        self.records.push(EventRecord {
            sequence,
            event_id: Uuid::now_v7(),
            recorded_at,
            event,
        });
        sequence
    }

    /// All events in emission order
    pub fn events(&self) -> &[EventRecord] {
        &self.records
    }

    /// Events with `sequence >= from`
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Most recent event
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
