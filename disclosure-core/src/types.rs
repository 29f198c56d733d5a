//! Core types for the disclosure workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Principal identity (public key, account identifier, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null identity
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only identities are null
    pub fn is_null(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Role required by a workflow operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// System owner; may replace the regulator
    Owner,
    /// Sole regulator; manages entities, periods and reports
    Regulator,
    /// Authorized reporting entity
    Entity,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Regulator => write!(f, "regulator"),
            Role::Entity => write!(f, "an authorized entity"),
        }
    }
}

/// Reporting period identifier (dense, starting at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodId(u64);

impl PeriodId {
    /// First period, created at initialization
    pub const FIRST: PeriodId = PeriodId(1);

    /// Create from raw value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Report identifier (global across periods, starting at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(u64);

impl ReportId {
    /// First report id handed out
    pub const FIRST: ReportId = ReportId(1);

    /// Create from raw value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plaintext metadata accompanying a sealed payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Self-declared risk score (0-100), if disclosed in the clear
    pub risk_score: Option<u8>,
}

impl ReportMetadata {
    /// Metadata carrying only a risk score
    pub fn with_risk_score(score: u8) -> Self {
        Self {
            risk_score: Some(score),
        }
    }
}

/// Public view of a report; never includes the sealed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInfo {
    /// Report id
    pub report_id: ReportId,
    /// Submitting entity
    pub submitter: Principal,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
    /// Period the report belongs to
    pub period_id: PeriodId,
    /// Verified by the regulator
    pub verified: bool,
    /// Processed by the regulator
    pub processed: bool,
}

/// Permission for an analyst to decrypt one verified report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Report the grant covers
    pub report_id: ReportId,
    /// Analyst receiving access
    pub grantee: Principal,
    /// Grant time
    pub granted_at: DateTime<Utc>,
}
