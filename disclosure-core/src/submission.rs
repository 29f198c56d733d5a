//! Submission ledger
//!
//! Stores one sealed report per (submitter, period) and tracks per-entity
//! rate-limit state. Checks and writes are split so the engine can run
//! every precondition before touching any state.

use crate::{
    config::{MetadataBounds, RateLimitConfig},
    sealing::{PayloadHandle, SealedPayload},
    types::{PeriodId, Principal, ReportId, ReportInfo, ReportMetadata},
    Error, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Confidential report as stored by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialReport {
    /// Report ID
    pub id: ReportId,

    /// Submitting entity
    pub submitter: Principal,

    /// Opaque artifact; never decoded here
    pub sealed_payload: SealedPayload,

    /// Plaintext metadata
    pub metadata: ReportMetadata,

    /// Period the report belongs to
    pub period_id: PeriodId,

    /// Submission time
    pub submitted_at: DateTime<Utc>,

    /// Verified by the regulator
    pub verified: bool,

    /// Processed by the regulator (implies verified)
    pub processed: bool,
}

impl ConfidentialReport {
    /// Public view without the payload
    pub fn info(&self) -> ReportInfo {
        ReportInfo {
            report_id: self.id,
            submitter: self.submitter.clone(),
            submitted_at: self.submitted_at,
            period_id: self.period_id,
            verified: self.verified,
            processed: self.processed,
        }
    }

    /// Collaborator handle for the sealed payload
    pub fn payload_handle(&self) -> PayloadHandle {
        PayloadHandle::new(self.id, &self.sealed_payload)
    }
}

/// Per-submitter rate-limit state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Time of the last accepted submission
    pub last_submission_time: Option<DateTime<Utc>>,

    /// Accepted submissions per period
    pub submissions_per_period: HashMap<PeriodId, u32>,
}

impl RateLimitState {
    /// Accepted submissions in `period_id`
    pub fn submissions_in(&self, period_id: PeriodId) -> u32 {
        self.submissions_per_period
            .get(&period_id)
            .copied()
            .unwrap_or(0)
    }

    fn record(&mut self, period_id: PeriodId, now: DateTime<Utc>) {
        self.last_submission_time = Some(now);
        *self.submissions_per_period.entry(period_id).or_insert(0) += 1;
    }
}

/// Submission ledger
#[derive(Debug, Clone)]
pub struct SubmissionLedger {
    /// Reports indexed by `id - 1`
    reports: Vec<ConfidentialReport>,

    /// (submitter, period) pairs that already have a report
    submitted: HashSet<(Principal, PeriodId)>,

    /// Report ids per period, in submission order
    by_period: HashMap<PeriodId, Vec<ReportId>>,

    rate_limits: HashMap<Principal, RateLimitState>,

    rate_limit: RateLimitConfig,

    bounds: MetadataBounds,
}

impl SubmissionLedger {
    /// Create empty ledger
    pub fn new(rate_limit: RateLimitConfig, bounds: MetadataBounds) -> Self {
        Self {
            reports: Vec::new(),
            submitted: HashSet::new(),
            by_period: HashMap::new(),
            rate_limits: HashMap::new(),
            rate_limit,
            bounds,
        }
    }

    pub(crate) fn from_parts(
        rate_limit: RateLimitConfig,
        bounds: MetadataBounds,
        reports: Vec<ConfidentialReport>,
        rate_limits: Vec<(Principal, RateLimitState)>,
    ) -> Result<Self> {
        let mut ledger = Self::new(rate_limit, bounds);
        for (index, report) in reports.into_iter().enumerate() {
            if report.id.value() != index as u64 + 1 {
                return Err(Error::InvalidState(format!(
                    "report ids not dense: expected {}, found {}",
                    index + 1,
                    report.id
                )));
            }
            if report.processed && !report.verified {
                return Err(Error::InvalidState(format!(
                    "report {} is processed but not verified",
                    report.id
                )));
            }
            if ledger.has_submitted(&report.submitter, report.period_id) {
                return Err(Error::InvalidState(format!(
                    "{} has more than one report for period {}",
                    report.submitter, report.period_id
                )));
            }
            ledger.index(&report);
            ledger.reports.push(report);
        }
        ledger.rate_limits.extend(rate_limits);
        Ok(ledger)
    }

    /// Check payload size and metadata against the configured bounds
    pub fn validate_input(&self, payload: &SealedPayload, metadata: &ReportMetadata) -> Result<()> {
        if payload.len() > self.bounds.max_payload_bytes {
            return Err(Error::InvalidInput(format!(
                "sealed payload is {} bytes, limit is {}",
                payload.len(),
                self.bounds.max_payload_bytes
            )));
        }
        if let Some(score) = metadata.risk_score {
            if score > self.bounds.max_risk_score {
                return Err(Error::InvalidInput(format!(
                    "risk score {} outside [0, {}]",
                    score, self.bounds.max_risk_score
                )));
            }
        }
        Ok(())
    }

    /// Check uniqueness and rate limits for a prospective submission
    pub fn check_submission(
        &self,
        submitter: &Principal,
        period_id: PeriodId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.has_submitted(submitter, period_id) {
            return Err(Error::AlreadySubmitted {
                entity: submitter.clone(),
                period_id,
            });
        }

        let Some(state) = self.rate_limits.get(submitter) else {
            return Ok(());
        };

        if let Some(last) = state.last_submission_time {
            let cooldown = self.rate_limit.cooldown();
            if now - last < cooldown {
                return Err(Error::RateLimited(format!(
                    "{} must wait until {} before submitting again",
                    submitter,
                    last + cooldown
                )));
            }
        }

        let count = state.submissions_in(period_id);
        if count >= self.rate_limit.max_submissions_per_period {
            return Err(Error::RateLimited(format!(
                "{} reached {} submissions for period {}",
                submitter, count, period_id
            )));
        }

        Ok(())
    }

    /// Store a report whose preconditions were already checked
    pub(crate) fn record(
        &mut self,
        submitter: &Principal,
        sealed_payload: SealedPayload,
        metadata: ReportMetadata,
        period_id: PeriodId,
        now: DateTime<Utc>,
    ) -> &ConfidentialReport {
        let report = ConfidentialReport {
            id: ReportId::new(self.reports.len() as u64 + 1),
            submitter: submitter.clone(),
            sealed_payload,
            metadata,
            period_id,
            submitted_at: now,
            verified: false,
            processed: false,
        };

        self.index(&report);
        self.rate_limits
            .entry(submitter.clone())
            .or_default()
            .record(period_id, now);
        self.reports.push(report);

        &self.reports[self.reports.len() - 1]
    }

    /// Whether `entity` has a report for `period_id`
    pub fn has_submitted(&self, entity: &Principal, period_id: PeriodId) -> bool {
        self.submitted.contains(&(entity.clone(), period_id))
    }

    /// Report by id
    pub fn report(&self, id: ReportId) -> Result<&ConfidentialReport> {
        Self::slot(id)
            .and_then(|index| self.reports.get(index))
            .ok_or_else(|| Error::NotFound(format!("report {}", id)))
    }

    /// Public view of a report
    pub fn report_info(&self, id: ReportId) -> Result<ReportInfo> {
        self.report(id).map(ConfidentialReport::info)
    }

    /// Report ids submitted for `period_id`
    pub fn reports_in_period(&self, period_id: PeriodId) -> &[ReportId] {
        self.by_period
            .get(&period_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rate-limit state of `entity`, if it ever submitted
    pub fn rate_limit_state(&self, entity: &Principal) -> Option<&RateLimitState> {
        self.rate_limits.get(entity)
    }

    /// Number of stored reports
    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    pub(crate) fn reports(&self) -> &[ConfidentialReport] {
        &self.reports
    }

    pub(crate) fn rate_limits(&self) -> impl Iterator<Item = (&Principal, &RateLimitState)> {
        self.rate_limits.iter()
    }

    pub(crate) fn report_mut(&mut self, id: ReportId) -> Result<&mut ConfidentialReport> {
        Self::slot(id)
            .and_then(|index| self.reports.get_mut(index))
            .ok_or_else(|| Error::NotFound(format!("report {}", id)))
    }

    fn index(&mut self, report: &ConfidentialReport) {
        self.submitted
            .insert((report.submitter.clone(), report.period_id));
        self.by_period
            .entry(report.period_id)
            .or_default()
            .push(report.id);
    }

    fn slot(id: ReportId) -> Option<usize> {
        usize::try_from(id.value()).ok().and_then(|n| n.checked_sub(1))
    }
}
