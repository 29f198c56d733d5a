//! Verification and access control
//!
//! Reports move `Submitted → Verified → Processed`; both steps are one-way.
//! Analysts may be granted decryption access to verified reports only.
//! Grants are additive and there is no revocation.

use crate::{
    sealing::AccessGateway,
    submission::SubmissionLedger,
    types::{AccessGrant, Principal, ReportId},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Access controller
#[derive(Debug, Clone, Default)]
pub struct AccessController {
    /// Grants per report, in grant order
    grants: HashMap<ReportId, Vec<AccessGrant>>,

    granted: HashSet<(ReportId, Principal)>,
}

impl AccessController {
    /// Create controller with no grants
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_grants(grants: impl IntoIterator<Item = AccessGrant>) -> Self {
        let mut controller = Self::new();
        for grant in grants {
            controller.insert(grant);
        }
        controller
    }

    /// Mark a submitted report as verified
    pub fn verify(&self, ledger: &mut SubmissionLedger, report_id: ReportId) -> Result<()> {
        let report = ledger.report_mut(report_id)?;
        if report.verified {
            return Err(Error::AlreadyVerified(report_id));
        }

        report.verified = true;
        tracing::info!("Report {} verified", report_id);
        Ok(())
    }

    /// Mark a verified report as processed
    pub fn process(&self, ledger: &mut SubmissionLedger, report_id: ReportId) -> Result<()> {
        let report = ledger.report_mut(report_id)?;
        if !report.verified {
            return Err(Error::NotVerified(report_id));
        }
        if report.processed {
            return Err(Error::AlreadyProcessed(report_id));
        }

        report.processed = true;
        tracing::info!("Report {} processed", report_id);
        Ok(())
    }

    /// Grant `analyst` access to a verified report and inform the gateway
    pub fn grant_access(
        &mut self,
        ledger: &SubmissionLedger,
        report_id: ReportId,
        analyst: &Principal,
        now: DateTime<Utc>,
        gateway: &dyn AccessGateway,
    ) -> Result<&AccessGrant> {
        let report = ledger.report(report_id)?;
        if !report.verified {
            return Err(Error::NotVerified(report_id));
        }
        if analyst.is_null() {
            return Err(Error::InvalidPrincipal(
                "cannot grant access to the null identity".to_string(),
            ));
        }

        gateway.allow(&report.payload_handle(), analyst);
        tracing::info!("Granted {} access to report {}", analyst, report_id);

        Ok(self.insert(AccessGrant {
            report_id,
            grantee: analyst.clone(),
            granted_at: now,
        }))
    }

    /// Grants recorded for a report
    pub fn grants(&self, report_id: ReportId) -> &[AccessGrant] {
        self.grants
            .get(&report_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `analyst` holds at least one grant for the report
    pub fn has_access(&self, report_id: ReportId, analyst: &Principal) -> bool {
        self.granted.contains(&(report_id, analyst.clone()))
    }

    /// Total number of grants
    pub fn grant_count(&self) -> usize {
        self.grants.values().map(Vec::len).sum()
    }

    pub(crate) fn all_grants(&self) -> impl Iterator<Item = &AccessGrant> {
        self.grants.values().flatten()
    }

    fn insert(&mut self, grant: AccessGrant) -> &AccessGrant {
        self.granted.insert((grant.report_id, grant.grantee.clone()));
        let list = self.grants.entry(grant.report_id).or_default();
        list.push(grant);
        &list[list.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{MetadataBounds, RateLimitConfig},
        sealing::{InMemoryGateway, SealedPayload},
        types::{PeriodId, ReportMetadata},
    };

    fn ledger_with_report() -> (SubmissionLedger, ReportId) {
        let mut ledger = SubmissionLedger::new(RateLimitConfig::default(), MetadataBounds::default());
        let id = ledger
            .record(
                &Principal::new("bank-a"),
                SealedPayload::from_static(b"sealed"),
                ReportMetadata::default(),
                PeriodId::FIRST,
                Utc::now(),
            )
            .id;
        (ledger, id)
    }

    #[test]
    fn test_verify_then_process() {
        let (mut ledger, id) = ledger_with_report();
        let controller = AccessController::new();

        assert!(matches!(
            controller.process(&mut ledger, id),
            Err(Error::NotVerified(_))
        ));

        controller.verify(&mut ledger, id).unwrap();
        assert!(matches!(
            controller.verify(&mut ledger, id),
            Err(Error::AlreadyVerified(_))
        ));

        controller.process(&mut ledger, id).unwrap();
        assert!(matches!(
            controller.process(&mut ledger, id),
            Err(Error::AlreadyProcessed(_))
        ));

        let info = ledger.report_info(id).unwrap();
        assert!(info.verified && info.processed);
    }

    #[test]
    fn test_grant_requires_verification() {
        let (mut ledger, id) = ledger_with_report();
        let mut controller = AccessController::new();
        let gateway = InMemoryGateway::new();
        let analyst = Principal::new("analyst-x");

        let result = controller.grant_access(&ledger, id, &analyst, Utc::now(), &gateway);
        assert!(matches!(result, Err(Error::NotVerified(_))));
        assert_eq!(gateway.permission_count(), 0);

        controller.verify(&mut ledger, id).unwrap();
        controller
            .grant_access(&ledger, id, &analyst, Utc::now(), &gateway)
            .unwrap();

        assert!(controller.has_access(id, &analyst));
        let handle = ledger.report(id).unwrap().payload_handle();
        assert!(gateway.is_allowed(&handle, &analyst));
    }

    #[test]
    fn test_grants_are_additive() {
        let (mut ledger, id) = ledger_with_report();
        let mut controller = AccessController::new();
        let gateway = InMemoryGateway::new();
        controller.verify(&mut ledger, id).unwrap();

        for name in ["analyst-x", "analyst-y", "analyst-x"] {
            controller
                .grant_access(&ledger, id, &Principal::new(name), Utc::now(), &gateway)
                .unwrap();
        }

        assert_eq!(controller.grants(id).len(), 3);
        assert_eq!(controller.grant_count(), 3);
        assert_eq!(gateway.permission_count(), 2);
        assert!(matches!(
            controller.grant_access(&ledger, id, &Principal::null(), Utc::now(), &gateway),
            Err(Error::InvalidPrincipal(_))
        ));
        assert_eq!(controller.grant_count(), 3);
    }
}
