//! Workflow engine
//!
//! Composition root that wires the registry, period manager, submission
//! ledger and access controller together. Each public operation is one
//! transaction:
//!
//! 1. **Authorize**: check the caller's role
//! 2. **Validate**: run every precondition against current state
//! 3. **Commit**: mutate component state and append events
//!
//! Nothing is written until step 3, so a rejected operation leaves the
//! engine exactly as it found it.
//!
//! # Example
//!
//! ```
//! use disclosure_core::{Config, InMemoryGateway, SystemClock, WorkflowEngine};
//! use std::sync::Arc;
//!
//! # fn main() -> disclosure_core::Result<()> {
//! let engine = WorkflowEngine::new(
//!     Config::default(),
//!     Arc::new(SystemClock),
//!     Arc::new(InMemoryGateway::new()),
//! )?;
//! assert_eq!(engine.current_period().value(), 1);
//! # Ok(())
//! # }
//! ```

use crate::{
    access::AccessController,
    clock::Clock,
    events::{EventLog, EventRecord, WorkflowEvent},
    period::{PeriodManager, ReportingPeriod},
    registry::PrincipalRegistry,
    sealing::{AccessGateway, PayloadHandle, SealedPayload},
    snapshot::EngineSnapshot,
    submission::{RateLimitState, SubmissionLedger},
    types::{AccessGrant, PeriodId, Principal, ReportId, ReportInfo, ReportMetadata, Role},
    Config, Error, Result,
};
use chrono::Duration;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Workflow engine
#[derive(Debug)]
pub struct WorkflowEngine {
    config: Config,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn AccessGateway>,
    registry: PrincipalRegistry,
    periods: PeriodManager,
    ledger: SubmissionLedger,
    access: AccessController,
    events: EventLog,
}

impl WorkflowEngine {
    /// Initialize with period 1 opened from the configured defaults
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn AccessGateway>,
    ) -> Result<Self> {
        config.validate()?;

        let now = clock.now();
        let registry = PrincipalRegistry::new(config.owner.clone(), config.regulator.clone())?;
        let periods = PeriodManager::new(
            now,
            config.period.duration(),
            config.period.submission_window(),
        )?;
        let ledger = SubmissionLedger::new(config.rate_limit.clone(), config.metadata.clone());

        let mut events = EventLog::new();
        events.append(now, period_created(periods.period_info(PeriodId::FIRST)?));

        info!(
            "Started {} v{} (owner {}, regulator {})",
            config.service_name,
            config.service_version,
            registry.owner(),
            registry.regulator()
        );

        Ok(Self {
            config,
            clock,
            gateway,
            registry,
            periods,
            ledger,
            access: AccessController::new(),
            events,
        })
    }

    /// Rebuild an engine from a snapshot
    ///
    /// Rate limits and metadata bounds come from `config`; identities,
    /// periods, reports, grants and events come from the snapshot.
    /// Snapshots that break a workflow invariant fail with `InvalidState`.
    /// Submitter and analyst permissions are re-announced to `gateway`.
    pub fn restore(
        config: Config,
        snapshot: EngineSnapshot,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn AccessGateway>,
    ) -> Result<Self> {
        config.validate()?;

        let registry =
            PrincipalRegistry::from_parts(snapshot.owner, snapshot.regulator, snapshot.entities)?;
        let periods = PeriodManager::from_parts(snapshot.periods, snapshot.current_period)?;
        let ledger = SubmissionLedger::from_parts(
            config.rate_limit.clone(),
            config.metadata.clone(),
            snapshot.reports,
            snapshot.rate_limits,
        )?;

        check_consistency(&periods, &ledger)?;
        for grant in &snapshot.grants {
            let verified = ledger
                .report(grant.report_id)
                .map(|report| report.verified)
                .unwrap_or(false);
            if !verified {
                return Err(Error::InvalidState(format!(
                    "grant for missing or unverified report {}",
                    grant.report_id
                )));
            }
        }

        // The gateway keeps its own permissions; replay them so it agrees
        // with the restored reports and grants.
        for report in ledger.reports() {
            gateway.allow(&report.payload_handle(), &report.submitter);
        }
        for grant in &snapshot.grants {
            let handle = ledger.report(grant.report_id)?.payload_handle();
            gateway.allow(&handle, &grant.grantee);
        }

        info!(
            "Restored {} from snapshot taken at {} ({} periods, {} reports, {} events)",
            config.service_name,
            snapshot.taken_at,
            periods.period_count(),
            ledger.report_count(),
            snapshot.events.len()
        );

        Ok(Self {
            config,
            clock,
            gateway,
            registry,
            periods,
            ledger,
            access: AccessController::from_grants(snapshot.grants),
            events: snapshot.events,
        })
    }

    /// Capture the full workflow state
    pub fn snapshot(&self) -> EngineSnapshot {
        let mut rate_limits: Vec<(Principal, RateLimitState)> = self
            .ledger
            .rate_limits()
            .map(|(principal, state)| (principal.clone(), state.clone()))
            .collect();
        rate_limits.sort_by(|a, b| a.0.cmp(&b.0));

        let mut grants: Vec<AccessGrant> = self.access.all_grants().cloned().collect();
        grants.sort_by_key(|grant| grant.report_id);

        EngineSnapshot {
            taken_at: self.clock.now(),
            owner: self.registry.owner().clone(),
            regulator: self.registry.regulator().clone(),
            entities: self.registry.authorized_entities().cloned().collect(),
            periods: self.periods.periods().to_vec(),
            current_period: self.periods.current_period(),
            reports: self.ledger.reports().to_vec(),
            rate_limits,
            grants,
            events: self.events.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Principal registry
    // ---------------------------------------------------------------------

    /// Authorize an entity to submit (regulator only, idempotent)
    pub fn authorize(&mut self, caller: &Principal, entity: &Principal) -> Result<()> {
        traced("authorize", caller, || {
            if self.registry.authorize(caller, entity)? {
                info!("Entity {} authorized", entity);
            } else {
                debug!("Entity {} already authorized", entity);
            }
            self.emit(WorkflowEvent::EntityAuthorized {
                entity: entity.clone(),
            });
            Ok(())
        })
    }

    /// Revoke an entity's authorization (regulator only, idempotent)
    pub fn revoke(&mut self, caller: &Principal, entity: &Principal) -> Result<()> {
        traced("revoke", caller, || {
            if self.registry.revoke(caller, entity)? {
                info!("Entity {} revoked", entity);
            } else {
                debug!("Entity {} was not authorized", entity);
            }
            self.emit(WorkflowEvent::EntityRevoked {
                entity: entity.clone(),
            });
            Ok(())
        })
    }

    /// Replace the regulator (owner only)
    pub fn update_regulator(&mut self, caller: &Principal, new_regulator: &Principal) -> Result<()> {
        traced("update_regulator", caller, || {
            let previous = self.registry.update_regulator(caller, new_regulator)?;
            info!("Regulator changed from {} to {}", previous, new_regulator);
            self.emit(WorkflowEvent::RegulatorUpdated {
                previous,
                current: new_regulator.clone(),
            });
            Ok(())
        })
    }

    /// Whether `entity` may currently submit
    pub fn is_authorized(&self, entity: &Principal) -> bool {
        self.registry.is_authorized(entity)
    }

    /// Whether `principal` is the current regulator
    pub fn is_regulator(&self, principal: &Principal) -> bool {
        self.registry.is_regulator(principal)
    }

    /// System owner
    pub fn owner(&self) -> &Principal {
        self.registry.owner()
    }

    /// Current regulator
    pub fn regulator(&self) -> &Principal {
        self.registry.regulator()
    }

    // ---------------------------------------------------------------------
    // Periods
    // ---------------------------------------------------------------------

    /// Open a new period and make it current (regulator only)
    ///
    /// The previous period stays open until closed explicitly.
    pub fn create_period(
        &mut self,
        caller: &Principal,
        duration: Duration,
        submission_window: Duration,
    ) -> Result<PeriodId> {
        traced("create_period", caller, || {
            self.registry.require(caller, Role::Regulator)?;
            let now = self.clock.now();
            let period = self.periods.create_period(now, duration, submission_window)?;
            let event = period_created(period);
            let id = period.id;
            self.emit(event);
            Ok(id)
        })
    }

    /// Close an active period permanently (regulator only)
    pub fn close_period(&mut self, caller: &Principal, period_id: PeriodId) -> Result<()> {
        traced("close_period", caller, || {
            self.registry.require(caller, Role::Regulator)?;
            self.periods.close_period(period_id)?;
            self.emit(WorkflowEvent::ReportingPeriodClosed { period_id });
            Ok(())
        })
    }

    /// Most recently created period
    pub fn current_period(&self) -> PeriodId {
        self.periods.current_period()
    }

    /// Period by id
    pub fn period_info(&self, period_id: PeriodId) -> Result<&ReportingPeriod> {
        self.periods.period_info(period_id)
    }

    /// Number of periods created so far
    pub fn period_count(&self) -> usize {
        self.periods.period_count()
    }

    // ---------------------------------------------------------------------
    // Submissions
    // ---------------------------------------------------------------------

    /// Submit a sealed report for a period (authorized entities only)
    ///
    /// Checks run in this order and the first failure is returned:
    /// role, payload and metadata bounds, period existence and window,
    /// uniqueness, rate limit.
    pub fn submit(
        &mut self,
        caller: &Principal,
        sealed_payload: SealedPayload,
        metadata: ReportMetadata,
        period_id: PeriodId,
    ) -> Result<ReportId> {
        traced("submit", caller, || {
            let now = self.clock.now();

            self.registry.require(caller, Role::Entity)?;
            self.ledger.validate_input(&sealed_payload, &metadata)?;
            self.periods.ensure_accepting(period_id, now)?;
            self.ledger.check_submission(caller, period_id, now)?;

            self.periods.record_submission(period_id)?;
            let report = self
                .ledger
                .record(caller, sealed_payload, metadata, period_id, now);
            let report_id = report.id;
            self.gateway.allow(&report.payload_handle(), caller);

            info!(
                "Report {} submitted by {} for period {}",
                report_id, caller, period_id
            );
            self.emit(WorkflowEvent::ReportSubmitted {
                submitter: caller.clone(),
                report_id,
                period_id,
            });
            Ok(report_id)
        })
    }

    /// Whether `entity` has submitted for `period_id`
    pub fn has_submitted(&self, entity: &Principal, period_id: PeriodId) -> bool {
        self.ledger.has_submitted(entity, period_id)
    }

    /// Public view of a report (never the payload)
    pub fn report_info(&self, report_id: ReportId) -> Result<ReportInfo> {
        self.ledger.report_info(report_id)
    }

    /// Report ids submitted for a period
    pub fn reports_in_period(&self, period_id: PeriodId) -> Result<&[ReportId]> {
        self.periods.period_info(period_id)?;
        Ok(self.ledger.reports_in_period(period_id))
    }

    /// Rate-limit state of an entity, if it ever submitted
    pub fn rate_limit_state(&self, entity: &Principal) -> Option<&RateLimitState> {
        self.ledger.rate_limit_state(entity)
    }

    /// Number of stored reports
    pub fn report_count(&self) -> usize {
        self.ledger.report_count()
    }

    // ---------------------------------------------------------------------
    // Verification and access
    // ---------------------------------------------------------------------

    /// Verify a report (regulator only)
    pub fn verify(&mut self, caller: &Principal, report_id: ReportId) -> Result<()> {
        traced("verify", caller, || {
            self.registry.require(caller, Role::Regulator)?;
            self.access.verify(&mut self.ledger, report_id)?;
            self.emit(WorkflowEvent::ReportVerified {
                report_id,
                regulator: caller.clone(),
            });
            Ok(())
        })
    }

    /// Process a verified report (regulator only)
    pub fn process(&mut self, caller: &Principal, report_id: ReportId) -> Result<()> {
        traced("process", caller, || {
            self.registry.require(caller, Role::Regulator)?;
            self.access.process(&mut self.ledger, report_id)?;
            self.emit(WorkflowEvent::ReportProcessed { report_id });
            Ok(())
        })
    }

    /// Grant an analyst decryption access to a verified report (regulator only)
    pub fn grant_access(
        &mut self,
        caller: &Principal,
        report_id: ReportId,
        analyst: &Principal,
    ) -> Result<()> {
        traced("grant_access", caller, || {
            self.registry.require(caller, Role::Regulator)?;
            let now = self.clock.now();
            self.access.grant_access(
                &self.ledger,
                report_id,
                analyst,
                now,
                self.gateway.as_ref(),
            )?;
            self.emit(WorkflowEvent::AccessGranted {
                report_id,
                analyst: analyst.clone(),
            });
            Ok(())
        })
    }

    /// Grants recorded for a report
    pub fn access_grants(&self, report_id: ReportId) -> Result<&[AccessGrant]> {
        self.ledger.report(report_id)?;
        Ok(self.access.grants(report_id))
    }

    /// Collaborator handle for a report's sealed payload
    pub fn payload_handle(&self, report_id: ReportId) -> Result<PayloadHandle> {
        Ok(self.ledger.report(report_id)?.payload_handle())
    }

    /// Whether `analyst` was granted access to the report
    pub fn has_access(&self, report_id: ReportId, analyst: &Principal) -> bool {
        self.access.has_access(report_id, analyst)
    }

    // ---------------------------------------------------------------------
    // Events and configuration
    // ---------------------------------------------------------------------

    /// All events in emission order
    pub fn events(&self) -> &[EventRecord] {
        self.events.events()
    }

    /// Events with `sequence >= from`
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        self.events.events_since(from)
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn emit(&mut self, event: WorkflowEvent) {
        let now = self.clock.now();
        self.events.append(now, event);
    }
}

/// Engine shared across threads; operations are serialized by one lock
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<WorkflowEngine>>,
}

impl SharedEngine {
    /// Wrap an engine
    pub fn new(engine: WorkflowEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` as one transaction with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut WorkflowEngine) -> R) -> R {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }
}

fn period_created(period: &ReportingPeriod) -> WorkflowEvent {
    WorkflowEvent::ReportingPeriodCreated {
        period_id: period.id,
        start: period.start_time,
        end: period.end_time,
        deadline: period.submission_deadline,
    }
}

/// Reports must belong to known periods and period counters must match them
fn check_consistency(periods: &PeriodManager, ledger: &SubmissionLedger) -> Result<()> {
    for report in ledger.reports() {
        if periods.period_info(report.period_id).is_err() {
            return Err(Error::InvalidState(format!(
                "report {} belongs to unknown period {}",
                report.id, report.period_id
            )));
        }
    }
    for period in periods.periods() {
        let recorded = ledger.reports_in_period(period.id).len() as u64;
        if period.total_submissions != recorded {
            return Err(Error::InvalidState(format!(
                "period {} counts {} submissions but holds {} reports",
                period.id, period.total_submissions, recorded
            )));
        }
    }
    Ok(())
}

fn traced<T>(
    operation: &'static str,
    caller: &Principal,
    op: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let result = op();
    if let Err(ref err) = result {
        warn!("{} by {} rejected ({:?}): {}", operation, caller, err.kind(), err);
    }
    result
}
