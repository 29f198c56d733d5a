//! Reporting period management
//!
//! Periods are time windows with their own submission deadline. A new
//! period becomes current as soon as it is created, but older periods are
//! not closed automatically: several periods may accept submissions at
//! once until the regulator closes them or their deadline passes.
//!
//! A period accepts submissions iff it is `active` and `now <= deadline`.
//! Closing is permanent; an elapsed deadline is not a state change.

use crate::{types::PeriodId, Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reporting period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    /// Period ID
    pub id: PeriodId,

    /// Period start time
    pub start_time: DateTime<Utc>,

    /// Period end time
    pub end_time: DateTime<Utc>,

    /// Last instant at which submissions are accepted
    pub submission_deadline: DateTime<Utc>,

    /// False once the regulator closed the period
    pub active: bool,

    /// Accepted submissions
    pub total_submissions: u64,
}

impl ReportingPeriod {
    /// Whether a submission at `now` would be accepted
    pub fn accepts_submissions(&self, now: DateTime<Utc>) -> bool {
        self.active && now <= self.submission_deadline
    }
}

/// Period manager
#[derive(Debug, Clone)]
pub struct PeriodManager {
    /// Periods indexed by `id - 1`
    periods: Vec<ReportingPeriod>,

    current: PeriodId,
}

impl PeriodManager {
    /// Create manager with period 1 opened at `now`
    pub fn new(now: DateTime<Utc>, duration: Duration, submission_window: Duration) -> Result<Self> {
        let mut manager = Self {
            periods: Vec::new(),
            current: PeriodId::FIRST,
        };
        manager.create_period(now, duration, submission_window)?;
        Ok(manager)
    }

    pub(crate) fn from_parts(periods: Vec<ReportingPeriod>, current: PeriodId) -> Result<Self> {
        for (index, period) in periods.iter().enumerate() {
            if period.id.value() != index as u64 + 1 {
                return Err(Error::InvalidState(format!(
                    "period ids not dense: expected {}, found {}",
                    index + 1,
                    period.id
                )));
            }
        }
        let manager = Self { periods, current };
        if manager.period_info(current).is_err() {
            return Err(Error::InvalidState(format!(
                "current period {} does not exist",
                current
            )));
        }
        Ok(manager)
    }

    /// Open a new period starting at `now` and make it current
    pub fn create_period(
        &mut self,
        now: DateTime<Utc>,
        duration: Duration,
        submission_window: Duration,
    ) -> Result<&ReportingPeriod> {
        if duration <= Duration::zero() {
            return Err(Error::InvalidInput(format!(
                "period duration must be positive, got {}",
                duration
            )));
        }
        if submission_window < Duration::zero() || submission_window > duration {
            return Err(Error::InvalidInput(format!(
                "submission window {} must lie within period duration {}",
                submission_window, duration
            )));
        }

        let end_time = now
            .checked_add_signed(duration)
            .ok_or_else(|| Error::InvalidInput(format!("period duration {} overflows", duration)))?;

        let id = PeriodId::new(self.periods.len() as u64 + 1);
        let period = ReportingPeriod {
            id,
            start_time: now,
            end_time,
            submission_deadline: now + submission_window,
            active: true,
            total_submissions: 0,
        };

        tracing::info!(
            "Opened reporting period {} (deadline {}, ends {})",
            id,
            period.submission_deadline,
            period.end_time
        );

        self.periods.push(period);
        self.current = id;
        Ok(&self.periods[self.periods.len() - 1])
    }

    /// Close an active period; irreversible
    pub fn close_period(&mut self, id: PeriodId) -> Result<()> {
        let period = self.period_mut(id)?;

        if !period.active {
            return Err(Error::InvalidState(format!("period {} already closed", id)));
        }

        period.active = false;
        tracing::info!(
            "Closed reporting period {} after {} submissions",
            id,
            period.total_submissions
        );

        Ok(())
    }

    /// Most recently created period
    pub fn current_period(&self) -> PeriodId {
        self.current
    }

    /// Period by id
    pub fn period_info(&self, id: PeriodId) -> Result<&ReportingPeriod> {
        usize::try_from(id.value())
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.periods.get(index))
            .ok_or_else(|| Error::NotFound(format!("period {}", id)))
    }

    /// Fail unless period `id` accepts submissions at `now`
    pub fn ensure_accepting(&self, id: PeriodId, now: DateTime<Utc>) -> Result<()> {
        if self.period_info(id)?.accepts_submissions(now) {
            Ok(())
        } else {
            Err(Error::WindowClosed(id))
        }
    }

    /// Number of periods created so far
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// All periods in id order
    pub fn periods(&self) -> &[ReportingPeriod] {
        &self.periods
    }

    pub(crate) fn record_submission(&mut self, id: PeriodId) -> Result<()> {
        self.period_mut(id)?.total_submissions += 1;
        Ok(())
    }

    fn period_mut(&mut self, id: PeriodId) -> Result<&mut ReportingPeriod> {
        usize::try_from(id.value())
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.periods.get_mut(index))
            .ok_or_else(|| Error::NotFound(format!("period {}", id)))
    }
}
