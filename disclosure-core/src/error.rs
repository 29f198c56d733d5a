//! Error types for the disclosure workflow

use crate::types::{PeriodId, Principal, ReportId, Role};
use thiserror::Error;

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Workflow errors
///
/// Every rejected operation surfaces exactly one of these and leaves state
/// untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller does not hold the role the operation requires
    #[error("Unauthorized: {caller} is not {required}")]
    Unauthorized {
        /// Principal that issued the request
        caller: Principal,
        /// Role the operation requires
        required: Role,
    },

    /// Null identity, or an identity that would hold conflicting roles
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    /// Operation not valid in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Entity already submitted for this period
    #[error("Already submitted: {entity} for period {period_id}")]
    AlreadySubmitted {
        /// Submitting entity
        entity: Principal,
        /// Target period
        period_id: PeriodId,
    },

    /// Report already verified
    #[error("Report already verified: {0}")]
    AlreadyVerified(ReportId),

    /// Report already processed
    #[error("Report already processed: {0}")]
    AlreadyProcessed(ReportId),

    /// Report has not been verified yet
    #[error("Report not verified: {0}")]
    NotVerified(ReportId),

    /// Unknown period or report id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Metadata or payload outside configured bounds
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cooldown not elapsed or per-period cap reached
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Period is closed or past its submission deadline
    #[error("Submission window closed for period {0}")]
    WindowClosed(PeriodId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless error discriminant for callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Unauthorized`]
    Unauthorized,
    /// See [`Error::InvalidPrincipal`]
    InvalidPrincipal,
    /// See [`Error::InvalidState`]
    InvalidState,
    /// See [`Error::AlreadySubmitted`]
    AlreadySubmitted,
    /// See [`Error::AlreadyVerified`]
    AlreadyVerified,
    /// See [`Error::AlreadyProcessed`]
    AlreadyProcessed,
    /// See [`Error::NotVerified`]
    NotVerified,
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::InvalidInput`]
    InvalidInput,
    /// See [`Error::RateLimited`]
    RateLimited,
    /// See [`Error::WindowClosed`]
    WindowClosed,
    /// Configuration, serialization or IO failure outside a workflow operation
    Environment,
}

impl Error {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::InvalidPrincipal(_) => ErrorKind::InvalidPrincipal,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::AlreadySubmitted { .. } => ErrorKind::AlreadySubmitted,
            Error::AlreadyVerified(_) => ErrorKind::AlreadyVerified,
            Error::AlreadyProcessed(_) => ErrorKind::AlreadyProcessed,
            Error::NotVerified(_) => ErrorKind::NotVerified,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::RateLimited(_) => ErrorKind::RateLimited,
            Error::WindowClosed(_) => ErrorKind::WindowClosed,
            Error::Config(_) | Error::Serialization(_) | Error::Io(_) => ErrorKind::Environment,
        }
    }

    pub(crate) fn unauthorized(caller: &Principal, required: Role) -> Self {
        Error::Unauthorized {
            caller: caller.clone(),
            required,
        }
    }
}
