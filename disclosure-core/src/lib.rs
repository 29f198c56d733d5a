//! Disclosure Core
//!
//! Permissioned submission and verification workflow for confidential
//! regulatory disclosures.
//!
//! # Architecture
//!
//! - **Principal Registry**: owner, regulator and authorized reporting entities
//! - **Period Manager**: reporting periods with a submission deadline
//! - **Submission Ledger**: one sealed report per (entity, period), rate limited
//! - **Access Controller**: Submitted → Verified → Processed, analyst grants
//! - **Workflow Engine**: role and timing checks, then delegation
//!
//! Report payloads are opaque sealed artifacts. The core never decodes them;
//! decryption rights are enforced by an external [`AccessGateway`].
//!
//! # Invariants
//!
//! - At most one report per (submitter, period)
//! - `processed` implies `verified`; both flags only ever go false → true
//! - Period and report ids are dense and strictly increasing
//! - Every operation commits completely or not at all
//!
//! # Example
//!
//! ```
//! use disclosure_core::{
//!     Config, InMemoryGateway, ManualClock, Principal, ReportMetadata, SealedPayload,
//!     WorkflowEngine,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> disclosure_core::Result<()> {
//! let config = Config::default();
//! let regulator = config.regulator.clone();
//! let mut engine = WorkflowEngine::new(
//!     config,
//!     Arc::new(ManualClock::default()),
//!     Arc::new(InMemoryGateway::new()),
//! )?;
//!
//! let bank = Principal::new("bank-a");
//! engine.authorize(&regulator, &bank)?;
//!
//! let period = engine.current_period();
//! let report_id = engine.submit(
//!     &bank,
//!     SealedPayload::from_static(b"ciphertext"),
//!     ReportMetadata::with_risk_score(35),
//!     period,
//! )?;
//!
//! engine.verify(&regulator, report_id)?;
//! assert!(engine.report_info(report_id)?.verified);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod access;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod period;
pub mod registry;
pub mod sealing;
pub mod snapshot;
pub mod submission;
pub mod types;

// Re-exports
pub use access::AccessController;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{SharedEngine, WorkflowEngine};
pub use error::{Error, ErrorKind, Result};
pub use events::{EventLog, EventRecord, WorkflowEvent};
pub use period::{PeriodManager, ReportingPeriod};
pub use registry::PrincipalRegistry;
pub use sealing::{AccessGateway, InMemoryGateway, PayloadHandle, SealedPayload};
pub use snapshot::EngineSnapshot;
pub use submission::{ConfidentialReport, RateLimitState, SubmissionLedger};
pub use types::*;
