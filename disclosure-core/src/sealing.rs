//! Boundary with the external encryption collaborator
//!
//! The core stores sealed payloads as opaque bytes and never decodes them.
//! Decryption rights are delegated to an [`AccessGateway`], which is told
//! who may open which payload and is solely responsible for enforcing it.

use crate::types::{Principal, ReportId};
use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque encrypted artifact; immutable once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload(Bytes);

impl SealedPayload {
    /// Wrap sealed bytes
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Wrap a static byte string
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no bytes were supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw sealed bytes, for handing back to the collaborator
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// BLAKE3 digest of the sealed bytes
    pub fn digest(&self) -> [u8; 32] {
        *blake3::hash(&self.0).as_bytes()
    }
}

/// Reference to a stored payload, as understood by the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadHandle {
    /// Report the payload belongs to
    pub report_id: ReportId,
    /// BLAKE3 digest of the sealed bytes
    pub digest: [u8; 32],
}

impl PayloadHandle {
    /// Handle for a payload stored under `report_id`
    pub fn new(report_id: ReportId, payload: &SealedPayload) -> Self {
        Self {
            report_id,
            digest: payload.digest(),
        }
    }
}

impl fmt::Display for PayloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.report_id,
            blake3::Hash::from(self.digest).to_hex()
        )
    }
}

/// Permission primitive of the encryption collaborator
pub trait AccessGateway: Send + Sync + fmt::Debug {
    /// Allow `principal` to decrypt the payload behind `handle`
    fn allow(&self, handle: &PayloadHandle, principal: &Principal);
}

/// In-process gateway that only records permissions
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    permissions: RwLock<HashSet<(PayloadHandle, Principal)>>,
}

impl InMemoryGateway {
    /// Create empty gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `principal` may decrypt the payload behind `handle`
    pub fn is_allowed(&self, handle: &PayloadHandle, principal: &Principal) -> bool {
        self.permissions
            .read()
            .contains(&(*handle, principal.clone()))
    }

    /// Number of recorded permissions
    pub fn permission_count(&self) -> usize {
        self.permissions.read().len()
    }
}

impl AccessGateway for InMemoryGateway {
    fn allow(&self, handle: &PayloadHandle, principal: &Principal) {
        self.permissions.write().insert((*handle, principal.clone()));
    }
}
