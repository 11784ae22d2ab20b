//! Strongly-typed identifiers used across the ledger.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Identifier of a journal entry row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered), which keeps physical insert order roughly
    /// aligned with id order. Prefer passing ids explicitly in tests for
    /// determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for EntryId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<EntryId> for Uuid {
    fn from(value: EntryId) -> Self {
        value.0
    }
}

impl FromStr for EntryId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| LedgerError::validation(format!("EntryId: {e}")))?;
        Ok(Self(uuid))
    }
}
