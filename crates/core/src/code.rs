//! Account code value object.
//!
//! Historical journal rows reference accounts by code (not by a mutable
//! identity), so the code is validated once here and treated as immutable
//! everywhere else.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

const MAX_LEN: usize = 16;

/// Chart-of-accounts code, e.g. `"1010"`.
///
/// Globally unique within the registry, lexicographically sortable. Accepts
/// ASCII alphanumerics plus `.` and `-` (sub-account notation like `1010.01`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCode(String);

impl AccountCode {
    pub fn new(code: impl Into<String>) -> Result<Self, LedgerError> {
        let code = code.into();
        if code.is_empty() {
            return Err(LedgerError::validation("account code must not be empty"));
        }
        if code.len() > MAX_LEN {
            return Err(LedgerError::validation(format!(
                "account code longer than {MAX_LEN} chars: {code}"
            )));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(LedgerError::validation(format!(
                "account code contains invalid characters: {code}"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountCode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AccountCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
