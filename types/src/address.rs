//! Principal identity type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An identity principal: a signer, an oracle operator, a contributor, or a
/// system account owned by the core itself.
///
/// The core never authenticates principals; the host environment tells it
/// who is calling. System accounts carry the `sys:` prefix and are never
/// valid external callers.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Prefix reserved for accounts owned by the core.
    pub const SYSTEM_PREFIX: &'static str = "sys:";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The account that holds treasury funds and receives slashed stake.
    pub fn treasury() -> Self {
        Self::system("treasury")
    }

    /// The account that escrows oracle operator stake.
    pub fn oracle_escrow() -> Self {
        Self::system("oracle-escrow")
    }

    /// The account that contributor rewards are paid from.
    pub fn reward_pool() -> Self {
        Self::system("reward-pool")
    }

    fn system(name: &str) -> Self {
        Self(format!("{}{}", Self::SYSTEM_PREFIX, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_system(&self) -> bool {
        self.0.starts_with(Self::SYSTEM_PREFIX)
    }

    /// Whether this principal may act as an external caller.
    pub fn is_valid_caller(&self) -> bool {
        !self.0.is_empty() && !self.is_system()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Principal {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
