//! Fundamental types for the Concord DAO core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! principals, amounts, logical time, digests, protocol parameters, the shared
//! error taxonomy, consensus records, and the capability traits through which
//! the core talks to its host environment (clock, fund transfer, hashing).

pub mod address;
pub mod amount;
pub mod capability;
pub mod consensus;
pub mod error;
pub mod hash;
pub mod network;
pub mod params;
pub mod time;

pub use address::Principal;
pub use amount::Amount;
pub use capability::{Clock, CommitHasher, FundTransfer, MultiSig, Oracle, TransferError};
pub use consensus::{ConsensusRecord, ContributionReport, RoundId};
pub use error::{ErrorKind, ParamError};
pub use hash::Digest;
pub use network::NetworkId;
pub use params::{
    check_economic_security, CurveKind, GovernanceParams, OracleParams, RewardCurve, RiskTier,
    TreasuryParams, BPS_DENOMINATOR,
};
pub use time::Timestamp;
