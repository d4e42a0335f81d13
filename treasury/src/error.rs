use concord_types::{Amount, ErrorKind, ParamError, Principal, RiskTier, Timestamp, TransferError};
use thiserror::Error;

use crate::action::ActionStatus;

#[derive(Debug, Error)]
pub enum TreasuryError {
    #[error("{0} cannot act on the treasury")]
    InvalidCaller(Principal),

    #[error("{0} is not a direct-authority signer")]
    NotDirectSigner(Principal),

    #[error("{caller} did not propose treasury action {id}")]
    NotProposer { id: u64, caller: Principal },

    #[error("treasury action {id} is {tier:?} and needs a supermajority warrant")]
    SupermajorityRequired { id: u64, tier: RiskTier },

    #[error("treasury action {0} not found")]
    ActionNotFound(u64),

    #[error("direct signer {0} not found")]
    DirectSignerNotFound(Principal),

    #[error("{0} is already a direct signer")]
    DirectSignerExists(Principal),

    #[error("treasury action {id} is {status:?}")]
    WrongStatus { id: u64, status: ActionStatus },

    #[error("treasury action {id} is {tier:?}, beyond direct authority")]
    TierExceedsDirectAuthority { id: u64, tier: RiskTier },

    #[error("treasury action {id} is {actual:?}, warrant names {named:?}")]
    TierMismatch {
        id: u64,
        actual: RiskTier,
        named: RiskTier,
    },

    #[error("treasury holds {available}, needs {needed}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("paying {amount} from {balance} would breach the {reserve} reserve")]
    ReserveBreached {
        amount: Amount,
        balance: Amount,
        reserve: Amount,
    },

    #[error("invalid destination {0}")]
    InvalidDestination(Principal),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("direct disbursements paused until {0}")]
    Paused(Timestamp),

    #[error("treasury transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),

    #[error("storage: {0}")]
    Storage(String),
}

impl TreasuryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCaller(_)
            | Self::NotDirectSigner(_)
            | Self::NotProposer { .. }
            | Self::SupermajorityRequired { .. } => ErrorKind::Unauthorized,
            Self::ActionNotFound(_) | Self::DirectSignerNotFound(_) => ErrorKind::NotFound,
            Self::DirectSignerExists(_) => ErrorKind::AlreadyExists,
            Self::WrongStatus { .. } | Self::Paused(_) | Self::Storage(_) => ErrorKind::InvalidState,
            Self::TierExceedsDirectAuthority { .. } => ErrorKind::TierExceedsDirectAuthority,
            Self::InsufficientFunds { .. } | Self::ReserveBreached { .. } => {
                ErrorKind::InsufficientFunds
            }
            Self::Transfer(TransferError::Insufficient { .. }) => ErrorKind::InsufficientFunds,
            Self::Transfer(_) => ErrorKind::InvalidState,
            Self::TierMismatch { .. }
            | Self::InvalidDestination(_)
            | Self::ZeroAmount
            | Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }
}
