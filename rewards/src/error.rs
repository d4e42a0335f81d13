use concord_types::{ErrorKind, ParamError, Principal, Timestamp, TransferError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("{0} cannot claim rewards")]
    InvalidCaller(Principal),

    #[error("nothing to claim for {0}")]
    NothingToClaim(Principal),

    #[error("claims paused until {0}")]
    Paused(Timestamp),

    #[error("reward payout failed: {0}")]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),

    #[error("storage: {0}")]
    Storage(String),
}

impl RewardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCaller(_) => ErrorKind::Unauthorized,
            Self::NothingToClaim(_) => ErrorKind::NothingToClaim,
            Self::Paused(_) | Self::Storage(_) => ErrorKind::InvalidState,
            Self::Transfer(TransferError::Insufficient { .. }) => ErrorKind::InsufficientFunds,
            Self::Transfer(_) => ErrorKind::InvalidState,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }
}
