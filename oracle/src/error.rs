use concord_types::{Amount, ErrorKind, ParamError, Principal, RoundId, Timestamp, TransferError};
use thiserror::Error;

use crate::operator::OperatorStatus;
use crate::round::RoundPhase;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{0} is not an active operator")]
    NotActive(Principal),

    #[error("{0} cannot act as an operator")]
    InvalidCaller(Principal),

    #[error("operator {0} not found")]
    OperatorNotFound(Principal),

    #[error("{0} has already applied or been admitted")]
    AlreadyRegistered(Principal),

    #[error("stake {offered} is below the minimum {minimum}")]
    InsufficientStake { offered: Amount, minimum: Amount },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("operator {operator} is {status:?}")]
    WrongOperatorStatus {
        operator: Principal,
        status: OperatorStatus,
    },

    #[error("operator {operator} has an open commitment in round {round}")]
    PendingCommitment { operator: Principal, round: RoundId },

    #[error("round {0} not found")]
    RoundNotFound(RoundId),

    #[error("round {0} already exists")]
    RoundExists(RoundId),

    #[error("round {round} is {phase:?}, expected {expected}")]
    WrongPhase {
        round: RoundId,
        phase: RoundPhase,
        expected: &'static str,
    },

    #[error("round {round} stopped accepting reveals at {deadline}")]
    RevealDeadlinePassed { round: RoundId, deadline: Timestamp },

    #[error("round {round} cannot finalize before {deadline}")]
    RevealsStillOpen { round: RoundId, deadline: Timestamp },

    #[error("{operator} already committed in round {round}")]
    DuplicateCommit { round: RoundId, operator: Principal },

    #[error("{operator} never committed in round {round}")]
    NoCommit { round: RoundId, operator: Principal },

    #[error("{operator} already revealed in round {round}")]
    AlreadyRevealed { round: RoundId, operator: Principal },

    #[error("reveal from {operator} does not match its commitment in round {round}")]
    HashMismatch { round: RoundId, operator: Principal },

    #[error("oracle paused until {0}")]
    Paused(Timestamp),

    #[error("escrow transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),

    #[error("storage: {0}")]
    Storage(String),
}

impl OracleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotActive(_) | Self::InvalidCaller(_) => ErrorKind::Unauthorized,
            Self::OperatorNotFound(_) | Self::RoundNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyRegistered(_) | Self::RoundExists(_) => ErrorKind::AlreadyExists,
            Self::InsufficientStake { .. } => ErrorKind::InsufficientStake,
            Self::ZeroAmount | Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::WrongOperatorStatus { .. }
            | Self::PendingCommitment { .. }
            | Self::WrongPhase { .. }
            | Self::RevealsStillOpen { .. }
            | Self::AlreadyRevealed { .. }
            | Self::Paused(_)
            | Self::Storage(_) => ErrorKind::InvalidState,
            Self::RevealDeadlinePassed { .. } => ErrorKind::DeadlinePassed,
            Self::DuplicateCommit { .. } => ErrorKind::DuplicateCommit,
            Self::NoCommit { .. } => ErrorKind::NoCommit,
            Self::HashMismatch { .. } => ErrorKind::HashMismatch,
            Self::Transfer(TransferError::Insufficient { .. }) => ErrorKind::InsufficientFunds,
            Self::Transfer(_) => ErrorKind::InvalidState,
        }
    }
}
