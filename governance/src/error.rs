use concord_types::{ErrorKind, ParamError, Principal, Timestamp};
use thiserror::Error;

use crate::action::DispatchError;
use crate::proposal::ProposalStatus;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("{0} is not a signer")]
    NotSigner(Principal),

    #[error("{signer} has already signed proposal {id}")]
    AlreadySigned { id: u64, signer: Principal },

    #[error("{signer} has already voted to cancel proposal {id}")]
    AlreadyVotedCancel { id: u64, signer: Principal },

    #[error("proposal {id} is {status:?}, expected {expected}")]
    WrongStatus {
        id: u64,
        status: ProposalStatus,
        expected: &'static str,
    },

    #[error("proposal {id} is timelocked until {until}")]
    TimelockActive { id: u64, until: Timestamp },

    #[error("proposal {id} stopped accepting signatures at {at}")]
    SigningClosed { id: u64, at: Timestamp },

    #[error("{0} is already a signer")]
    SignerExists(Principal),

    #[error("{0} is not in the signer set")]
    SignerNotFound(Principal),

    #[error("{0} cannot be a signer")]
    InvalidSigner(Principal),

    #[error("removing {0} would leave fewer signers than the policy requires")]
    SignerSetTooSmall(Principal),

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),

    #[error("dispatch of proposal {id} failed: {source}")]
    Dispatch { id: u64, source: DispatchError },

    #[error("storage: {0}")]
    Storage(String),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProposalNotFound(_) | Self::SignerNotFound(_) => ErrorKind::NotFound,
            Self::NotSigner(_) => ErrorKind::Unauthorized,
            Self::AlreadySigned { .. } | Self::AlreadyVotedCancel { .. } => {
                ErrorKind::AlreadySigned
            }
            Self::WrongStatus { .. } | Self::SignerSetTooSmall(_) | Self::Storage(_) => {
                ErrorKind::InvalidState
            }
            Self::TimelockActive { .. } => ErrorKind::TimelockActive,
            Self::SigningClosed { .. } => ErrorKind::DeadlinePassed,
            Self::SignerExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidSigner(_) | Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::Dispatch { source, .. } => source.kind,
        }
    }
}
