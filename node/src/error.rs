use concord_types::{ErrorKind, ParamError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] concord_governance::GovernanceError),

    #[error("oracle error: {0}")]
    Oracle(#[from] concord_oracle::OracleError),

    #[error("reward error: {0}")]
    Rewards(#[from] concord_rewards::RewardError),

    #[error("treasury error: {0}")]
    Treasury(#[from] concord_treasury::TreasuryError),

    #[error("store error: {0}")]
    Store(#[from] concord_store::StoreError),

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),

    #[error("store schema version {found:?}, node expects {expected}")]
    SchemaMismatch { found: Option<u32>, expected: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Governance(e) => e.kind(),
            Self::Oracle(e) => e.kind(),
            Self::Rewards(e) => e.kind(),
            Self::Treasury(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::InvalidParameter(_) | Self::Config(_) => ErrorKind::InvalidParameter,
            Self::SchemaMismatch { .. } | Self::Io(_) => ErrorKind::InvalidState,
        }
    }
}
