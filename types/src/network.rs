//! Network identifier.

use serde::{Deserialize, Serialize};

use crate::params::{GovernanceParams, OracleParams};

/// Identifies which deployment a node serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production deployment.
    Live,
    /// The public test deployment.
    Test,
    /// Local development.
    Dev,
}

impl NetworkId {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Dev => "dev",
        }
    }

    /// Governance defaults for this network. Test and dev use short
    /// timelines so scenarios complete in a handful of blocks.
    pub fn governance_defaults(&self) -> GovernanceParams {
        match self {
            Self::Live => GovernanceParams::default(),
            Self::Test | Self::Dev => GovernanceParams {
                timelock: 10,
                proposal_ttl: 100,
                ..GovernanceParams::default()
            },
        }
    }

    /// Oracle defaults for this network.
    pub fn oracle_defaults(&self) -> OracleParams {
        match self {
            Self::Live => OracleParams::default(),
            Self::Test | Self::Dev => OracleParams {
                commit_duration: 5,
                reveal_duration: 5,
                ..OracleParams::default()
            },
        }
    }
}

impl std::str::FromStr for NetworkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "test" => Ok(Self::Test),
            "dev" => Ok(Self::Dev),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
