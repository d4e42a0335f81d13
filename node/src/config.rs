//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use concord_rewards::DEFAULT_MAX_RECORDS_PER_CLAIM;
use concord_types::{
    check_economic_security, Amount, GovernanceParams, NetworkId, OracleParams, Principal,
    RewardCurve, TreasuryParams,
};
use concord_utils::LogFormat;

use crate::NodeError;

/// Configuration for a Concord node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, and
/// each parameter table may be given in part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which deployment this node serves.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Most rewarding records a single claim pays out.
    #[serde(default = "default_max_records_per_claim")]
    pub max_records_per_claim: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. "info" or "warn,concord_oracle=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Governance signers at genesis.
    #[serde(default = "default_genesis_signers")]
    pub genesis_signers: Vec<Principal>,

    /// Principals allowed to settle Direct-tier disbursements.
    #[serde(default)]
    pub direct_signers: Vec<Principal>,

    /// Opening ledger balances for the in-memory host.
    #[serde(default)]
    pub genesis_balances: BTreeMap<Principal, Amount>,

    #[serde(default = "default_governance")]
    pub governance: GovernanceParams,

    #[serde(default = "default_oracle")]
    pub oracle: OracleParams,

    #[serde(default)]
    pub reward_curve: RewardCurve,

    #[serde(default)]
    pub treasury: TreasuryParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_genesis_signers() -> Vec<Principal> {
    (1..=5).map(|n| Principal::new(format!("signer-{n}"))).collect()
}

fn default_governance() -> GovernanceParams {
    NetworkId::Dev.governance_defaults()
}

fn default_oracle() -> OracleParams {
    NetworkId::Dev.oracle_defaults()
}

fn default_max_records_per_claim() -> usize {
    DEFAULT_MAX_RECORDS_PER_CLAIM
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Defaults for `network`, with that network's governance and oracle
    /// timelines.
    pub fn for_network(network: NetworkId) -> Self {
        Self {
            network,
            governance: network.governance_defaults(),
            oracle: network.oracle_defaults(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check every parameter set, and that slashing outweighs the reward
    /// budget, before a node is built from this config.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.governance.validate(self.genesis_signers.len())?;
        self.oracle.validate()?;
        self.reward_curve.validate()?;
        self.treasury.validate()?;
        check_economic_security(&self.oracle, &self.reward_curve)?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            genesis_signers: default_genesis_signers(),
            direct_signers: Vec::new(),
            genesis_balances: BTreeMap::new(),
            governance: default_governance(),
            oracle: default_oracle(),
            reward_curve: RewardCurve::default(),
            treasury: TreasuryParams::default(),
            max_records_per_claim: default_max_records_per_claim(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
