//! Concord DAO node: owns every component and wires them together.
//!
//! The node:
//! - Holds the governance engine, oracle network, reward controller and
//!   treasury over one injected clock and ledger
//! - Routes executed governance actions to the component they govern
//! - Persists and restores the full state through the store traits
//! - Replays timed call scripts deterministically

pub mod config;
mod dispatch;
pub mod error;
pub mod node;
pub mod script;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::ConcordNode;
pub use script::{parse_script, Call, CallOutcome, ScriptStep};
