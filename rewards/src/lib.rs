//! Reward controller for the Concord DAO core.
//!
//! Contributors pull their rewards: a claim walks the finalized consensus
//! records published since the contributor's last claim, prices each with
//! the reward curve that was in force when it finalized, and pays the sum
//! out of the reward pool. There is no push path and no override.

pub mod claim;
pub mod controller;
pub mod curve;
pub mod error;

pub use claim::{ClaimReceipt, ClaimRecord};
pub use controller::{RewardController, DEFAULT_MAX_RECORDS_PER_CLAIM, SCAN_WINDOW_PER_RECORD};
pub use curve::{record_rewards, reward_for, CurveHistory, CurveSegment};
pub use error::RewardError;
