//! Decentralized oracle network for the Concord DAO core.
//!
//! Staked operators report contribution data in rounds:
//! Open (commit) → Closed (reveal) → Finalized | Failed.
//!
//! - Operators commit `H(round ‖ operator ‖ salt ‖ value)` during the commit
//!   phase and reveal the value and salt afterwards.
//! - A round finalizes when enough committed stake revealed and one value
//!   carries the consensus threshold of revealed stake.
//! - Agreeing operators gain reliability, dissenters lose it, and committed
//!   operators who never reveal are slashed.
//!
//! Admission, removal and parameter changes are governance actions; the
//! submission path itself is open to every active operator.

pub mod error;
pub mod network;
pub mod operator;
pub mod round;

pub use error::OracleError;
pub use network::{FinalizeOutcome, OracleNetwork};
pub use operator::{DeactivationReason, ExitReason, OperatorStatus, OracleOperator};
pub use round::{FailureReason, Reveal, Round, RoundPhase, Submission, Tally};
