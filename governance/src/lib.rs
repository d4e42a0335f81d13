//! Multi-signature governance for the Concord DAO core.
//!
//! Lifecycle per proposal: Pending → Approved → Executed, or Cancelled /
//! Expired. A proposal needs the threshold (or supermajority) of signer
//! signatures captured when it was created, and may only execute once its
//! timelock has elapsed.
//!
//! Every privileged change in the DAO is a typed [`Action`]. Signer-set and
//! governance-parameter changes are applied by the engine itself; everything
//! else is handed to an [`ActionDispatcher`] together with a [`Warrant`],
//! which only the execution path can produce.

pub mod action;
pub mod engine;
pub mod error;
pub mod pause;
pub mod proposal;

pub use action::{Action, ActionDispatcher, DispatchError, Warrant};
pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use pause::{Governed, PauseState};
pub use proposal::{CancelOutcome, Proposal, ProposalStatus, SignerRecord};
