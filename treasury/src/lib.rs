//! Treasury manager for the Concord DAO core.
//!
//! Every disbursement is proposed first and classified into a risk tier by
//! amount. Direct-tier payouts may be executed by a designated direct
//! signer; Elevated and Critical payouts only through an executed
//! governance `Disburse` action. Both paths settle through the same
//! balance check and transfer.

pub mod action;
pub mod error;
pub mod manager;

pub use action::{ActionStatus, ApprovalPath, TreasuryAction};
pub use error::TreasuryError;
pub use manager::TreasuryManager;
