//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the core (clock, ledger, storage) sits behind
//! a trait. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! The daemon also uses them as its in-memory host.

pub mod clock;
pub mod ledger;
pub mod store;

pub use clock::NullClock;
pub use ledger::NullLedger;
pub use store::NullStore;
