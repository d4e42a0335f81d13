//! Abstract storage traits for the Concord DAO core.
//!
//! Every storage backend implements these traits; components depend only on
//! the traits. Records cross the boundary as opaque bytes so that this crate
//! does not depend on the component crates that define them. Each component
//! encodes its own records.

pub mod claims;
pub mod error;
pub mod governance;
pub mod meta;
pub mod oracle;
pub mod treasury;

pub use claims::ClaimStore;
pub use error::StoreError;
pub use governance::GovernanceStore;
pub use meta::MetaStore;
pub use oracle::OracleStore;
pub use treasury::TreasuryStore;

/// Current on-disk layout version.
pub const SCHEMA_VERSION: u32 = 1;
