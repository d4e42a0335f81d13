//! Oracle storage trait: the `operators` and `rounds` tables.
//!
//! Consensus records live in their own sub-table keyed by finalization
//! sequence number so that readers can scan them in order.

use crate::StoreError;
use concord_types::{Principal, RoundId};

pub trait OracleStore {
    fn put_operator(&self, operator: &Principal, data: &[u8]) -> Result<(), StoreError>;
    fn delete_operator(&self, operator: &Principal) -> Result<(), StoreError>;
    fn iter_operators(&self) -> Result<Vec<(Principal, Vec<u8>)>, StoreError>;

    fn put_round(&self, round: &RoundId, data: &[u8]) -> Result<(), StoreError>;
    fn get_round(&self, round: &RoundId) -> Result<Option<Vec<u8>>, StoreError>;
    fn iter_rounds(&self) -> Result<Vec<(RoundId, Vec<u8>)>, StoreError>;

    fn put_consensus(&self, seq: u64, data: &[u8]) -> Result<(), StoreError>;
    /// All consensus records in ascending sequence order.
    fn iter_consensus(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;
}
