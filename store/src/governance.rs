//! Governance storage trait: the `signers` and `proposals` tables.

use crate::StoreError;
use concord_types::Principal;

pub trait GovernanceStore {
    fn put_signer(&self, signer: &Principal, data: &[u8]) -> Result<(), StoreError>;
    fn delete_signer(&self, signer: &Principal) -> Result<(), StoreError>;
    fn iter_signers(&self) -> Result<Vec<(Principal, Vec<u8>)>, StoreError>;

    fn put_proposal(&self, id: u64, data: &[u8]) -> Result<(), StoreError>;
    fn get_proposal(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError>;
    /// All proposals in ascending id order.
    fn iter_proposals(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;
}
