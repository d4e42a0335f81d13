//! Claim storage trait: the `claims` table.

use crate::StoreError;
use concord_types::Principal;

pub trait ClaimStore {
    fn put_claim(&self, contributor: &Principal, data: &[u8]) -> Result<(), StoreError>;
    fn get_claim(&self, contributor: &Principal) -> Result<Option<Vec<u8>>, StoreError>;
    fn iter_claims(&self) -> Result<Vec<(Principal, Vec<u8>)>, StoreError>;
}
