//! Treasury storage trait: the `treasury_actions` table.

use crate::StoreError;

pub trait TreasuryStore {
    fn put_action(&self, id: u64, data: &[u8]) -> Result<(), StoreError>;
    fn get_action(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError>;
    /// All treasury actions in ascending id order.
    fn iter_actions(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;
}
