//! Metadata storage trait.

use crate::StoreError;

/// Key-value store for parameters, counters and other bookkeeping that does
/// not belong in a component table. Keys are namespaced by component, e.g.
/// `governance.params` or `oracle.next_seq`.
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// Schema version, or `None` for an empty store.
    fn get_schema_version(&self) -> Result<Option<u32>, StoreError> {
        match self.get_meta("schema_version")? {
            None => Ok(None),
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("schema_version is {} bytes", bytes.len()))
                })?;
                Ok(Some(u32::from_be_bytes(raw)))
            }
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta("schema_version", &version.to_be_bytes())
    }
}
