//! Nullable store: in-memory storage for every component table.

use concord_store::{
    ClaimStore, GovernanceStore, MetaStore, OracleStore, StoreError, TreasuryStore,
};
use concord_types::{Principal, RoundId};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Table<K> = Mutex<BTreeMap<K, Vec<u8>>>;

/// An in-memory store implementing every storage trait.
#[derive(Default)]
pub struct NullStore {
    signers: Table<Principal>,
    proposals: Table<u64>,
    operators: Table<Principal>,
    rounds: Table<RoundId>,
    consensus: Table<u64>,
    claims: Table<Principal>,
    treasury_actions: Table<u64>,
    meta: Table<String>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<K>(table: &Table<K>) -> Result<MutexGuard<'_, BTreeMap<K, Vec<u8>>>, StoreError> {
    table
        .lock()
        .map_err(|_| StoreError::Backend("table lock poisoned".into()))
}

fn put<K: Ord>(table: &Table<K>, key: K, data: &[u8]) -> Result<(), StoreError> {
    lock(table)?.insert(key, data.to_vec());
    Ok(())
}

fn get<K: Ord>(table: &Table<K>, key: &K) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(lock(table)?.get(key).cloned())
}

fn all<K: Ord + Clone>(table: &Table<K>) -> Result<Vec<(K, Vec<u8>)>, StoreError> {
    Ok(lock(table)?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect())
}

impl GovernanceStore for NullStore {
    fn put_signer(&self, signer: &Principal, data: &[u8]) -> Result<(), StoreError> {
        put(&self.signers, signer.clone(), data)
    }

    fn delete_signer(&self, signer: &Principal) -> Result<(), StoreError> {
        lock(&self.signers)?.remove(signer);
        Ok(())
    }

    fn iter_signers(&self) -> Result<Vec<(Principal, Vec<u8>)>, StoreError> {
        all(&self.signers)
    }

    fn put_proposal(&self, id: u64, data: &[u8]) -> Result<(), StoreError> {
        put(&self.proposals, id, data)
    }

    fn get_proposal(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        get(&self.proposals, &id)
    }

    fn iter_proposals(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        all(&self.proposals)
    }
}

impl OracleStore for NullStore {
    fn put_operator(&self, operator: &Principal, data: &[u8]) -> Result<(), StoreError> {
        put(&self.operators, operator.clone(), data)
    }

    fn delete_operator(&self, operator: &Principal) -> Result<(), StoreError> {
        lock(&self.operators)?.remove(operator);
        Ok(())
    }

    fn iter_operators(&self) -> Result<Vec<(Principal, Vec<u8>)>, StoreError> {
        all(&self.operators)
    }

    fn put_round(&self, round: &RoundId, data: &[u8]) -> Result<(), StoreError> {
        put(&self.rounds, round.clone(), data)
    }

    fn get_round(&self, round: &RoundId) -> Result<Option<Vec<u8>>, StoreError> {
        get(&self.rounds, round)
    }

    fn iter_rounds(&self) -> Result<Vec<(RoundId, Vec<u8>)>, StoreError> {
        all(&self.rounds)
    }

    fn put_consensus(&self, seq: u64, data: &[u8]) -> Result<(), StoreError> {
        put(&self.consensus, seq, data)
    }

    fn iter_consensus(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        all(&self.consensus)
    }
}

impl ClaimStore for NullStore {
    fn put_claim(&self, contributor: &Principal, data: &[u8]) -> Result<(), StoreError> {
        put(&self.claims, contributor.clone(), data)
    }

    fn get_claim(&self, contributor: &Principal) -> Result<Option<Vec<u8>>, StoreError> {
        get(&self.claims, contributor)
    }

    fn iter_claims(&self) -> Result<Vec<(Principal, Vec<u8>)>, StoreError> {
        all(&self.claims)
    }
}

impl TreasuryStore for NullStore {
    fn put_action(&self, id: u64, data: &[u8]) -> Result<(), StoreError> {
        put(&self.treasury_actions, id, data)
    }

    fn get_action(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        get(&self.treasury_actions, &id)
    }

    fn iter_actions(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        all(&self.treasury_actions)
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        put(&self.meta, key.to_string(), value)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.meta)?.get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.meta)?.remove(key);
        Ok(())
    }
}
