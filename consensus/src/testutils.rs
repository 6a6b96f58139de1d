//! Test doubles shared across this crate's unit and integration tests: an
//! in-memory stand-in for the transactional backend contract, and permissive
//! collaborator implementations for the validation seams that are out of
//! scope for this crate (header rule details, transaction/script
//! verification).

use crate::collaborators::{HeaderValidator, TransactionValidator};
use crate::state::TransactionalBackend;
use duskdag_consensus_core::errors::RuleError;
use duskdag_consensus_core::utxo::{Outpoint, UtxoDiff, UtxoEntry};
use duskdag_consensus_core::{Header, Transaction};
use duskdag_database::{DbCursor, DbReader, DbTransaction, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryBackend {
    rows: RefCell<HashMap<Vec<u8>, Vec<u8>>>,
}

struct MemoryTransaction<'a> {
    rows: &'a RefCell<HashMap<Vec<u8>, Vec<u8>>>,
    puts: Vec<(Vec<u8>, Vec<u8>)>,
    deletes: Vec<Vec<u8>>,
}

impl<'a> DbTransaction for MemoryTransaction<'a> {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.puts.push((key.to_vec(), value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.deletes.push(key.to_vec());
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut rows = self.rows.borrow_mut();
        for key in self.deletes {
            rows.remove(&key);
        }
        for (key, value) in self.puts {
            rows.insert(key, value);
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

struct MemoryCursor {
    entries: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl DbCursor for MemoryCursor {
    fn next(&mut self) -> bool {
        self.current = self.entries.next();
        self.current.is_some()
    }

    fn key(&self) -> Vec<u8> {
        self.current.as_ref().unwrap().0.clone()
    }

    fn value(&self) -> Vec<u8> {
        self.current.as_ref().unwrap().1.clone()
    }
}

impl DbReader for MemoryBackend {
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.rows.borrow().get(key).cloned().ok_or(StoreError::KeyNotFound)
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.rows.borrow().contains_key(key))
    }

    fn cursor(&self, bucket_prefix: &[u8]) -> StoreResult<Box<dyn DbCursor + '_>> {
        let entries: Vec<_> =
            self.rows.borrow().iter().filter(|(k, _)| k.starts_with(bucket_prefix)).map(|(k, v)| (k.clone(), v.clone())).collect();
        Ok(Box::new(MemoryCursor { entries: entries.into_iter(), current: None }))
    }
}

impl TransactionalBackend for MemoryBackend {
    fn begin(&self) -> Box<dyn DbTransaction + '_> {
        Box::new(MemoryTransaction { rows: &self.rows, puts: Vec::new(), deletes: Vec::new() })
    }
}

/// Accepts every header unconditionally — used where a test exercises
/// GHOSTDAG/virtual-block/UTXO behavior and isn't itself testing header
/// rule enforcement.
pub struct PermissiveHeaderValidator;

impl HeaderValidator for PermissiveHeaderValidator {
    fn validate_header(&self, _header: &Header, _past_median_time: i64) -> Result<(), RuleError> {
        Ok(())
    }
}

/// Produces no UTXO changes for any block — suitable for tests that only
/// care about DAG/GHOSTDAG/virtual-block bookkeeping, not transaction
/// processing (which this crate does not implement; see the
/// `TransactionValidator` doc comment).
pub struct EmptyTransactionValidator;

impl TransactionValidator for EmptyTransactionValidator {
    fn compute_utxo_diff(
        &self,
        _header: &Header,
        _transactions: &[Transaction],
        _utxo_view: &dyn Fn(&Outpoint) -> Option<UtxoEntry>,
    ) -> Result<UtxoDiff, RuleError> {
        Ok(UtxoDiff::default())
    }
}
