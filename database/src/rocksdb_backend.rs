use crate::errors::{StoreError, StoreResult};
use crate::traits::{DbCursor, DbReader, DbTransaction};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

/// A RocksDB-backed handle. Cloning is cheap (shares the underlying `Arc`),
/// matching the teacher's pattern of passing the DB handle around by `Arc`.
#[derive(Clone)]
pub struct RocksDb {
    inner: Arc<DB>,
}

impl RocksDb {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let inner = DB::open(&opts, path)?;
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn transaction(&self) -> RocksDbTransaction {
        RocksDbTransaction { db: self.inner.clone(), batch: WriteBatch::default() }
    }
}

impl DbReader for RocksDb {
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.inner.get(key)?.ok_or(StoreError::KeyNotFound)
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.inner.get_pinned(key)?.is_some())
    }

    fn cursor(&self, bucket_prefix: &[u8]) -> StoreResult<Box<dyn DbCursor + '_>> {
        let iter = self.inner.prefix_iterator(bucket_prefix);
        Ok(Box::new(RocksDbCursor { iter: Box::new(iter), prefix: bucket_prefix.to_vec(), current: None, started: false }))
    }
}

/// A buffered write transaction. `commit` applies the whole batch atomically
/// via a single `rocksdb` write; `rollback` (or simply dropping this value)
/// discards the batch without touching the backend.
pub struct RocksDbTransaction {
    db: Arc<DB>,
    batch: WriteBatch,
}

impl DbTransaction for RocksDbTransaction {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.batch.put(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.batch.delete(key);
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        self.db.write(self.batch)?;
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        // Dropping `self.batch` discards every buffered operation.
    }
}

struct RocksDbCursor<'a> {
    iter: Box<dyn Iterator<Item = Result<(Box<[u8]>, Box<[u8]>), rocksdb::Error>> + 'a>,
    prefix: Vec<u8>,
    current: Option<(Box<[u8]>, Box<[u8]>)>,
    started: bool,
}

impl<'a> DbCursor for RocksDbCursor<'a> {
    fn next(&mut self) -> bool {
        self.started = true;
        loop {
            match self.iter.next() {
                Some(Ok((k, v))) => {
                    if !k.starts_with(self.prefix.as_slice()) {
                        // rocksdb's prefix_iterator may run past the prefix at the
                        // end of the keyspace; treat that as exhaustion.
                        self.current = None;
                        return false;
                    }
                    self.current = Some((k, v));
                    return true;
                }
                Some(Err(_)) => {
                    self.current = None;
                    return false;
                }
                None => {
                    self.current = None;
                    return false;
                }
            }
        }
    }

    fn key(&self) -> Vec<u8> {
        self.current.as_ref().expect("cursor key read before next() or after exhaustion").0.to_vec()
    }

    fn value(&self) -> Vec<u8> {
        self.current.as_ref().expect("cursor value read before next() or after exhaustion").1.to_vec()
    }
}
