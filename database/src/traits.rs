use crate::errors::StoreResult;

/// A cursor over a single bucket's keyspace, positioned before the first
/// entry until the first call to [`next`](DbCursor::next) (§4.6/§6).
pub trait DbCursor {
    /// Advances the cursor. Returns `false` once the bucket is exhausted.
    fn next(&mut self) -> bool;
    /// The full key (including bucket prefix) at the cursor's current position.
    /// Panics if called before the first successful `next()` or after
    /// exhaustion — callers are expected to check `next()`'s return value.
    fn key(&self) -> Vec<u8>;
    fn value(&self) -> Vec<u8>;
}

/// Read access to the backend, consulted for point lookups and full-bucket
/// scans (§4.6, §6).
pub trait DbReader {
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>>;
    fn has(&self, key: &[u8]) -> StoreResult<bool>;
    fn cursor(&self, bucket_prefix: &[u8]) -> StoreResult<Box<dyn DbCursor + '_>>;
}

/// A write transaction: buffers `put`/`delete` operations until `commit`,
/// which must apply every buffered operation atomically. `rollback`
/// (equivalently, simply dropping the transaction without committing) is
/// always safe and discards the buffer (§5 "Discard is always safe"). Per
/// §4.6/§6 this is a write-only surface — transactions do not read; the
/// consensus state store's own staging layer (full-set/diff overlay) is what
/// answers reads during a pending transaction.
pub trait DbTransaction {
    fn put(&mut self, key: &[u8], value: &[u8]);
    fn delete(&mut self, key: &[u8]);
    fn commit(self: Box<Self>) -> StoreResult<()>;
    fn rollback(self: Box<Self>);
}
