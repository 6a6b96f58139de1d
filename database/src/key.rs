/// A byte-prefixed keyspace key: `bucket-prefix || suffix`. Buckets partition
/// the backend's single flat keyspace into logical tables (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbKey(Vec<u8>);

impl DbKey {
    pub fn new(prefix: &[u8], suffix: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(prefix.len() + suffix.len());
        bytes.extend_from_slice(prefix);
        bytes.extend_from_slice(suffix);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The portion of the key after the bucket prefix, e.g. the serialized
    /// outpoint following the `"virtual-utxo-set"` bucket prefix.
    pub fn suffix(&self, prefix_len: usize) -> &[u8] {
        &self.0[prefix_len..]
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
