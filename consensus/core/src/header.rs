use crate::Hash;
use serde::{Deserialize, Serialize};

/// The header fields consumed by the consensus core (§6). Hashing, merkle
/// root computation and script verification of the fields below are external
/// collaborators' concerns — out of scope here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub hash: Hash,
    pub version: u16,
    pub parents: Vec<Hash>,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    /// Milliseconds since the epoch. Signed per the wire contract (§6):
    /// negative values are rejected by the header validator, not by this type.
    pub time_in_milliseconds: i64,
    pub bits: u32,
    pub nonce: u64,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hash: Hash,
        version: u16,
        parents: Vec<Hash>,
        hash_merkle_root: Hash,
        accepted_id_merkle_root: Hash,
        utxo_commitment: Hash,
        time_in_milliseconds: i64,
        bits: u32,
        nonce: u64,
    ) -> Self {
        Self { hash, version, parents, hash_merkle_root, accepted_id_merkle_root, utxo_commitment, time_in_milliseconds, bits, nonce }
    }

    pub fn direct_parents(&self) -> &[Hash] {
        &self.parents
    }
}
