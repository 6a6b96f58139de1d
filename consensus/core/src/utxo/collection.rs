use crate::Hash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reference to a single transaction output: the producing transaction's
/// id and the output index within it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Outpoint {
    pub transaction_id: Hash,
    pub index: u32,
}

impl Outpoint {
    pub fn new(transaction_id: Hash, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

/// An unspent output: what it's worth, who can spend it (opaquely, as a
/// script — verifying it is an external collaborator's job), and the
/// metadata consensus itself cares about.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub amount: u64,
    pub script: Vec<u8>,
    pub block_blue_score: u64,
    pub is_coinbase: bool,
}

impl UtxoEntry {
    pub fn new(amount: u64, script: Vec<u8>, block_blue_score: u64, is_coinbase: bool) -> Self {
        Self { amount, script, block_blue_score, is_coinbase }
    }
}

/// A mapping from outpoint to entry. Key uniqueness is the collection's only
/// invariant; insertion order is never meaningful.
pub type UtxoCollection = HashMap<Outpoint, UtxoEntry>;
