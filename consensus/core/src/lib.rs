extern crate self as consensus_core;

use std::collections::{HashMap, HashSet};

pub use duskdag_hashes::Hash;

pub mod block;
pub mod blockhash;
pub mod config;
pub mod constants;
pub mod errors;
pub mod header;
pub mod utxo;

pub type BlockHashMap<V> = HashMap<Hash, V>;
pub type BlockHashSet = HashSet<Hash>;

pub use block::{Block, Transaction};
pub use header::Header;
pub use utxo::{Outpoint, UtxoCollection, UtxoDiff, UtxoEntry};
