//! Sentinel hashes and small helpers shared by every block-hash-keyed store.

pub use duskdag_hashes::{HashExtensions, NONE, ORIGIN};
use duskdag_hashes::Hash;

/// Sorts and deduplicates a vector of hashes in place. Used wherever a
/// `BlockSet`'s hashes need a canonical, consensus-independent iteration
/// order (e.g. for logging or test assertions) — never for anything that
/// feeds back into a consensus decision.
pub fn sort_unique(hashes: &mut Vec<Hash>) {
    hashes.sort_unstable();
    hashes.dedup();
}
