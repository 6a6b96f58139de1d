use duskdag_consensus_core::utxo::{Outpoint, UtxoEntry};
use duskdag_hashes::Hash;

/// The key this store's single bucket is scoped under (§6). Outpoints are
/// encoded as the transaction id's 32 bytes followed by the 4-byte
/// little-endian output index, exactly as §6 specifies.
pub const VIRTUAL_UTXO_SET_BUCKET: &[u8] = b"virtual-utxo-set";

/// Internal storage encoding only — unrelated to the P2P wire codec, which
/// this crate does not implement.
pub fn encode_key(outpoint: &Outpoint) -> Vec<u8> {
    let mut key = Vec::with_capacity(VIRTUAL_UTXO_SET_BUCKET.len() + 36);
    key.extend_from_slice(VIRTUAL_UTXO_SET_BUCKET);
    key.extend_from_slice(outpoint.transaction_id.as_slice());
    key.extend_from_slice(&outpoint.index.to_le_bytes());
    key
}

pub fn decode_key(key: &[u8]) -> Option<Outpoint> {
    let suffix = key.strip_prefix(VIRTUAL_UTXO_SET_BUCKET)?;
    if suffix.len() != 36 {
        return None;
    }
    let transaction_id = Hash::from_slice(&suffix[..32]).ok()?;
    let index = u32::from_le_bytes(suffix[32..36].try_into().ok()?);
    Some(Outpoint::new(transaction_id, index))
}

pub fn encode_value(entry: &UtxoEntry) -> Vec<u8> {
    let mut value = Vec::with_capacity(17 + entry.script.len());
    value.extend_from_slice(&entry.amount.to_le_bytes());
    value.extend_from_slice(&entry.block_blue_score.to_le_bytes());
    value.push(entry.is_coinbase as u8);
    value.extend_from_slice(&(entry.script.len() as u32).to_le_bytes());
    value.extend_from_slice(&entry.script);
    value
}

pub fn decode_value(bytes: &[u8]) -> Option<UtxoEntry> {
    if bytes.len() < 21 {
        return None;
    }
    let amount = u64::from_le_bytes(bytes[0..8].try_into().ok()?);
    let block_blue_score = u64::from_le_bytes(bytes[8..16].try_into().ok()?);
    let is_coinbase = bytes[16] != 0;
    let script_len = u32::from_le_bytes(bytes[17..21].try_into().ok()?) as usize;
    let script = bytes.get(21..21 + script_len)?.to_vec();
    Some(UtxoEntry::new(amount, script, block_blue_score, is_coinbase))
}
