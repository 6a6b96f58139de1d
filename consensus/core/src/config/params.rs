use super::NetworkType;
use crate::Hash;
use duskdag_math::Uint256;
use std::time::Duration;

/// The fixed genesis facts a fresh DAG is seeded with.
#[derive(Clone, Copy, Debug)]
pub struct GenesisBlock {
    pub hash: Hash,
    pub bits: u32,
    pub timestamp: i64,
}

/// Network-wide consensus parameters (§6). Parsing these from a config file
/// or CLI flag is out of scope; this is the in-memory shape the engine
/// consumes once some external collaborator has produced one.
#[derive(Clone, Debug)]
pub struct NetworkParams {
    pub name: NetworkType,
    /// GHOSTDAG anti-cone bound.
    pub k: u8,
    pub difficulty_adjustment_window_size: u64,
    pub target_time_per_block: Duration,
    pub genesis: GenesisBlock,
    pub max_target: Uint256,
    /// Acceptable forward clock skew before a header is classified as
    /// "delayed" rather than accepted (§4.7 step 3).
    pub max_time_offset: Duration,
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        Self {
            name: NetworkType::Mainnet,
            k: 18,
            difficulty_adjustment_window_size: 2641,
            target_time_per_block: Duration::from_millis(1000),
            genesis: GenesisBlock { hash: crate::blockhash::NONE, bits: 0x207fffff, timestamp: 0 },
            max_target: Uint256::from_compact(0x207fffff),
            max_time_offset: Duration::from_secs(600),
        }
    }

    pub fn testnet() -> Self {
        let mut p = Self::mainnet();
        p.name = NetworkType::Testnet;
        p
    }

    pub fn devnet() -> Self {
        let mut p = Self::mainnet();
        p.name = NetworkType::Devnet;
        p
    }

    pub fn simnet() -> Self {
        let mut p = Self::mainnet();
        p.name = NetworkType::Simnet;
        p.k = 1;
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_genesis_bits_decode_to_max_target() {
        let p = NetworkParams::mainnet();
        assert_eq!(Uint256::from_compact(p.genesis.bits), p.max_target);
    }
}
