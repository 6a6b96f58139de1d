mod network;
mod params;

pub use network::NetworkType;
pub use params::{GenesisBlock, NetworkParams};
