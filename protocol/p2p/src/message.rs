use duskdag_consensus_core::Block;
use duskdag_hashes::Hash;

/// Upper bound on the number of hashes a single `GetRelayBlocks` message may
/// carry (§6's `MsgGetRelayBlocksHashes`). The block-relay flow batches its
/// request queue to this size per round trip.
pub const MSG_GET_RELAY_BLOCKS_HASHES: usize = 100;

/// A peer announcing a block it has (§6). Wire byte layout is out of scope;
/// this is the already-decoded shape the relay flow consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvRelayBlock {
    pub hash: Hash,
}

/// A request for up to [`MSG_GET_RELAY_BLOCKS_HASHES`] blocks by hash (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetRelayBlocks {
    pub hashes: Vec<Hash>,
}

impl GetRelayBlocks {
    pub fn new(hashes: Vec<Hash>) -> Self {
        debug_assert!(hashes.len() <= MSG_GET_RELAY_BLOCKS_HASHES);
        Self { hashes }
    }
}

/// A full block sent in response to a `GetRelayBlocks` request (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockMessage {
    pub block: Block,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ping {
    pub nonce: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pong {
    pub nonce: u64,
}

/// The union of message shapes a flow's incoming route can carry (§6).
/// Real byte (de)serialization is an external collaborator's concern
/// (non-goal, §1) — flows match on this enum directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    InvRelayBlock(InvRelayBlock),
    GetRelayBlocks(GetRelayBlocks),
    Block(BlockMessage),
    Ping(Ping),
    Pong(Pong),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::InvRelayBlock(_) => "InvRelayBlock",
            Message::GetRelayBlocks(_) => "GetRelayBlocks",
            Message::Block(_) => "Block",
            Message::Ping(_) => "Ping",
            Message::Pong(_) => "Pong",
        }
    }
}
