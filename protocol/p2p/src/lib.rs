//! Peer-facing plumbing consumed by `duskdag-protocol-flows` (§6, C14):
//! the five wire message shapes the consensus core cares about, already
//! decoded, plus the bounded route pair and peer/state bookkeeping a flow
//! runs over. Byte codecs, handshake, and connection management are out of
//! scope (non-goal, §1).

pub mod message;
pub mod peer;
pub mod route;

pub use message::{BlockMessage, GetRelayBlocks, InvRelayBlock, Message, Ping, Pong, MSG_GET_RELAY_BLOCKS_HASHES};
pub use peer::{Peer, PeerState};
pub use route::{channel, DequeueError, OutgoingRoute, Route, RouteClosed};
