//! Peer flows that sit on top of `duskdag-p2p`'s routes and drive the
//! consensus core through [`duskdag_consensus::ConsensusFacade`]: block relay
//! (§4.8/C11), ping (§4.9/C12), the process-wide requested-blocks registry
//! (C13), and the protocol error taxonomy (§7) they share.

pub mod blockrelay;
pub mod errors;
pub mod ping;
pub mod request_queue;
pub mod requested_blocks;

pub use blockrelay::{handle_relay_invs, NewBlockHandler, ReadyPeers};
pub use errors::{FlowError, FlowResult, ProtocolError};
pub use ping::{receive_pings, send_pings};
pub use request_queue::HashesQueueSet;
pub use requested_blocks::{PendingBlocksGuard, RequestedBlocks};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the epoch, the form
/// `ConsensusFacade::process_block` expects (§4.10). The consensus core
/// itself never reads the clock directly, keeping it deterministic and
/// testable; this is the one place in the stack that does, since a peer
/// flow is inherently driven by real time.
pub(crate) fn now_in_milliseconds() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}
