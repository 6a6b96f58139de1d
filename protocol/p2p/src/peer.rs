use duskdag_hashes::Hash;
use std::fmt;
use std::sync::Mutex;

/// Where a peer sits in the connection lifecycle (§4.8's "broadcast ... to
/// peers in `Ready` state"). Handshake/connection management themselves are
/// out of scope (non-goal, §1); this is only the state flows read to decide
/// whether a peer is eligible for a relay broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerState {
    Connecting,
    Ready,
    Disconnected,
}

#[derive(Debug, Default)]
struct PingState {
    pending_nonce: Option<u64>,
}

/// A connected peer's identity and the small amount of liveness/state
/// bookkeeping flows need (§4.9/C12). Everything about the underlying
/// transport (handshake, address, framing) is out of scope.
pub struct Peer {
    id: Hash,
    state: Mutex<PeerState>,
    ping: Mutex<PingState>,
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer").field("id", &self.id).field("state", &*self.state.lock().unwrap()).finish()
    }
}

impl Peer {
    pub fn new(id: Hash) -> Self {
        Self { id, state: Mutex::new(PeerState::Connecting), ping: Mutex::new(PingState::default()) }
    }

    pub fn id(&self) -> Hash {
        self.id
    }

    pub fn state(&self) -> PeerState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, state: PeerState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn is_ready(&self) -> bool {
        self.state() == PeerState::Ready
    }

    /// Marks a ping as outstanding with the given nonce (§4.9's `SendPings`).
    pub fn set_ping_pending(&self, nonce: u64) {
        self.ping.lock().unwrap().pending_nonce = Some(nonce);
    }

    /// Clears the outstanding ping once its pong has been matched.
    pub fn set_ping_idle(&self) {
        self.ping.lock().unwrap().pending_nonce = None;
    }

    pub fn pending_ping_nonce(&self) -> Option<u64> {
        self.ping.lock().unwrap().pending_nonce
    }
}
