use duskdag_consensus_core::errors::RuleError;
use duskdag_hashes::Hash;
use duskdag_p2p::RouteClosed;
use thiserror::Error;

/// The peer misbehaved (§7): unrequested block, unexpected message kind,
/// nonce mismatch. Recoverable — the flow that raises it is expected to
/// disconnect and, if `ban_worthy`, ban the peer.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ProtocolError {
    pub ban_worthy: bool,
    pub message: String,
}

impl ProtocolError {
    pub fn new(ban_worthy: bool, message: impl Into<String>) -> Self {
        Self { ban_worthy, message: message.into() }
    }
}

/// Everything a peer flow's main loop can return (§7, §8). `RouteClosed`
/// unwinds silently; `Protocol` maps to a peer-level sanction; `Consensus`
/// wraps a `RuleError` the block-relay flow converts into a ban-worthy
/// protocol error per §4.8 step 5 ("on success ... on invalid block: ..\
/// got invalid block"). Anything else reaching the consensus core
/// (`BackendError`, an internal invariant violation) is, per §7's
/// propagation rule, not represented here — those are fatal and surface as
/// panics at the call site that holds the DAG lock, not as a `FlowError`.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    RouteClosed(#[from] RouteClosed),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("rejected block {0}: {1}")]
    InvalidBlock(Hash, RuleError),

    #[error("timed out waiting for a message")]
    Timeout,
}

impl FlowError {
    pub fn protocol(ban_worthy: bool, message: impl Into<String>) -> Self {
        Self::Protocol(ProtocolError::new(ban_worthy, message))
    }
}

impl From<duskdag_p2p::DequeueError> for FlowError {
    fn from(err: duskdag_p2p::DequeueError) -> Self {
        match err {
            duskdag_p2p::DequeueError::Closed(closed) => FlowError::RouteClosed(closed),
            duskdag_p2p::DequeueError::Timeout => FlowError::Timeout,
        }
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
