use crate::errors::{FlowError, FlowResult};
use duskdag_p2p::{Message, OutgoingRoute, Peer, Ping, Pong, Route};
use rand::Rng;
use std::time::Duration;

/// How often `send_pings` initiates a round trip (§4.9/C12).
const PING_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// `DefaultTimeout` bound on waiting for the matching pong (§4.9).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `ReceivePings` (§4.9): answers every incoming ping with a pong carrying
/// the same nonce, until the route closes.
pub async fn receive_pings(incoming_route: &Route, outgoing_route: &OutgoingRoute) -> FlowResult<()> {
    loop {
        let message = incoming_route.dequeue().await?;
        let Message::Ping(Ping { nonce }) = message else {
            return Err(FlowError::protocol(true, format!("unexpected {} message in the ping flow", message.kind())));
        };
        outgoing_route.enqueue(Message::Pong(Pong { nonce })).await?;
    }
}

/// `SendPings` (§4.9): every [`PING_INTERVAL`], sends a ping with a fresh
/// random nonce and awaits the matching pong within [`DEFAULT_TIMEOUT`]. A
/// nonce mismatch is a ban-worthy protocol violation; otherwise the peer is
/// marked ping-idle again.
pub async fn send_pings(incoming_route: &Route, outgoing_route: &OutgoingRoute, peer: &Peer) -> FlowResult<()> {
    let mut interval = tokio::time::interval(PING_INTERVAL);
    interval.tick().await; // first tick fires immediately; the real cadence starts after it

    loop {
        interval.tick().await;

        let nonce = rand::thread_rng().gen::<u64>();
        peer.set_ping_pending(nonce);

        outgoing_route.enqueue(Message::Ping(Ping { nonce })).await?;

        let message = incoming_route.dequeue_with_timeout(DEFAULT_TIMEOUT).await?;
        let Message::Pong(Pong { nonce: pong_nonce }) = message else {
            return Err(FlowError::protocol(true, format!("unexpected {} message in the ping flow", message.kind())));
        };
        if pong_nonce != nonce {
            return Err(FlowError::protocol(true, "nonce mismatch between ping and pong"));
        }
        peer.set_ping_idle();
    }
}
