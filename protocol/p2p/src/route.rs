use crate::message::Message;
use std::time::Duration;
use thiserror::Error;

/// The transport underneath a peer flow went away (§5, §7). Recoverable: the
/// flow that observes it unwinds cleanly rather than treating it as a
/// protocol violation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("route closed")]
pub struct RouteClosed;

/// A bounded, single-consumer incoming message queue for one peer flow
/// (§5/C14). FIFO per peer; closing the underlying channel (peer
/// disconnect) surfaces as [`RouteClosed`] to whichever side is waiting.
#[derive(Clone)]
pub struct Route {
    receiver: async_channel::Receiver<Message>,
}

/// The outgoing half of a peer's route (§5/C14): messages enqueued here are
/// delivered to the peer in FIFO order. Enqueuing past a closed route
/// surfaces as [`RouteClosed`] rather than panicking.
#[derive(Clone)]
pub struct OutgoingRoute {
    sender: async_channel::Sender<Message>,
}

/// Builds a connected incoming/outgoing route pair with the given buffer
/// capacity (§5's "route buffer full or empty" suspension points).
pub fn channel(capacity: usize) -> (OutgoingRoute, Route) {
    let (sender, receiver) = async_channel::bounded(capacity.max(1));
    (OutgoingRoute { sender }, Route { receiver })
}

impl Route {
    /// Suspends until a message arrives or the route closes (§5).
    pub async fn dequeue(&self) -> Result<Message, RouteClosed> {
        self.receiver.recv().await.map_err(|_| RouteClosed)
    }

    /// As [`Route::dequeue`], but gives up after `timeout` with a
    /// [`DequeueError::Timeout`] rather than suspending indefinitely — used
    /// wherever the protocol defines a `DefaultTimeout` bound on a response
    /// (§4.8 step 4, §4.9's `SendPings`).
    pub async fn dequeue_with_timeout(&self, timeout: Duration) -> Result<Message, DequeueError> {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(DequeueError::Closed),
            Err(_) => Err(DequeueError::Timeout),
        }
    }

    pub fn close(&self) {
        self.receiver.close();
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    #[error(transparent)]
    Closed(#[from] RouteClosed),
    #[error("timed out waiting for a message")]
    Timeout,
}

impl OutgoingRoute {
    /// Suspends until there is buffer space or the route closes (§5).
    pub async fn enqueue(&self, message: Message) -> Result<(), RouteClosed> {
        self.sender.send(message).await.map_err(|_| RouteClosed)
    }

    pub fn close(&self) {
        self.sender.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Ping;

    #[tokio::test]
    async fn enqueued_messages_are_dequeued_in_order() {
        let (outgoing, incoming) = channel(8);
        outgoing.enqueue(Message::Ping(Ping { nonce: 1 })).await.unwrap();
        outgoing.enqueue(Message::Ping(Ping { nonce: 2 })).await.unwrap();

        assert_eq!(incoming.dequeue().await.unwrap(), Message::Ping(Ping { nonce: 1 }));
        assert_eq!(incoming.dequeue().await.unwrap(), Message::Ping(Ping { nonce: 2 }));
    }

    #[tokio::test]
    async fn closing_the_outgoing_side_surfaces_as_route_closed() {
        let (outgoing, incoming) = channel(1);
        outgoing.close();
        assert_eq!(incoming.dequeue().await, Err(RouteClosed));
    }

    #[tokio::test]
    async fn dequeue_with_timeout_times_out_on_silence() {
        let (_outgoing, incoming) = channel(1);
        let err = incoming.dequeue_with_timeout(Duration::from_millis(10)).await.unwrap_err();
        assert_eq!(err, DequeueError::Timeout);
    }
}
