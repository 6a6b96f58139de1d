use crate::errors::{FlowError, FlowResult};
use crate::request_queue::HashesQueueSet;
use crate::requested_blocks::{PendingBlocksGuard, RequestedBlocks};
use duskdag_consensus::{ConsensusFacade, ProcessBlockOutcome};
use duskdag_consensus_core::Block;
use duskdag_hashes::Hash;
use duskdag_p2p::{GetRelayBlocks, InvRelayBlock, Message, OutgoingRoute, PeerState, Route, MSG_GET_RELAY_BLOCKS_HASHES};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Bound on how far ahead of the selected tip an orphan's estimated blue
/// score may sit before the relay flow gives up on it (§4.8 step 5, §8
/// scenario 8).
const MAX_ORPHAN_BLUE_SCORE_DIFF: u64 = 10_000;

/// `DefaultTimeout` (§4.8 step 4, §4.9): how long `request_blocks` waits for
/// a requested block to arrive before treating the flow as dead.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Called once a block clears C10 as `Accepted` (§4.8 step 5's "inform the
/// new-block callback"). Mirrors the source's `NewBlockHandler` seam for
/// whatever a node wires up downstream (mempool eviction, mining template
/// refresh, ...) — out of scope here.
pub trait NewBlockHandler: Send + Sync {
    fn handle(&self, block: &Block);
}

/// Broadcasts an `InvRelayBlock` to every peer in the `Ready` state (§4.8
/// step 5). A thin seam over whatever the node's peer registry looks like;
/// this crate only needs "iterate the ready peers and hand each an outgoing
/// route".
pub trait ReadyPeers: Send + Sync {
    fn broadcast_inv(&self, hash: Hash);
}

/// `HandleRelayInvs` (§4.8/C11): the per-peer block-relay flow. Listens for
/// `InvRelayBlock` announcements, requests their blocks if missing, feeds
/// them through consensus, and relays newly-accepted blocks onward.
///
/// `dag` is taken behind the write lock for the duration of each
/// `process_block` call only (§5: "GHOSTDAG assignment, virtual mutation,
/// and UTXO commit occur under the write lock"); the pure `is_known_block`/
/// `is_known_invalid`/`estimate_orphan_blue_score` reads that guard the loop
/// take the same lock read-only, matching §5's read/write split.
pub async fn handle_relay_invs<D: ConsensusFacade + ?Sized>(
    incoming_route: &Route,
    outgoing_route: &OutgoingRoute,
    peer_state: impl Fn() -> PeerState,
    dag: &RwLock<D>,
    requested_blocks: &Arc<RequestedBlocks>,
    ready_peers: &dyn ReadyPeers,
    is_ibd_active: impl Fn() -> bool,
    new_block_handler: &dyn NewBlockHandler,
) -> FlowResult<()> {
    let mut invs_queue: Vec<InvRelayBlock> = Vec::new();

    loop {
        let inv = match read_inv(incoming_route, &mut invs_queue).await? {
            Some(inv) => inv,
            None => return Ok(()),
        };

        {
            let guard = dag.read();
            if guard.is_known_block(inv.hash) {
                if guard.is_known_invalid(inv.hash) {
                    return Err(FlowError::protocol(true, format!("sent inv of an invalid block {}", inv.hash)));
                }
                continue;
            }
        }

        if is_ibd_active() {
            // Block relay is disabled during IBD (§4.8 step 3).
            continue;
        }

        let mut request_queue = HashesQueueSet::new();
        request_queue.enqueue_if_not_exists(inv.hash);

        while !request_queue.is_empty() {
            request_blocks(
                incoming_route,
                outgoing_route,
                &peer_state,
                dag,
                requested_blocks,
                ready_peers,
                &is_ibd_active,
                new_block_handler,
                &mut invs_queue,
                &mut request_queue,
            )
            .await?;
        }
    }
}

async fn read_inv(incoming_route: &Route, invs_queue: &mut Vec<InvRelayBlock>) -> FlowResult<Option<InvRelayBlock>> {
    if !invs_queue.is_empty() {
        return Ok(Some(invs_queue.remove(0)));
    }

    match incoming_route.dequeue().await {
        Ok(Message::InvRelayBlock(inv)) => Ok(Some(inv)),
        Ok(other) => Err(FlowError::protocol(
            true,
            format!("unexpected {} message in the block relay flow while expecting an inv message", other.kind()),
        )),
        Err(_closed) => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
async fn request_blocks<D: ConsensusFacade + ?Sized>(
    incoming_route: &Route,
    outgoing_route: &OutgoingRoute,
    peer_state: &impl Fn() -> PeerState,
    dag: &RwLock<D>,
    requested_blocks: &Arc<RequestedBlocks>,
    ready_peers: &dyn ReadyPeers,
    is_ibd_active: &impl Fn() -> bool,
    new_block_handler: &dyn NewBlockHandler,
    invs_queue: &mut Vec<InvRelayBlock>,
    request_queue: &mut HashesQueueSet,
) -> FlowResult<()> {
    let hashes_to_request = request_queue.dequeue(MSG_GET_RELAY_BLOCKS_HASHES);

    let mut pending = Vec::with_capacity(hashes_to_request.len());
    for hash in hashes_to_request {
        if requested_blocks.add_if_not_exists(hash) {
            pending.push(hash);
        }
    }

    // Scoped release on every exit path, normal or early (§4.8 step 6, §9's
    // "Deferred cleanup").
    let mut guard = PendingBlocksGuard::new(requested_blocks.clone(), pending.clone());

    outgoing_route.enqueue(Message::GetRelayBlocks(GetRelayBlocks::new(pending))).await?;

    while !guard.pending().is_empty() {
        let block = read_block_message(incoming_route, invs_queue).await?;
        let block_hash = block.hash();

        if !guard.pending().contains(&block_hash) {
            return Err(FlowError::protocol(true, format!("got unrequested block {block_hash}")));
        }
        guard.resolve(&block_hash);

        process_and_relay_block(
            peer_state,
            dag,
            ready_peers,
            is_ibd_active,
            new_block_handler,
            request_queue,
            block,
        )?;
    }

    Ok(())
}

/// Reads the next `Block` message, buffering any interleaved `InvRelayBlock`
/// announcements into `invs_queue` rather than discarding them (§4.8 step 4).
/// Any other message kind is a protocol error.
async fn read_block_message(incoming_route: &Route, invs_queue: &mut Vec<InvRelayBlock>) -> FlowResult<Block> {
    loop {
        let message = incoming_route.dequeue_with_timeout(DEFAULT_TIMEOUT).await?;
        match message {
            Message::InvRelayBlock(inv) => invs_queue.push(inv),
            Message::Block(block_message) => return Ok(block_message.block),
            other => return Err(FlowError::protocol(true, format!("unexpected {} message", other.kind()))),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn process_and_relay_block(
    peer_state: &impl Fn() -> PeerState,
    dag: &RwLock<dyn ConsensusFacade>,
    ready_peers: &dyn ReadyPeers,
    is_ibd_active: &impl Fn() -> bool,
    new_block_handler: &dyn NewBlockHandler,
    request_queue: &mut HashesQueueSet,
    block: Block,
) -> FlowResult<()> {
    let block_hash = block.hash();
    let now_in_milliseconds = crate::now_in_milliseconds();

    let outcome = {
        let mut guard = dag.write();
        guard.process_block(&block, now_in_milliseconds)
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        // A non-rule error here is a storage failure or invariant violation
        // (§7): fatal, not a peer-level condition, so it propagates as a
        // panic rather than a FlowError.
        Err(err) => panic!("failed to process block {block_hash}: {err}"),
    };

    match outcome {
        ProcessBlockOutcome::Rejected(rule_error) => {
            log::info!("rejected block {block_hash}: {rule_error}");
            Err(FlowError::InvalidBlock(block_hash, rule_error))
        }
        ProcessBlockOutcome::Delayed => Ok(()),
        ProcessBlockOutcome::Orphan => {
            let estimated_blue_score = dag.read().estimate_orphan_blue_score(&block.header);
            let selected_tip_blue_score = dag.read().selected_tip_blue_score();
            if estimated_blue_score > selected_tip_blue_score + MAX_ORPHAN_BLUE_SCORE_DIFF {
                log::info!(
                    "orphan block {block_hash} has estimated blue score {estimated_blue_score} and the selected \
                     tip blue score is {selected_tip_blue_score}; ignoring orphans further than \
                     {MAX_ORPHAN_BLUE_SCORE_DIFF} behind"
                );
                return Ok(());
            }

            let missing_ancestors = dag.read().get_orphan_missing_ancestor_hashes(block_hash);
            for ancestor in missing_ancestors {
                request_queue.enqueue_if_not_exists(ancestor);
            }
            Ok(())
        }
        ProcessBlockOutcome::Accepted => {
            ready_peers.broadcast_inv(block_hash);
            if !is_ibd_active() && peer_state() == PeerState::Ready {
                new_block_handler.handle(&block);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskdag_consensus_core::Header;
    use duskdag_p2p::{channel, BlockMessage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn header(hash: Hash, parents: Vec<Hash>) -> Header {
        Header::new(hash, 0, parents, Hash::from_u64_word(0), Hash::from_u64_word(0), Hash::from_u64_word(0), 0, 0x207fffff, 0)
    }

    struct FakeDag {
        known: std::collections::HashSet<Hash>,
        invalid: std::collections::HashSet<Hash>,
        accept_next: bool,
    }

    impl ConsensusFacade for FakeDag {
        fn is_known_block(&self, hash: Hash) -> bool {
            self.known.contains(&hash)
        }
        fn is_known_invalid(&self, hash: Hash) -> bool {
            self.invalid.contains(&hash)
        }
        fn selected_tip_blue_score(&self) -> u64 {
            0
        }
        fn get_orphan_missing_ancestor_hashes(&self, _hash: Hash) -> Vec<Hash> {
            Vec::new()
        }
        fn estimate_orphan_blue_score(&self, _header: &Header) -> u64 {
            0
        }
        fn process_block(
            &mut self,
            block: &Block,
            _now_in_milliseconds: i64,
        ) -> duskdag_consensus::ConsensusStateResult<ProcessBlockOutcome> {
            self.known.insert(block.hash());
            Ok(if self.accept_next { ProcessBlockOutcome::Accepted } else { ProcessBlockOutcome::Delayed })
        }
    }

    struct NoopReadyPeers;
    impl ReadyPeers for NoopReadyPeers {
        fn broadcast_inv(&self, _hash: Hash) {}
    }

    struct CountingHandler(AtomicUsize);
    impl NewBlockHandler for CountingHandler {
        fn handle(&self, _block: &Block) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn known_invalid_inv_is_a_ban_worthy_protocol_error() {
        let (outgoing_in, incoming) = channel(8);
        let (outgoing, _incoming_out) = channel(8);
        let hash = Hash::from_u64_word(1);
        let dag = RwLock::new(FakeDag { known: [hash].into(), invalid: [hash].into(), accept_next: true });
        let requested = RequestedBlocks::new();
        let handler = CountingHandler(AtomicUsize::new(0));

        outgoing_in.enqueue(Message::InvRelayBlock(InvRelayBlock { hash })).await.unwrap();
        outgoing_in.close();

        let result = handle_relay_invs(
            &incoming,
            &outgoing,
            || PeerState::Ready,
            &dag,
            &requested,
            &NoopReadyPeers,
            || false,
            &handler,
        )
        .await;

        assert!(matches!(result, Err(FlowError::Protocol(p)) if p.ban_worthy));
    }

    #[tokio::test]
    async fn unrequested_block_is_rejected() {
        let (outgoing_in, incoming) = channel(8);
        let (outgoing, incoming_out) = channel(8);
        let wanted = Hash::from_u64_word(1);
        let unrequested = Hash::from_u64_word(2);
        let dag = RwLock::new(FakeDag { known: Default::default(), invalid: Default::default(), accept_next: true });
        let requested = RequestedBlocks::new();
        let handler = CountingHandler(AtomicUsize::new(0));

        outgoing_in.enqueue(Message::InvRelayBlock(InvRelayBlock { hash: wanted })).await.unwrap();

        let flow = tokio::spawn(async move {
            handle_relay_invs(&incoming, &outgoing, || PeerState::Ready, &dag, &requested, &NoopReadyPeers, || false, &handler).await
        });

        // drain the GetRelayBlocks request the flow sends before answering it
        let _get = incoming_out.dequeue().await.unwrap();
        outgoing_in
            .enqueue(Message::Block(BlockMessage { block: Block::new(Arc::new(header(unrequested, vec![])), vec![]) }))
            .await
            .unwrap();
        outgoing_in.close();

        let result = flow.await.unwrap();
        assert!(matches!(result, Err(FlowError::Protocol(p)) if p.ban_worthy));
    }

    #[tokio::test]
    async fn accepted_block_broadcasts_and_invokes_new_block_handler() {
        let (outgoing_in, incoming) = channel(8);
        let (outgoing, incoming_out) = channel(8);
        let hash = Hash::from_u64_word(1);
        let dag = RwLock::new(FakeDag { known: Default::default(), invalid: Default::default(), accept_next: true });
        let requested = RequestedBlocks::new();
        let handler = Arc::new(CountingHandler(AtomicUsize::new(0)));
        let handler_for_flow = handler.clone();

        outgoing_in.enqueue(Message::InvRelayBlock(InvRelayBlock { hash })).await.unwrap();

        let flow = tokio::spawn(async move {
            handle_relay_invs(
                &incoming,
                &outgoing,
                || PeerState::Ready,
                &dag,
                &requested,
                &NoopReadyPeers,
                || false,
                handler_for_flow.as_ref(),
            )
            .await
        });

        let _get = incoming_out.dequeue().await.unwrap();
        outgoing_in.enqueue(Message::Block(BlockMessage { block: Block::new(Arc::new(header(hash, vec![])), vec![]) })).await.unwrap();
        outgoing_in.close();

        flow.await.unwrap().unwrap();
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }
}
