use super::*;
use crate::messages::{
    BlockSignaturesMessage, ChangeViewMessage, ConsensusMessage, PrepareResponseMessage,
    SignatureEntry,
};
use crate::state::ConsensusState;
use async_trait::async_trait;
use onyx_core::{Transaction, UInt160};
use onyx_cryptography::PublicKey;
use onyx_ledger::{
    address_from_bookkeepers, Block, Header, LedgerError, LedgerResult, MemoryLedger, MemoryPool,
    MempoolConfig, VoteValidatorSelector,
};

const GENESIS_TIME: u32 = 1_600_000_000;

struct Node {
    service: ConsensusService,
    events: mpsc::UnboundedReceiver<ConsensusEvent>,
    ledger: Arc<MemoryLedger>,
}

fn keys(n: usize) -> Vec<KeyPair> {
    let mut keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
    keys.sort_by(|a, b| a.public_key().cmp(b.public_key()));
    keys
}

fn public(keys: &[KeyPair]) -> Vec<PublicKey> {
    keys.iter().map(|k| k.public_key().clone()).collect()
}

/// Reads from a real chain but never stores a block.
struct FailingLedger {
    inner: Arc<MemoryLedger>,
    stall: bool,
}

#[async_trait]
impl Ledger for FailingLedger {
    fn current_height(&self) -> u32 {
        self.inner.current_height()
    }

    fn current_block_hash(&self) -> UInt256 {
        self.inner.current_block_hash()
    }

    fn header_by_hash(&self, hash: &UInt256) -> Option<Header> {
        self.inner.header_by_hash(hash)
    }

    fn is_block_persisted(&self, hash: &UInt256) -> bool {
        self.inner.is_block_persisted(hash)
    }

    fn bookkeepers(&self) -> Vec<PublicKey> {
        self.inner.bookkeepers()
    }

    fn subscribe(&self) -> broadcast::Receiver<Arc<Block>> {
        self.inner.subscribe()
    }

    async fn append_block(&self, _block: Block) -> LedgerResult<()> {
        if self.stall {
            std::future::pending::<()>().await;
        }
        Err(LedgerError::invalid_block("storage unavailable"))
    }
}

async fn node(keys: &[KeyPair], index: usize) -> Node {
    node_with_ledger(keys, index, |ledger| ledger as Arc<dyn Ledger>).await
}

async fn node_with_ledger(
    keys: &[KeyPair],
    index: usize,
    wrap: impl FnOnce(Arc<MemoryLedger>) -> Arc<dyn Ledger>,
) -> Node {
    let ledger = Arc::new(MemoryLedger::with_genesis(public(keys), GENESIS_TIME).unwrap());
    let (events_tx, events) = mpsc::unbounded_channel();
    let (mut service, _handle) = ConsensusService::new(
        ConsensusConfig::default(),
        keys[index].clone(),
        wrap(ledger.clone()),
        Arc::new(MemoryPool::new(MempoolConfig::default())),
        Arc::new(VoteValidatorSelector),
        events_tx,
    )
    .unwrap();
    service.handle_command(ConsensusCommand::Start).await;
    Node {
        service,
        events,
        ledger,
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<ConsensusEvent>) -> Vec<ConsensusEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn broadcasts(events: &[ConsensusEvent]) -> Vec<ConsensusMessage> {
    events
        .iter()
        .filter_map(|event| match event {
            ConsensusEvent::Broadcast(payload) => Some(payload.message().unwrap()),
            _ => None,
        })
        .collect()
}

fn payload_from(
    context: &ConsensusContext,
    key: &KeyPair,
    index: u16,
    message: ConsensusMessage,
) -> ConsensusPayload {
    let mut payload = ConsensusPayload {
        version: context.version,
        prev_hash: context.prev_hash,
        height: context.height,
        bookkeeper_index: index,
        timestamp: unix_now(),
        data: message.to_bytes(),
        signature: Vec::new(),
    };
    payload.sign(key);
    payload
}

/// A prepare request from the primary of `context` whose header signature
/// is made with `signer`.
fn prepare_request(
    keys: &[KeyPair],
    context: &ConsensusContext,
    signer: &KeyPair,
    next_bookkeeper: UInt160,
    transactions: Vec<Transaction>,
) -> ConsensusPayload {
    let primary = context.primary_index;
    let mut forged = context.clone();
    forged.bookkeeper_index = Some(primary);
    forged.set_proposal(unix_now(), 7, next_bookkeeper, transactions);
    let hash = forged.make_header().unwrap().hash();
    forged.signatures[primary] = Some(signer.sign(hash.as_bytes()).to_vec());
    let mut payload = forged.make_prepare_request().unwrap();
    payload.sign(&keys[primary]);
    payload
}

fn prepare_response(
    context: &ConsensusContext,
    key: &KeyPair,
    index: usize,
    signature: Vec<u8>,
) -> ConsensusPayload {
    payload_from(
        context,
        key,
        index as u16,
        ConsensusMessage::PrepareResponse(PrepareResponseMessage {
            view_number: 0,
            signature,
        }),
    )
}

/// Checks that node 0 dropped the proposal and asked for view 1.
fn assert_rolled_back(node: &mut Node) {
    let context = node.service.context();
    assert!(!context.state.contains(ConsensusState::REQUEST_RECEIVED));
    assert!(!context.state.contains(ConsensusState::SIGNATURE_SENT));
    assert!(context.transactions().is_empty());
    assert_eq!(context.signatures_count(), 0);
    assert_eq!(context.expected_view[0], 1);
    let sent = broadcasts(&drain(&mut node.events));
    assert!(matches!(
        sent.as_slice(),
        [ConsensusMessage::ChangeView(cv)] if cv.new_view_number == 1
    ));
}

/// Runs the primary's proposal into backup 0 and returns the proposal payload.
async fn propose(keys: &[KeyPair], backup: &mut Node) -> ConsensusPayload {
    let primary_index = backup.service.context().primary_index;
    assert_ne!(primary_index, 0);
    let mut primary = node(keys, primary_index).await;
    let view = primary.service.context().height_view();
    primary
        .service
        .handle_command(ConsensusCommand::Timeout(view))
        .await;
    let proposal = drain(&mut primary.events)
        .into_iter()
        .find_map(|event| match event {
            ConsensusEvent::Broadcast(payload) => Some(payload),
            _ => None,
        })
        .unwrap();
    backup
        .service
        .handle_command(ConsensusCommand::Payload(proposal.clone()))
        .await;
    proposal
}

#[tokio::test(start_paused = true)]
async fn test_backup_signs_valid_proposal() {
    let keys = keys(4);
    let mut backup = node(&keys, 0).await;
    assert!(backup.service.context().is_backup());

    propose(&keys, &mut backup).await;

    let context = backup.service.context();
    assert!(context
        .state
        .contains(ConsensusState::REQUEST_RECEIVED | ConsensusState::SIGNATURE_SENT));
    assert_eq!(context.signatures_count(), 2);
    let sent = broadcasts(&drain(&mut backup.events));
    assert!(matches!(sent.as_slice(), [ConsensusMessage::PrepareResponse(_)]));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_proposal_leaves_context_untouched() {
    let keys = keys(4);
    let mut backup = node(&keys, 0).await;
    let context = backup.service.context().clone();

    // The header signature was made by the wrong key.
    let payload = prepare_request(
        &keys,
        &context,
        &keys[0],
        address_from_bookkeepers(&public(&keys)).unwrap(),
        vec![Transaction::bookkeeping(7)],
    );
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    assert_rolled_back(&mut backup);
}

#[tokio::test(start_paused = true)]
async fn test_next_bookkeeper_mismatch_rolls_back() {
    let keys = keys(4);
    let mut backup = node(&keys, 0).await;
    let context = backup.service.context().clone();
    let primary = context.primary_index;

    // Correctly signed, but claims a set no vote selected.
    let payload = prepare_request(
        &keys,
        &context,
        &keys[primary],
        address_from_bookkeepers(&public(&keys[..1])).unwrap(),
        vec![Transaction::bookkeeping(7)],
    );
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    assert_rolled_back(&mut backup);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_batch_rolls_back() {
    let keys = keys(4);
    let mut backup = node(&keys, 0).await;
    let context = backup.service.context().clone();
    let primary = context.primary_index;

    let invocation = Transaction::invocation(vec![0x51], 1);
    let payload = prepare_request(
        &keys,
        &context,
        &keys[primary],
        address_from_bookkeepers(&public(&keys)).unwrap(),
        vec![
            Transaction::bookkeeping(7),
            invocation.clone(),
            invocation,
        ],
    );
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    assert_rolled_back(&mut backup);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_prepare_response_is_ignored() {
    let keys = keys(7);
    let mut backup = node(&keys, 0).await;
    propose(&keys, &mut backup).await;
    drain(&mut backup.events);

    let mut context = backup.service.context().clone();
    assert_eq!(context.m(), 5);
    assert_eq!(context.signatures_count(), 2);
    let primary = context.primary_index;
    let signer = (1..7).find(|i| *i != primary).unwrap();
    let hash = context.make_header().unwrap().hash();
    let signature = keys[signer].sign(hash.as_bytes()).to_vec();

    for _ in 0..2 {
        let payload = prepare_response(&context, &keys[signer], signer, signature.clone());
        backup
            .service
            .handle_command(ConsensusCommand::Payload(payload))
            .await;
        assert_eq!(backup.service.context().signatures_count(), 3);
    }

    // A later response from the same bookkeeper does not replace the first.
    let other = keys[signer].sign(b"another header").to_vec();
    let payload = prepare_response(&context, &keys[signer], signer, other);
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    let after = backup.service.context();
    assert_eq!(after.signatures_count(), 3);
    assert_eq!(after.signatures[signer].as_deref(), Some(signature.as_slice()));
    assert_eq!(backup.ledger.current_height(), 0);
    assert!(drain(&mut backup.events).is_empty());
}

/// Completes a quorum on backup 0 whose ledger never stores the block.
async fn commit_on_failing_ledger(stall: bool) {
    let keys = keys(4);
    let mut backup = node_with_ledger(&keys, 0, |inner| {
        Arc::new(FailingLedger { inner, stall }) as Arc<dyn Ledger>
    })
    .await;
    propose(&keys, &mut backup).await;
    drain(&mut backup.events);

    let mut context = backup.service.context().clone();
    let primary = context.primary_index;
    let signer = (1..4).find(|i| *i != primary).unwrap();
    let hash = context.make_header().unwrap().hash();
    let payload = prepare_response(
        &context,
        &keys[signer],
        signer,
        keys[signer].sign(hash.as_bytes()).to_vec(),
    );
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    let after = backup.service.context();
    assert_eq!(after.signatures_count(), 3);
    assert!(!after.state.block_generated());
    assert_eq!(after.expected_view[0], 1);
    assert_eq!(after.view_number, 0);
    assert_eq!(backup.ledger.current_height(), 0);

    let events = drain(&mut backup.events);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ConsensusEvent::BlockCommitted { .. })));
    assert!(matches!(
        broadcasts(&events).as_slice(),
        [ConsensusMessage::ChangeView(cv)] if cv.new_view_number == 1
    ));
}

#[tokio::test(start_paused = true)]
async fn test_ledger_rejection_requests_view_change() {
    commit_on_failing_ledger(false).await;
}

#[tokio::test(start_paused = true)]
async fn test_ledger_append_timeout_requests_view_change() {
    commit_on_failing_ledger(true).await;
}

#[tokio::test(start_paused = true)]
async fn test_expected_view_only_grows() {
    let keys = keys(4);
    let mut node = node(&keys, 0).await;

    node.service.on_change_view(1, ChangeViewMessage::new(0, 2));
    node.service.on_change_view(1, ChangeViewMessage::new(0, 1));
    assert_eq!(node.service.context().expected_view[1], 2);

    node.service.request_change_view();
    node.service.request_change_view();
    assert_eq!(node.service.context().expected_view[0], 2);
    assert_eq!(node.service.context().view_number, 0);
}

#[tokio::test(start_paused = true)]
async fn test_quorum_of_change_views_moves_view() {
    let keys = keys(4);
    let mut node = node(&keys, 0).await;

    node.service.request_change_view();
    node.service.on_change_view(1, ChangeViewMessage::new(0, 1));
    assert_eq!(node.service.context().view_number, 0);
    node.service.on_change_view(2, ChangeViewMessage::new(0, 1));

    let context = node.service.context();
    assert_eq!(context.view_number, 1);
    assert_eq!(context.primary_index, crate::primary_index(1, 1, 4));
    assert!(drain(&mut node.events)
        .iter()
        .any(|e| matches!(e, ConsensusEvent::ViewChanged { height: 1, view: 1 })));
}

#[tokio::test(start_paused = true)]
async fn test_block_signatures_merge_once() {
    let keys = keys(4);
    let mut backup = node(&keys, 0).await;
    propose(&keys, &mut backup).await;
    drain(&mut backup.events);

    let context = backup.service.context().clone();
    let primary = context.primary_index;
    let signer = (0..4).find(|i| *i != 0 && *i != primary).unwrap();
    let hash = context.clone().make_header().unwrap().hash();
    let good = SignatureEntry {
        index: signer as u16,
        signature: keys[signer].sign(hash.as_bytes()).to_vec(),
    };
    let bad = SignatureEntry {
        index: signer as u16,
        signature: vec![0; 64],
    };

    // Duplicates and bad signatures change nothing.
    let replay = BlockSignaturesMessage {
        view_number: 0,
        signatures: vec![
            SignatureEntry {
                index: primary as u16,
                signature: vec![1; 64],
            },
            bad,
        ],
    };
    let payload = payload_from(
        &context,
        &keys[primary],
        primary as u16,
        ConsensusMessage::BlockSignatures(replay),
    );
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;
    assert_eq!(backup.service.context().signatures_count(), 2);
    assert_eq!(backup.ledger.current_height(), 0);

    let merged = BlockSignaturesMessage {
        view_number: 0,
        signatures: vec![good.clone(), good],
    };
    let payload = payload_from(
        &context,
        &keys[primary],
        primary as u16,
        ConsensusMessage::BlockSignatures(merged),
    );
    backup
        .service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    assert_eq!(backup.ledger.current_height(), 1);
    assert!(backup
        .service
        .context()
        .state
        .contains(ConsensusState::BLOCK_GENERATED));
    let events = drain(&mut backup.events);
    let committed = events
        .iter()
        .filter(|e| matches!(e, ConsensusEvent::BlockCommitted { height: 1, .. }))
        .count();
    assert_eq!(committed, 1);
    assert!(matches!(
        broadcasts(&events).as_slice(),
        [ConsensusMessage::BlockSignatures(m)] if m.signatures.len() == 3
    ));
}

#[tokio::test(start_paused = true)]
async fn test_screens_foreign_payloads() {
    let keys = keys(4);
    let mut node = node(&keys, 0).await;
    let context = node.service.context().clone();

    let mut other_height = context.clone();
    other_height.height += 1;
    let payload = payload_from(
        &other_height,
        &keys[1],
        1,
        ConsensusMessage::ChangeView(ChangeViewMessage::new(0, 1)),
    );
    node.service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    // Signed by the wrong key.
    let payload = payload_from(
        &context,
        &keys[2],
        1,
        ConsensusMessage::ChangeView(ChangeViewMessage::new(0, 1)),
    );
    node.service
        .handle_command(ConsensusCommand::Payload(payload))
        .await;

    node.service
        .handle_command(ConsensusCommand::Timeout(HView {
            height: 99,
            view_number: 0,
        }))
        .await;

    assert_eq!(node.service.context().expected_view, vec![0; 4]);
    assert!(drain(&mut node.events).is_empty());
}
