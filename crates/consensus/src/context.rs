//! Consensus context: the height- and view-scoped state of one bookkeeper.
//!
//! Everything here is pure data manipulation. The service clones the
//! context before a tentative change and swaps the clone in once the change
//! has been validated, so a rejected proposal leaves no trace.

use crate::messages::{
    BlockSignaturesMessage, ChangeViewMessage, ConsensusMessage, PrepareRequestMessage,
    PrepareResponseMessage, SignatureEntry,
};
use crate::payload::ConsensusPayload;
use crate::state::ConsensusState;
use crate::timer::HView;
use crate::{ConsensusError, ConsensusResult};
use onyx_core::{Transaction, UInt160, UInt256};
use onyx_cryptography::PublicKey;
use onyx_ledger::{quorum, Block, BlockBuilder, Header};

/// Index of the primary for `(height, view)` among `count` bookkeepers.
///
/// Each view moves the primary one position back.
pub fn primary_index(height: u32, view_number: u8, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (i64::from(height) - i64::from(view_number)).rem_euclid(count as i64) as usize
}

/// State of the consensus round for the next block.
#[derive(Debug, Clone, Default)]
pub struct ConsensusContext {
    /// Payload and block header version.
    pub version: u32,
    pub state: ConsensusState,
    /// Hash of the current chain tip.
    pub prev_hash: UInt256,
    /// Height of the block being agreed on.
    pub height: u32,
    pub view_number: u8,
    /// Bookkeepers for this height in ledger order.
    pub bookkeepers: Vec<PublicKey>,
    /// Our position in `bookkeepers`, if we are one.
    pub bookkeeper_index: Option<usize>,
    pub primary_index: usize,
    /// Latest view each bookkeeper has voted for.
    pub expected_view: Vec<u8>,
    /// One slot per bookkeeper.
    pub signatures: Vec<Option<Vec<u8>>>,
    /// The validator set the proposal hands over to.
    pub next_bookkeepers: Vec<PublicKey>,

    timestamp: u32,
    nonce: u64,
    next_bookkeeper: UInt160,
    transactions: Vec<Transaction>,
    header: Option<Header>,
}

impl ConsensusContext {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Starts a fresh round on top of the tip `(tip_height, tip_hash)`.
    pub fn reset(
        &mut self,
        tip_height: u32,
        tip_hash: UInt256,
        bookkeepers: Vec<PublicKey>,
        owner: &PublicKey,
    ) {
        let height = tip_height.saturating_add(1);
        let count = bookkeepers.len();
        *self = Self {
            version: self.version,
            prev_hash: tip_hash,
            height,
            bookkeeper_index: bookkeepers.iter().position(|key| key == owner),
            primary_index: primary_index(height, 0, count),
            expected_view: vec![0; count],
            signatures: vec![None; count],
            bookkeepers,
            ..Default::default()
        };
        self.assign_role();
    }

    /// Moves to `view_number` within the same height.
    ///
    /// Only height-scoped flags survive. The proposal and collected
    /// signatures are kept while one of them is set, so a node that already
    /// signed keeps its block.
    pub fn change_view(&mut self, view_number: u8) {
        self.state &= ConsensusState::HEIGHT_SCOPED;
        self.view_number = view_number;
        self.primary_index = primary_index(self.height, view_number, self.bookkeepers.len());
        if self.state.is_empty() {
            self.transactions.clear();
            self.signatures = vec![None; self.bookkeepers.len()];
            self.header = None;
        }
        self.assign_role();
    }

    fn assign_role(&mut self) {
        if let Some(index) = self.bookkeeper_index {
            self.state.assign_role(index == self.primary_index);
        }
    }

    /// Quorum size.
    #[inline]
    pub fn m(&self) -> usize {
        quorum(self.bookkeepers.len())
    }

    pub fn signatures_count(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    #[inline]
    pub fn is_bookkeeper(&self) -> bool {
        self.bookkeeper_index.is_some()
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.state.is_primary()
    }

    #[inline]
    pub fn is_backup(&self) -> bool {
        self.state.is_backup()
    }

    pub fn height_view(&self) -> HView {
        HView {
            height: self.height,
            view_number: self.view_number,
        }
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn next_bookkeeper(&self) -> UInt160 {
        self.next_bookkeeper
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Installs a proposal and drops the cached header.
    pub fn set_proposal(
        &mut self,
        timestamp: u32,
        nonce: u64,
        next_bookkeeper: UInt160,
        transactions: Vec<Transaction>,
    ) {
        self.timestamp = timestamp;
        self.nonce = nonce;
        self.next_bookkeeper = next_bookkeeper;
        self.transactions = transactions;
        self.header = None;
    }

    /// The unsigned header of the current proposal, or `None` without one.
    ///
    /// Built once per proposal.
    pub fn make_header(&mut self) -> Option<Header> {
        if self.transactions.is_empty() {
            return None;
        }
        if self.header.is_none() {
            let header = BlockBuilder::new()
                .version(self.version)
                .prev_hash(self.prev_hash)
                .height(self.height)
                .timestamp(self.timestamp)
                .nonce(self.nonce)
                .next_bookkeeper(self.next_bookkeeper)
                .transactions(self.transactions.clone())
                .header();
            self.header = Some(header);
        }
        self.header.clone()
    }

    /// The signed block once a quorum of signatures is in, together with the
    /// entries that went into it.
    ///
    /// Takes the first `m` signatures in bookkeeper order.
    pub fn make_block(&mut self) -> Option<(Block, Vec<SignatureEntry>)> {
        if self.signatures_count() < self.m() {
            return None;
        }
        let mut header = self.make_header()?;
        let entries: Vec<SignatureEntry> = self
            .signatures
            .iter()
            .enumerate()
            .filter_map(|(index, signature)| {
                signature.as_ref().map(|signature| SignatureEntry {
                    index: index as u16,
                    signature: signature.clone(),
                })
            })
            .take(self.m())
            .collect();
        header.bookkeepers = self.bookkeepers.clone();
        header.sig_data = entries.iter().map(|e| e.signature.clone()).collect();
        let block = Block {
            header,
            transactions: self.transactions.clone(),
        };
        Some((block, entries))
    }

    fn make_payload(&self, message: ConsensusMessage) -> ConsensusResult<ConsensusPayload> {
        let index = self.bookkeeper_index.ok_or(ConsensusError::NotValidator)?;
        Ok(ConsensusPayload {
            version: self.version,
            prev_hash: self.prev_hash,
            height: self.height,
            bookkeeper_index: index as u16,
            timestamp: self.timestamp,
            data: message.to_bytes(),
            signature: Vec::new(),
        })
    }

    /// A vote for the view this node currently expects.
    pub fn make_change_view(&self) -> ConsensusResult<ConsensusPayload> {
        let index = self.bookkeeper_index.ok_or(ConsensusError::NotValidator)?;
        self.make_payload(ConsensusMessage::ChangeView(ChangeViewMessage::new(
            self.view_number,
            self.expected_view[index],
        )))
    }

    /// The primary's proposal, carrying its own header signature.
    pub fn make_prepare_request(&self) -> ConsensusResult<ConsensusPayload> {
        let index = self.bookkeeper_index.ok_or(ConsensusError::NotValidator)?;
        let signature = self.signatures[index]
            .clone()
            .ok_or_else(|| ConsensusError::state_error("proposal is not signed"))?;
        self.make_payload(ConsensusMessage::PrepareRequest(PrepareRequestMessage {
            view_number: self.view_number,
            nonce: self.nonce,
            next_bookkeeper: self.next_bookkeeper,
            transactions: self.transactions.clone(),
            signature,
        }))
    }

    pub fn make_prepare_response(&self, signature: Vec<u8>) -> ConsensusResult<ConsensusPayload> {
        self.make_payload(ConsensusMessage::PrepareResponse(PrepareResponseMessage {
            view_number: self.view_number,
            signature,
        }))
    }

    pub fn make_block_signatures(
        &self,
        signatures: Vec<SignatureEntry>,
    ) -> ConsensusResult<ConsensusPayload> {
        self.make_payload(ConsensusMessage::BlockSignatures(BlockSignaturesMessage {
            view_number: self.view_number,
            signatures,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_cryptography::KeyPair;

    fn keys(n: usize) -> Vec<KeyPair> {
        let mut keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
        keys.sort_by(|a, b| a.public_key().cmp(b.public_key()));
        keys
    }

    fn context_for(keys: &[KeyPair], owner: usize, tip_height: u32) -> ConsensusContext {
        let mut context = ConsensusContext::new(0);
        context.reset(
            tip_height,
            UInt256::from_array([1; 32]),
            keys.iter().map(|k| k.public_key().clone()).collect(),
            keys[owner].public_key(),
        );
        context
    }

    fn propose(context: &mut ConsensusContext, nonce: u64) {
        context.set_proposal(
            1_000,
            nonce,
            UInt160::zero(),
            vec![Transaction::bookkeeping(nonce)],
        );
    }

    #[test]
    fn test_primary_index() {
        assert_eq!(primary_index(10, 0, 4), 2);
        assert_eq!(primary_index(10, 1, 4), 1);
        assert_eq!(primary_index(1, 3, 4), 2);
        assert_eq!(primary_index(0, 255, 7), 4);
        assert_eq!(primary_index(5, 0, 0), 0);
    }

    #[test]
    fn test_reset_assigns_roles() {
        let keys = keys(4);
        let primary = context_for(&keys, 2, 9);
        assert_eq!(primary.height, 10);
        assert_eq!(primary.primary_index, 2);
        assert!(primary.is_primary());
        assert_eq!(primary.m(), 3);
        assert_eq!(primary.signatures.len(), 4);

        let backup = context_for(&keys, 0, 9);
        assert!(backup.is_backup());
        assert_eq!(backup.bookkeeper_index, Some(0));

        let mut outsider = ConsensusContext::new(0);
        outsider.reset(
            9,
            UInt256::zero(),
            keys.iter().map(|k| k.public_key().clone()).collect(),
            KeyPair::generate().public_key(),
        );
        assert!(!outsider.is_bookkeeper());
        assert_eq!(outsider.state, ConsensusState::empty());
    }

    #[test]
    fn test_reset_at_max_height_saturates() {
        let keys = keys(4);
        let context = context_for(&keys, 0, u32::MAX);
        assert_eq!(context.height, u32::MAX);
        assert_eq!(context.primary_index, primary_index(u32::MAX, 0, 4));
    }

    #[test]
    fn test_change_view_clears_unsigned_progress() {
        let keys = keys(4);
        let mut context = context_for(&keys, 0, 9);
        propose(&mut context, 1);
        context.state |= ConsensusState::REQUEST_RECEIVED;
        context.expected_view[1] = 1;

        context.change_view(1);
        assert_eq!(context.view_number, 1);
        assert_eq!(context.primary_index, 1);
        assert!(context.transactions().is_empty());
        assert!(context.make_header().is_none());
        assert_eq!(context.state, ConsensusState::BACKUP);
        assert_eq!(context.expected_view[1], 1);
    }

    #[test]
    fn test_change_view_keeps_signed_proposal() {
        let keys = keys(4);
        let mut context = context_for(&keys, 1, 9);
        propose(&mut context, 1);
        context.signatures[1] = Some(vec![7; 64]);
        context.state |= ConsensusState::REQUEST_RECEIVED | ConsensusState::SIGNATURE_SENT;

        context.change_view(1);
        assert!(context.is_primary());
        assert!(context.state.contains(ConsensusState::SIGNATURE_SENT));
        assert!(!context.state.contains(ConsensusState::REQUEST_RECEIVED));
        assert_eq!(context.signatures_count(), 1);
        assert_eq!(context.transactions().len(), 1);
    }

    #[test]
    fn test_header_memo_follows_proposal() {
        let keys = keys(4);
        let mut context = context_for(&keys, 0, 9);
        assert!(context.make_header().is_none());

        propose(&mut context, 1);
        let first = context.make_header().unwrap();
        assert_eq!(context.make_header().unwrap().hash(), first.hash());
        assert_eq!(first.height, 10);
        assert_eq!(first.prev_hash, UInt256::from_array([1; 32]));

        propose(&mut context, 2);
        assert_ne!(context.make_header().unwrap().hash(), first.hash());
    }

    #[test]
    fn test_make_block_requires_quorum() {
        let keys = keys(4);
        let mut context = context_for(&keys, 0, 9);
        propose(&mut context, 1);
        context.signatures[3] = Some(vec![3; 64]);
        context.signatures[1] = Some(vec![1; 64]);
        assert!(context.make_block().is_none());

        context.signatures[0] = Some(vec![0; 64]);
        context.signatures[2] = Some(vec![2; 64]);
        let (block, entries) = context.make_block().unwrap();
        assert_eq!(
            entries.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(block.header.sig_data.len(), 3);
        assert_eq!(block.header.bookkeepers.len(), 4);
        assert_eq!(block.hash(), context.make_header().unwrap().hash());
    }

    #[test]
    fn test_payloads_need_a_bookkeeper() {
        let keys = keys(4);
        let mut context = context_for(&keys, 2, 9);
        assert!(matches!(
            context.make_prepare_request(),
            Err(ConsensusError::StateError { .. })
        ));
        propose(&mut context, 1);
        context.signatures[2] = Some(vec![2; 64]);
        let payload = context.make_prepare_request().unwrap();
        assert_eq!(payload.bookkeeper_index, 2);
        assert_eq!(payload.height, 10);
        assert_eq!(payload.timestamp, 1_000);

        context.bookkeeper_index = None;
        assert!(matches!(
            context.make_change_view(),
            Err(ConsensusError::NotValidator)
        ));
    }
}
