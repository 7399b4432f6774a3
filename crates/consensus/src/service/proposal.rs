//! Building the primary's proposal.

use super::{unix_now, ConsensusService};
use crate::state::ConsensusState;
use crate::{ConsensusError, ConsensusResult};
use onyx_core::Transaction;
use onyx_ledger::address_from_bookkeepers;
use tracing::info;

impl ConsensusService {
    /// Proposes a block for the current view and relays it.
    ///
    /// A primary that already signed at this height re-sends the same
    /// proposal. Nothing changes if building it fails.
    pub(super) fn send_prepare_request(&mut self) -> ConsensusResult<()> {
        let mut candidate = self.context.clone();

        if !candidate.state.contains(ConsensusState::SIGNATURE_SENT) {
            let prev = self
                .ledger
                .header_by_hash(&candidate.prev_hash)
                .ok_or_else(|| ConsensusError::state_error("previous header not found"))?;
            let timestamp = prev.timestamp.saturating_add(1).max(unix_now());
            let nonce: u64 = rand::random();

            let valid_height = self.incremental.valid_height_for(candidate.height);
            let limit = self.config.max_transactions_per_block.saturating_sub(1);
            let mut transactions = vec![Transaction::bookkeeping(nonce)];
            transactions.extend(
                self.tx_pool
                    .pending_transactions(valid_height, limit)
                    .into_iter()
                    .filter(|tx| self.incremental.verify(tx, valid_height).is_ok()),
            );

            let mut next = self
                .selector
                .next_bookkeepers(&candidate.bookkeepers, &transactions)?;
            next.sort();
            let next_bookkeeper = address_from_bookkeepers(&next)?;
            candidate.next_bookkeepers = next;
            candidate.set_proposal(timestamp, nonce, next_bookkeeper, transactions);

            let hash = candidate
                .make_header()
                .ok_or_else(|| ConsensusError::state_error("empty proposal"))?
                .hash();
            let index = candidate
                .bookkeeper_index
                .ok_or(ConsensusError::NotValidator)?;
            candidate.signatures[index] = Some(self.sign_header(&hash));
            candidate.state |= ConsensusState::SIGNATURE_SENT;
        }

        candidate.state |= ConsensusState::REQUEST_SENT;
        let payload = candidate.make_prepare_request()?;
        info!(
            height = candidate.height,
            view = candidate.view_number,
            transactions = candidate.transactions().len(),
            timestamp = candidate.timestamp(),
            "sending prepare request"
        );
        self.context = candidate;
        self.sign_and_relay(payload);
        Ok(())
    }
}
