use crate::context::ConsensusContext;
use crate::messages::{PrepareRequestMessage, PrepareResponseMessage};
use crate::service::{unix_now, ConsensusService};
use crate::state::ConsensusState;
use crate::{ConsensusError, ConsensusResult};
use onyx_core::UInt256;
use onyx_cryptography::ECDsa;
use onyx_ledger::address_from_bookkeepers;
use tracing::{debug, info, warn};

impl ConsensusService {
    pub(in crate::service) async fn on_prepare_request(
        &mut self,
        sender: usize,
        timestamp: u32,
        message: PrepareRequestMessage,
    ) -> ConsensusResult<()> {
        if !self.context.is_backup() || self.context.state.contains(ConsensusState::REQUEST_RECEIVED)
        {
            return Ok(());
        }
        if sender != self.context.primary_index {
            return Err(ConsensusError::invalid_proposal(format!(
                "prepare request from {sender}, primary is {}",
                self.context.primary_index
            )));
        }
        info!(
            height = self.context.height,
            view = self.context.view_number,
            primary = sender,
            transactions = message.transactions.len(),
            "prepare request received"
        );

        let prev = self
            .ledger
            .header_by_hash(&self.context.prev_hash)
            .ok_or_else(|| ConsensusError::state_error("previous header not found"))?;
        let latest = unix_now().saturating_add(self.config.max_timestamp_drift);
        if timestamp <= prev.timestamp || timestamp > latest {
            return Err(ConsensusError::invalid_proposal(format!(
                "timestamp {timestamp} outside ({}, {latest}]",
                prev.timestamp
            )));
        }

        // Validation runs on a copy so a rejected proposal leaves no trace.
        let (mut candidate, hash) = match self.check_proposal(sender, timestamp, message) {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(
                    height = self.context.height,
                    view = self.context.view_number,
                    %err,
                    "rejecting proposal"
                );
                self.request_change_view();
                return Ok(());
            }
        };

        let index = candidate
            .bookkeeper_index
            .ok_or(ConsensusError::NotValidator)?;
        let signature = self.sign_header(&hash);
        candidate.signatures[index] = Some(signature.clone());
        candidate.state |= ConsensusState::SIGNATURE_SENT;
        self.context = candidate;

        let payload = self.context.make_prepare_response(signature)?;
        self.sign_and_relay(payload);
        self.check_signatures().await;
        Ok(())
    }

    /// Applies the proposal to a copy of the context and checks it.
    fn check_proposal(
        &mut self,
        sender: usize,
        timestamp: u32,
        message: PrepareRequestMessage,
    ) -> ConsensusResult<(ConsensusContext, UInt256)> {
        match message.transactions.first() {
            Some(tx) if tx.is_bookkeeping() => {}
            _ => {
                return Err(ConsensusError::invalid_proposal(
                    "first transaction is not the bookkeeping transaction",
                ))
            }
        }

        let mut candidate = self.context.clone();
        candidate.state |= ConsensusState::REQUEST_RECEIVED;
        candidate.set_proposal(
            timestamp,
            message.nonce,
            message.next_bookkeeper,
            message.transactions,
        );
        let hash = candidate
            .make_header()
            .ok_or_else(|| ConsensusError::state_error("empty proposal"))?
            .hash();
        if !ECDsa::verify(
            &candidate.bookkeepers[sender],
            hash.as_bytes(),
            &message.signature,
        ) {
            return Err(ConsensusError::signature_failed(
                "primary signature does not cover the proposed header",
            ));
        }
        candidate.signatures = vec![None; candidate.bookkeepers.len()];
        candidate.signatures[sender] = Some(message.signature);

        let user_transactions = &candidate.transactions()[1..];
        if user_transactions.iter().any(|tx| tx.is_bookkeeping()) {
            return Err(ConsensusError::invalid_proposal(
                "more than one bookkeeping transaction",
            ));
        }
        if !user_transactions.is_empty() {
            let valid_height = self.incremental.valid_height_for(candidate.height);
            self.tx_pool.verify_block(user_transactions, valid_height)?;
            for tx in user_transactions {
                self.incremental.verify(tx, valid_height)?;
            }
        }

        let mut next = self
            .selector
            .next_bookkeepers(&candidate.bookkeepers, candidate.transactions())?;
        next.sort();
        if address_from_bookkeepers(&next)? != candidate.next_bookkeeper() {
            return Err(ConsensusError::invalid_proposal(
                "next bookkeeper does not match the selected set",
            ));
        }
        candidate.next_bookkeepers = next;
        Ok((candidate, hash))
    }

    pub(in crate::service) async fn on_prepare_response(
        &mut self,
        sender: usize,
        message: PrepareResponseMessage,
    ) -> ConsensusResult<()> {
        if self.context.signatures[sender].is_some() {
            return Ok(());
        }
        let header = self
            .context
            .make_header()
            .ok_or_else(|| ConsensusError::state_error("prepare response before the proposal"))?;
        if !ECDsa::verify(
            &self.context.bookkeepers[sender],
            header.hash().as_bytes(),
            &message.signature,
        ) {
            return Err(ConsensusError::signature_failed(format!(
                "bookkeeper {sender} signed another header"
            )));
        }
        self.context.signatures[sender] = Some(message.signature);
        debug!(
            height = self.context.height,
            sender,
            signatures = self.context.signatures_count(),
            "prepare response received"
        );
        self.check_signatures().await;
        Ok(())
    }
}
