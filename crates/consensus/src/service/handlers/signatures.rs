use crate::messages::BlockSignaturesMessage;
use crate::service::{ConsensusEvent, ConsensusService};
use crate::state::ConsensusState;
use crate::{ConsensusError, ConsensusResult};
use onyx_cryptography::ECDsa;
use tracing::{debug, error, info, warn};

impl ConsensusService {
    /// Merges signatures another bookkeeper collected for the same header.
    pub(in crate::service) async fn on_block_signatures(
        &mut self,
        sender: usize,
        message: BlockSignaturesMessage,
    ) -> ConsensusResult<()> {
        let header = self.context.make_header().ok_or_else(|| {
            ConsensusError::state_error("block signatures before the proposal")
        })?;
        let hash = header.hash();
        let count = self.context.bookkeepers.len();
        let m = self.context.m();

        let mut merged = 0usize;
        for entry in message.signatures {
            if self.context.signatures_count() >= m {
                break;
            }
            let index = usize::from(entry.index);
            if index >= count || self.context.signatures[index].is_some() {
                continue;
            }
            if ECDsa::verify(
                &self.context.bookkeepers[index],
                hash.as_bytes(),
                &entry.signature,
            ) {
                self.context.signatures[index] = Some(entry.signature);
                merged += 1;
            }
        }
        debug!(
            height = self.context.height,
            sender,
            merged,
            signatures = self.context.signatures_count(),
            "block signatures received"
        );
        self.check_signatures().await;
        Ok(())
    }

    /// Appends the block once a quorum has signed it.
    pub(in crate::service) async fn check_signatures(&mut self) {
        if self.context.state.block_generated() {
            return;
        }
        let Some((block, entries)) = self.context.make_block() else {
            return;
        };
        let hash = block.hash();
        let height = block.height();

        if self.ledger.is_block_persisted(&hash) {
            debug!(height, %hash, "block already persisted");
            self.context.state |= ConsensusState::BLOCK_GENERATED;
            return;
        }

        let transactions = block.transactions.len();
        match tokio::time::timeout(self.config.append_timeout(), self.ledger.append_block(block))
            .await
        {
            Ok(Ok(())) => {
                self.context.state |= ConsensusState::BLOCK_GENERATED;
                info!(
                    height,
                    %hash,
                    view = self.context.view_number,
                    transactions,
                    signatures = entries.len(),
                    "block committed"
                );
                self.emit(ConsensusEvent::BlockCommitted { height, hash });
                match self.context.make_block_signatures(entries) {
                    Ok(payload) => self.sign_and_relay(payload),
                    Err(err) => warn!(%err, "failed to build block signatures"),
                }
            }
            Ok(Err(err)) => {
                error!(height, %hash, %err, "ledger rejected the block");
                self.request_change_view();
            }
            Err(_) => {
                error!(
                    height,
                    %hash,
                    timeout = ?self.config.append_timeout(),
                    "ledger append timed out"
                );
                self.request_change_view();
            }
        }
    }
}
