//! Starting, stopping and (re)initializing rounds.

use super::{ConsensusEvent, ConsensusService};
use crate::state::ConsensusState;
use crate::timer::{backoff, HView};
use onyx_ledger::Block;
use tokio::time::Instant;
use tracing::{debug, error, info};

impl ConsensusService {
    pub(super) fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            bookkeeper = %self.keypair.public_key(),
            height = self.ledger.current_height(),
            "consensus started"
        );
        self.initialize_consensus(0);
    }

    pub(super) fn stop(&mut self) {
        self.timer.stop();
        self.incremental.clean();
        if self.started {
            info!(height = self.context.height, "consensus stopped");
        }
        self.started = false;
    }

    pub(super) fn on_block_persisted(&mut self, block: &Block) {
        if !self.started {
            return;
        }
        debug!(
            height = block.height(),
            hash = %block.hash(),
            transactions = block.transactions.len(),
            "block persisted"
        );
        self.block_received = Some(Instant::now());
        self.incremental.add_block(block);
        self.initialize_consensus(0);
    }

    /// Enters `view_number`. View 0 starts a new height from the ledger tip.
    pub(super) fn initialize_consensus(&mut self, view_number: u8) {
        if view_number == 0 {
            self.context.reset(
                self.ledger.current_height(),
                self.ledger.current_block_hash(),
                self.ledger.bookkeepers(),
                self.keypair.public_key(),
            );
        } else {
            if self.context.state.block_generated() {
                return;
            }
            self.context.change_view(view_number);
            info!(
                height = self.context.height,
                view = view_number,
                primary = self.context.primary_index,
                state = %self.context.state,
                "view changed"
            );
            self.emit(ConsensusEvent::ViewChanged {
                height: self.context.height,
                view: view_number,
            });
        }

        if !self.context.is_bookkeeper() {
            debug!(height = self.context.height, "not a bookkeeper for this height");
            self.timer.stop();
            return;
        }

        let delay = if self.context.is_primary() {
            // The primary proposes one block time after the previous block.
            match self.block_received {
                Some(received) => self.config.block_time().saturating_sub(received.elapsed()),
                None => std::time::Duration::ZERO,
            }
        } else {
            backoff(self.config.block_time(), view_number)
        };
        let role = if self.context.is_primary() {
            "primary"
        } else {
            "backup"
        };
        debug!(
            height = self.context.height,
            view = view_number,
            role,
            ?delay,
            "round initialized"
        );
        self.timer.reset(self.context.height_view(), delay);
    }

    pub(super) async fn on_timeout(&mut self, fired: HView) {
        if fired != self.context.height_view() {
            debug!(%fired, current = %self.context.height_view(), "stale timeout");
            return;
        }
        info!(
            height = fired.height,
            view = fired.view_number,
            state = %self.context.state,
            "timeout"
        );

        let state = self.context.state;
        if state.is_primary() && !state.contains(ConsensusState::REQUEST_SENT) {
            if let Err(err) = self.send_prepare_request() {
                error!(height = fired.height, %err, "failed to build a proposal");
                self.request_change_view();
                return;
            }
            self.timer
                .reset(fired, backoff(self.config.block_time(), fired.view_number));
            self.check_signatures().await;
        } else if state.intersects(ConsensusState::ROLES) {
            self.request_change_view();
        }
    }
}
