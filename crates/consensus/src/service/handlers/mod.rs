//! Handlers for payloads received from other bookkeepers.

mod change_view;
mod prepare;
mod signatures;

use super::ConsensusService;
use crate::messages::ConsensusMessage;
use crate::payload::ConsensusPayload;
use tracing::debug;

impl ConsensusService {
    /// Screens an inbound payload and dispatches its message.
    pub(super) async fn on_payload(&mut self, payload: ConsensusPayload) {
        let Some(my_index) = self.context.bookkeeper_index else {
            return;
        };
        let sender = usize::from(payload.bookkeeper_index);
        if sender == my_index {
            return;
        }
        if payload.version != self.context.version
            || payload.prev_hash != self.context.prev_hash
            || payload.height != self.context.height
        {
            debug!(
                height = payload.height,
                current = self.context.height,
                sender,
                "dropping payload for another block"
            );
            return;
        }
        if self.context.state.block_generated() {
            return;
        }
        if sender >= self.context.bookkeepers.len() {
            debug!(sender, "dropping payload from unknown bookkeeper");
            return;
        }

        let message = match payload.message() {
            Ok(message) => message,
            Err(err) => {
                debug!(sender, %err, "dropping malformed payload");
                return;
            }
        };
        if !matches!(message, ConsensusMessage::ChangeView(_))
            && message.view_number() != self.context.view_number
        {
            debug!(
                sender,
                kind = %message.message_type(),
                view = message.view_number(),
                current = self.context.view_number,
                "dropping payload for another view"
            );
            return;
        }
        if !payload.verify(&self.context.bookkeepers[sender]) {
            debug!(sender, "dropping payload with a bad signature");
            return;
        }

        let result = match message {
            ConsensusMessage::ChangeView(message) => {
                self.on_change_view(sender, message);
                Ok(())
            }
            ConsensusMessage::PrepareRequest(message) => {
                self.on_prepare_request(sender, payload.timestamp, message)
                    .await
            }
            ConsensusMessage::PrepareResponse(message) => {
                self.on_prepare_response(sender, message).await
            }
            ConsensusMessage::BlockSignatures(message) => {
                self.on_block_signatures(sender, message).await
            }
        };
        if let Err(err) = result {
            debug!(sender, %err, "payload rejected");
        }
    }
}
