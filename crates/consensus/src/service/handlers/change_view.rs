use crate::messages::ChangeViewMessage;
use crate::service::ConsensusService;
use crate::timer::backoff;
use tracing::{info, warn};

impl ConsensusService {
    /// Asks the other bookkeepers to move past the current view.
    pub(in crate::service) fn request_change_view(&mut self) {
        if self.context.state.block_generated() {
            return;
        }
        let Some(index) = self.context.bookkeeper_index else {
            return;
        };
        let expected = self.context.expected_view[index]
            .max(self.context.view_number)
            .saturating_add(1);
        self.context.expected_view[index] = expected;
        info!(
            height = self.context.height,
            view = self.context.view_number,
            new_view = expected,
            state = %self.context.state,
            "requesting view change"
        );

        self.timer.reset(
            self.context.height_view(),
            backoff(self.config.block_time(), expected),
        );
        match self.context.make_change_view() {
            Ok(payload) => self.sign_and_relay(payload),
            Err(err) => warn!(%err, "failed to build change view"),
        }
        self.check_expected_view(expected);
    }

    pub(in crate::service) fn on_change_view(&mut self, sender: usize, message: ChangeViewMessage) {
        let new_view = message.new_view_number;
        if new_view <= self.context.expected_view[sender] {
            return;
        }
        info!(
            height = self.context.height,
            view = message.view_number,
            sender,
            new_view,
            "change view received"
        );
        self.context.expected_view[sender] = new_view;
        self.check_expected_view(new_view);
    }

    /// Moves to `view_number` once a quorum expects it.
    pub(in crate::service) fn check_expected_view(&mut self, view_number: u8) {
        if self.context.view_number == view_number || self.context.state.block_generated() {
            return;
        }
        let votes = self
            .context
            .expected_view
            .iter()
            .filter(|expected| **expected == view_number)
            .count();
        if votes >= self.context.m() {
            self.initialize_consensus(view_number);
        }
    }
}
