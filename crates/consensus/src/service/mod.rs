//! Consensus service - the dBFT state machine.
//!
//! The service is an actor. Commands, timer firings and ledger
//! notifications are handled one at a time on a single task, so the
//! context needs no locking. The only suspension point inside a turn is the
//! ledger append, which is bounded by the configured timeout.

mod handlers;
mod lifecycle;
mod proposal;
#[cfg(test)]
mod tests;

use crate::config::ConsensusConfig;
use crate::context::ConsensusContext;
use crate::payload::ConsensusPayload;
use crate::timer::{HView, ViewTimer};
use crate::{ConsensusError, ConsensusResult};
use onyx_core::UInt256;
use onyx_cryptography::KeyPair;
use onyx_ledger::{IncrementalValidator, Ledger, TxPool, ValidatorSelector};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Events emitted by the consensus service
#[derive(Debug, Clone)]
pub enum ConsensusEvent {
    /// A signed payload for every other bookkeeper.
    Broadcast(ConsensusPayload),
    /// This node appended a block through consensus.
    BlockCommitted { height: u32, hash: UInt256 },
    /// Enough bookkeepers agreed to move to a new view.
    ViewChanged { height: u32, view: u8 },
}

/// Commands accepted by the consensus service
#[derive(Debug, Clone)]
pub enum ConsensusCommand {
    Start,
    /// Stops the timer and ends the actor.
    Stop,
    /// A payload received from the network.
    Payload(ConsensusPayload),
    /// Posted by the view timer.
    Timeout(HView),
}

/// Sending side of a running service.
#[derive(Debug, Clone)]
pub struct ConsensusHandle {
    commands: mpsc::UnboundedSender<ConsensusCommand>,
}

impl ConsensusHandle {
    fn send(&self, command: ConsensusCommand) -> ConsensusResult<()> {
        self.commands
            .send(command)
            .map_err(|_| ConsensusError::state_error("consensus service has stopped"))
    }

    pub fn start(&self) -> ConsensusResult<()> {
        self.send(ConsensusCommand::Start)
    }

    pub fn stop(&self) -> ConsensusResult<()> {
        self.send(ConsensusCommand::Stop)
    }

    /// Hands an inbound payload to the service.
    pub fn deliver(&self, payload: ConsensusPayload) -> ConsensusResult<()> {
        self.send(ConsensusCommand::Payload(payload))
    }
}

/// The dBFT service of one bookkeeper.
pub struct ConsensusService {
    context: ConsensusContext,
    config: ConsensusConfig,
    keypair: KeyPair,
    ledger: Arc<dyn Ledger>,
    tx_pool: Arc<dyn TxPool>,
    selector: Arc<dyn ValidatorSelector>,
    incremental: IncrementalValidator,
    timer: ViewTimer<ConsensusCommand>,
    /// When the last block arrived; `None` until one does.
    block_received: Option<Instant>,
    started: bool,
    events: mpsc::UnboundedSender<ConsensusEvent>,
    commands: Option<mpsc::UnboundedReceiver<ConsensusCommand>>,
}

impl ConsensusService {
    /// Creates a service and the handle used to drive it.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        config: ConsensusConfig,
        keypair: KeyPair,
        ledger: Arc<dyn Ledger>,
        tx_pool: Arc<dyn TxPool>,
        selector: Arc<dyn ValidatorSelector>,
        events: mpsc::UnboundedSender<ConsensusEvent>,
    ) -> ConsensusResult<(Self, ConsensusHandle)> {
        let config = config.normalized();
        config.validate()?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let service = Self {
            context: ConsensusContext::new(config.version),
            incremental: IncrementalValidator::new(config.incremental_window),
            timer: ViewTimer::new(commands_tx.clone(), ConsensusCommand::Timeout),
            config,
            keypair,
            ledger,
            tx_pool,
            selector,
            block_received: None,
            started: false,
            events,
            commands: Some(commands_rx),
        };
        Ok((
            service,
            ConsensusHandle {
                commands: commands_tx,
            },
        ))
    }

    pub fn context(&self) -> &ConsensusContext {
        &self.context
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Runs the actor on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Processes commands and ledger notifications until stopped.
    pub async fn run(mut self) {
        let Some(mut commands) = self.commands.take() else {
            warn!("consensus service is already running");
            return;
        };
        let mut persisted = self.ledger.subscribe();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ConsensusCommand::Stop) | None => {
                        self.stop();
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },
                block = persisted.recv() => match block {
                    Ok(block) => self.on_block_persisted(&block),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed block notifications, restarting round");
                        if self.started {
                            self.initialize_consensus(0);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("ledger closed, stopping consensus");
                        self.stop();
                        break;
                    }
                },
            }
        }
    }

    pub(crate) async fn handle_command(&mut self, command: ConsensusCommand) {
        match command {
            ConsensusCommand::Start => self.start(),
            ConsensusCommand::Stop => self.stop(),
            _ if !self.started => debug!("consensus not started, ignoring command"),
            ConsensusCommand::Payload(payload) => self.on_payload(payload).await,
            ConsensusCommand::Timeout(view) => self.on_timeout(view).await,
        }
    }

    fn emit(&self, event: ConsensusEvent) {
        if self.events.send(event).is_err() {
            debug!("no listener for consensus events");
        }
    }

    /// Signs `payload` with this node's key and hands it to the transport.
    fn sign_and_relay(&self, mut payload: ConsensusPayload) {
        payload.sign(&self.keypair);
        self.emit(ConsensusEvent::Broadcast(payload));
    }

    fn sign_header(&self, hash: &UInt256) -> Vec<u8> {
        self.keypair.sign(hash.as_bytes()).to_vec()
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or_default()
}
