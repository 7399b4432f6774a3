//! Wiring of one bookkeeper: ledger, pool and the consensus actor.

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use onyx_consensus::{ConsensusEvent, ConsensusHandle, ConsensusMessage, ConsensusService};
use onyx_cryptography::PublicKey;
use onyx_ledger::{Ledger, MemoryLedger, MemoryPool, MempoolConfig, VoteValidatorSelector};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

pub struct Node {
    public_key: PublicKey,
    ledger: Arc<MemoryLedger>,
    pool: Arc<MemoryPool>,
    service: ConsensusService,
    handle: ConsensusHandle,
    events: mpsc::UnboundedReceiver<ConsensusEvent>,
}

impl Node {
    pub fn new(config: &NodeConfig) -> Result<Self> {
        let keypair = config.keypair()?;
        let public_key = keypair.public_key().clone();
        let bookkeepers = config.bookkeepers(&public_key)?;
        if !bookkeepers.contains(&public_key) {
            warn!(key = %public_key, "node key is not a genesis bookkeeper, following only");
        }

        let ledger = Arc::new(
            MemoryLedger::with_genesis(bookkeepers, config.node.genesis_timestamp)
                .context("failed to build the genesis block")?,
        );
        let pool = Arc::new(MemoryPool::new(MempoolConfig::default()));
        let (events_tx, events) = mpsc::unbounded_channel();
        let (service, handle) = ConsensusService::new(
            config.consensus.clone(),
            keypair,
            ledger.clone(),
            pool.clone(),
            Arc::new(VoteValidatorSelector),
            events_tx,
        )
        .context("failed to create the consensus service")?;

        Ok(Self {
            public_key,
            ledger,
            pool,
            service,
            handle,
            events,
        })
    }

    pub fn ledger(&self) -> &Arc<MemoryLedger> {
        &self.ledger
    }

    pub fn pool(&self) -> &Arc<MemoryPool> {
        &self.pool
    }

    /// Runs consensus until `shutdown` completes.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let Self {
            public_key,
            ledger,
            pool,
            service,
            handle,
            mut events,
        } = self;

        let mut persisted = ledger.subscribe();
        let actor = service.spawn();
        handle.start()?;
        info!(
            key = %public_key,
            height = ledger.current_height(),
            bookkeepers = ledger.bookkeepers().len(),
            "node started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Some(event) => on_event(event),
                    None => break,
                },
                block = persisted.recv() => match block {
                    Ok(block) => pool.remove_persisted(&block),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "pool missed block notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        info!(height = ledger.current_height(), "node stopping");
        // The actor may already be gone if the ledger closed.
        let _ = handle.stop();
        actor.await.context("consensus task failed")?;
        Ok(())
    }
}

/// Consensus events. Without a network transport, outbound payloads are logged.
fn on_event(event: ConsensusEvent) {
    match event {
        ConsensusEvent::Broadcast(payload) => match payload.message() {
            Ok(message) => debug!(
                height = payload.height,
                bookkeeper = payload.bookkeeper_index,
                kind = %message.message_type(),
                view = message.view_number(),
                size = payload.data.len(),
                "outbound payload"
            ),
            Err(err) => warn!(%err, "produced an undecodable payload"),
        },
        ConsensusEvent::BlockCommitted { height, hash } => {
            info!(height, %hash, "block committed by this node");
        }
        ConsensusEvent::ViewChanged { height, view } => {
            info!(height, view, "view changed");
        }
    }
}
