//! # Onyx Consensus
//!
//! Delegated Byzantine Fault Tolerance (dBFT) for a fixed bookkeeper set.
//! With `n` bookkeepers, `n - (n - 1) / 3` signatures commit a block.
//!
//! ## Components
//!
//! - **ConsensusService**: the per-node actor driving rounds and view changes
//! - **ConsensusContext**: round state and payload construction
//! - **ConsensusPayload**: the signed envelope exchanged between bookkeepers
//! - **Messages**: ChangeView, PrepareRequest, PrepareResponse, BlockSignatures

pub mod config;
pub mod context;
pub mod error;
pub mod message_type;
pub mod messages;
pub mod payload;
pub mod service;
pub mod state;
pub mod timer;

pub use config::ConsensusConfig;
pub use context::{primary_index, ConsensusContext};
pub use error::{ConsensusError, ConsensusResult};
pub use message_type::ConsensusMessageType;
pub use messages::ConsensusMessage;
pub use payload::ConsensusPayload;
pub use service::{ConsensusCommand, ConsensusEvent, ConsensusHandle, ConsensusService};
pub use state::ConsensusState;
pub use timer::{backoff, HView};
