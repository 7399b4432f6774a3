//! Core transaction implementation.

use crate::error::{CoreError, CoreResult};
use crate::UInt256;
use onyx_io::SerializableExt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum payload carried by a single transaction.
pub const MAX_TRANSACTION_PAYLOAD: usize = 0x10000;

/// Length of a compressed secp256r1 public key inside a vote payload.
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionType {
    /// Synthetic transaction placed first in every block by the primary.
    Bookkeeping = 0x00,
    /// Elects the next bookkeeper set.
    Vote = 0x24,
    /// Runs a script in the interpreter when the block is persisted.
    Invocation = 0xD1,
}

impl TransactionType {
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Bookkeeping),
            0x24 => Ok(Self::Vote),
            0xD1 => Ok(Self::Invocation),
            other => Err(CoreError::UnknownTransactionType(other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bookkeeping => "Bookkeeping",
            Self::Vote => "Vote",
            Self::Invocation => "Invocation",
        };
        f.write_str(name)
    }
}

/// A transaction as carried in a block and a `PrepareRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u8,
    pub tx_type: TransactionType,
    pub nonce: u64,
    /// Script bytes for `Invocation`, key list for `Vote`, empty for `Bookkeeping`.
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Builds the bookkeeping transaction that opens every block.
    pub fn bookkeeping(nonce: u64) -> Self {
        Self {
            version: 0,
            tx_type: TransactionType::Bookkeeping,
            nonce,
            payload: Vec::new(),
        }
    }

    /// Builds a transaction that runs `script` when the block is persisted.
    pub fn invocation(script: Vec<u8>, nonce: u64) -> Self {
        Self {
            version: 0,
            tx_type: TransactionType::Invocation,
            nonce,
            payload: script,
        }
    }

    /// Builds a vote naming the next bookkeeper set.
    pub fn vote(keys: &[[u8; PUBLIC_KEY_SIZE]], nonce: u64) -> Self {
        Self {
            version: 0,
            tx_type: TransactionType::Vote,
            nonce,
            payload: super::serialization::encode_vote_keys(keys),
        }
    }

    /// Returns the Hash256 of the serialized transaction.
    pub fn hash(&self) -> UInt256 {
        UInt256::from_array(crate::hash256(&self.to_array()))
    }

    #[inline]
    pub fn is_bookkeeping(&self) -> bool {
        self.tx_type == TransactionType::Bookkeeping
    }

    /// Decodes the key list of a `Vote` transaction.
    ///
    /// # Errors
    ///
    /// Fails when the transaction is not a vote or the payload is malformed.
    pub fn vote_keys(&self) -> CoreResult<Vec<[u8; PUBLIC_KEY_SIZE]>> {
        if self.tx_type != TransactionType::Vote {
            return Err(CoreError::invalid_format(format!(
                "{} transaction carries no vote",
                self.tx_type
            )));
        }
        super::serialization::decode_vote_keys(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        assert_eq!(TransactionType::Invocation.as_byte(), 0xD1);
        assert_eq!(TransactionType::try_from(0x24).unwrap(), TransactionType::Vote);
        assert_eq!(
            TransactionType::try_from(0x80),
            Err(CoreError::UnknownTransactionType(0x80))
        );
    }

    #[test]
    fn test_hash_depends_on_nonce() {
        assert_ne!(
            Transaction::bookkeeping(1).hash(),
            Transaction::bookkeeping(2).hash()
        );
        assert_eq!(
            Transaction::bookkeeping(7).hash(),
            Transaction::bookkeeping(7).hash()
        );
    }

    #[test]
    fn test_vote_keys() {
        let keys = [[2u8; 33], [3u8; 33]];
        let tx = Transaction::vote(&keys, 0);
        assert_eq!(tx.vote_keys().unwrap(), keys.to_vec());
        assert!(Transaction::bookkeeping(0).vote_keys().is_err());
    }
}
