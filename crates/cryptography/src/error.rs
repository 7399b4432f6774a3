use thiserror::Error;

/// Errors raised while decoding keys.
///
/// Signature checks never error: a signature that does not parse simply
/// fails to verify.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Bad hex, a wrong length or a point/scalar outside the curve.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
