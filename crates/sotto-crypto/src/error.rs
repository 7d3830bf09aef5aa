//! Error types for cipher and session operations.
//!
//! Every failure is reported to the immediate caller as a typed error. A
//! media stream must be able to drop one bad packet and keep running, so
//! nothing here is allowed to abort the session or disappear into a log
//! line.

use thiserror::Error;

/// Errors from cipher and session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Algorithm identifier has no mapped cipher
    #[error("unsupported algorithm: {oid}")]
    UnsupportedAlgorithm {
        /// The OID that could not be mapped
        oid: String,
    },

    /// Key material does not match the algorithm's key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Ciphertext stealing invoked without enough input to steal from
    #[error("ciphertext stealing state error: {reason}")]
    CtsState {
        /// What the engine was missing
        reason: &'static str,
    },

    /// Pad-length byte outside 1..=block length
    #[error("invalid padding length {length} for block size {block_len}")]
    InvalidPaddingLength {
        /// The pad-length byte that was read
        length: usize,
        /// Block size it was validated against
        block_len: usize,
    },

    /// No complete final block was pending when unpadding was requested
    #[error("missing final block")]
    MissingFinalBlock,

    /// Partial-block bytes left over with padding disabled
    #[error("unaligned data: {trailing} trailing bytes with padding disabled")]
    UnalignedCiphertext {
        /// Number of buffered bytes past the last block boundary
        trailing: usize,
    },

    /// Operation attempted before key material was installed
    #[error("context has no key")]
    UnkeyedContext,
}

impl CryptoError {
    /// Returns true if this error means the data itself is bad.
    ///
    /// Fatal errors condemn the packet: retrying with the same bytes fails
    /// identically, so the caller should drop it and move on. Non-fatal
    /// errors are missing-key-material conditions that may succeed once the
    /// session has been keyed.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::CtsState { .. }
            | Self::InvalidPaddingLength { .. }
            | Self::MissingFinalBlock
            | Self::UnalignedCiphertext { .. } => true,

            // Retryable once key material becomes available
            Self::UnsupportedAlgorithm { .. }
            | Self::InvalidKeyLength { .. }
            | Self::UnkeyedContext => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_padding_is_fatal() {
        let err = CryptoError::InvalidPaddingLength { length: 0, block_len: 16 };
        assert!(err.is_fatal());
    }

    #[test]
    fn unkeyed_context_is_not_fatal() {
        assert!(!CryptoError::UnkeyedContext.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = CryptoError::InvalidKeyLength { expected: 16, actual: 24 };
        assert_eq!(err.to_string(), "invalid key length: expected 16, got 24");
    }
}
