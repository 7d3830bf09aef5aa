//! Symmetric algorithm identifiers.
//!
//! Capability exchange identifies the cipher by ISO OID; everything inside
//! this crate works with the closed [`Algorithm`] enum instead. The OID
//! boundary is where unknown identifiers are rejected.

use std::fmt;

use crate::error::CryptoError;

/// OID for AES-128 in CBC mode.
pub const OID_AES128: &str = "2.16.840.1.101.3.4.1.2";
/// OID for AES-192 in CBC mode.
pub const OID_AES192: &str = "2.16.840.1.101.3.4.1.22";
/// OID for AES-256 in CBC mode.
pub const OID_AES256: &str = "2.16.840.1.101.3.4.1.42";

/// Supported symmetric algorithms. Immutable once chosen for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// AES with a 128-bit key
    Aes128,
    /// AES with a 192-bit key
    Aes192,
    /// AES with a 256-bit key
    Aes256,
}

impl Algorithm {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Block length in bytes. 16 for every AES variant.
    pub fn block_len(self) -> usize {
        crate::block::BLOCK_LEN
    }

    /// The ISO OID this algorithm travels under.
    pub fn oid(self) -> &'static str {
        match self {
            Self::Aes128 => OID_AES128,
            Self::Aes192 => OID_AES192,
            Self::Aes256 => OID_AES256,
        }
    }

    /// Map an OID to an algorithm.
    ///
    /// Any identifier outside the three supported ones is rejected here;
    /// nothing downstream ever sees an unmapped algorithm.
    pub fn from_oid(oid: &str) -> Result<Self, CryptoError> {
        match oid {
            OID_AES128 => Ok(Self::Aes128),
            OID_AES192 => Ok(Self::Aes192),
            OID_AES256 => Ok(Self::Aes256),
            other => Err(CryptoError::UnsupportedAlgorithm { oid: other.to_string() }),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128 => write!(f, "AES-128"),
            Self::Aes192 => write!(f, "AES-192"),
            Self::Aes256 => write!(f, "AES-256"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_lengths() {
        assert_eq!(Algorithm::Aes128.key_len(), 16);
        assert_eq!(Algorithm::Aes192.key_len(), 24);
        assert_eq!(Algorithm::Aes256.key_len(), 32);
    }

    #[test]
    fn block_length_is_16_for_all() {
        for alg in [Algorithm::Aes128, Algorithm::Aes192, Algorithm::Aes256] {
            assert_eq!(alg.block_len(), 16);
        }
    }

    #[test]
    fn oid_roundtrip() {
        for alg in [Algorithm::Aes128, Algorithm::Aes192, Algorithm::Aes256] {
            assert_eq!(Algorithm::from_oid(alg.oid()).unwrap(), alg);
        }
    }

    #[test]
    fn unknown_oid_is_rejected() {
        let err = Algorithm::from_oid("1.2.3.4").unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedAlgorithm { oid } if oid == "1.2.3.4"));
    }
}
