//! Single-block AES primitive.
//!
//! Strictly the codebook operation: one block in, one block out, under a
//! fixed key. Chaining, stealing and padding all live in [`crate::engine`],
//! which owns its own stream state instead of reaching into the cipher
//! library's buffering.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::{algorithm::Algorithm, error::CryptoError};

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// One cipher block.
pub type Block = [u8; BLOCK_LEN];

/// Raw single-block AES encrypt/decrypt selected by [`Algorithm`].
#[derive(Clone, Debug)]
pub struct BlockCipher {
    inner: Inner,
}

#[derive(Clone, Debug)]
enum Inner {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl BlockCipher {
    /// Build a cipher for `algorithm` from `key`.
    ///
    /// The key length must equal [`Algorithm::key_len`] exactly; a wrong
    /// length is rejected, never truncated or padded.
    pub fn new(algorithm: Algorithm, key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != algorithm.key_len() {
            return Err(CryptoError::InvalidKeyLength {
                expected: algorithm.key_len(),
                actual: key.len(),
            });
        }
        let length_err = |_| CryptoError::InvalidKeyLength {
            expected: algorithm.key_len(),
            actual: key.len(),
        };
        let inner = match algorithm {
            Algorithm::Aes128 => Inner::Aes128(Aes128::new_from_slice(key).map_err(length_err)?),
            Algorithm::Aes192 => Inner::Aes192(Aes192::new_from_slice(key).map_err(length_err)?),
            Algorithm::Aes256 => Inner::Aes256(Aes256::new_from_slice(key).map_err(length_err)?),
        };
        Ok(Self { inner })
    }

    /// Encrypt one block in place.
    pub fn encrypt_block(&self, block: &mut Block) {
        let block = aes::Block::from_mut_slice(block);
        match &self.inner {
            Inner::Aes128(cipher) => cipher.encrypt_block(block),
            Inner::Aes192(cipher) => cipher.encrypt_block(block),
            Inner::Aes256(cipher) => cipher.encrypt_block(block),
        }
    }

    /// Decrypt one block in place.
    pub fn decrypt_block(&self, block: &mut Block) {
        let block = aes::Block::from_mut_slice(block);
        match &self.inner {
            Inner::Aes128(cipher) => cipher.decrypt_block(block),
            Inner::Aes192(cipher) => cipher.decrypt_block(block),
            Inner::Aes256(cipher) => cipher.decrypt_block(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_is_identity() {
        for alg in [Algorithm::Aes128, Algorithm::Aes192, Algorithm::Aes256] {
            let key = vec![0x42u8; alg.key_len()];
            let cipher = BlockCipher::new(alg, &key).unwrap();
            let original: Block = [0xA5; BLOCK_LEN];
            let mut block = original;
            cipher.encrypt_block(&mut block);
            assert_ne!(block, original);
            cipher.decrypt_block(&mut block);
            assert_eq!(block, original);
        }
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        let err = BlockCipher::new(Algorithm::Aes128, &[0u8; 24]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidKeyLength { expected: 16, actual: 24 });
    }

    #[test]
    fn fips197_aes128_vector() {
        // FIPS 197 appendix C.1
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let cipher = BlockCipher::new(Algorithm::Aes128, &key).unwrap();
        let mut block: Block = [0; BLOCK_LEN];
        block.copy_from_slice(&hex::decode("00112233445566778899aabbccddeeff").unwrap());
        cipher.encrypt_block(&mut block);
        assert_eq!(hex::encode(block), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }
}
