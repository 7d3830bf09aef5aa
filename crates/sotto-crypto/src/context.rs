//! Keyed per-message cipher context.
//!
//! Couples an [`Algorithm`], a symmetric key and two directional
//! [`CtsCipherEngine`] states. Each Encrypt/Decrypt call re-derives the IV
//! from the packet's sequence tag and picks the block mode from the payload
//! length:
//!
//! - shorter than one block: padded (stealing needs a full block to steal
//!   from), output rounds up to the block length;
//! - not a multiple of the block length: ciphertext stealing, output length
//!   equals input length;
//! - block-aligned: plain CBC, no padding.
//!
//! The receiver cannot infer the padded case on its own, so the
//! `used_padding` flag travels with the packet (as the RTP padding bit) and
//! is passed back into [`decrypt`](KeyedCipherContext::decrypt).

use rand::RngCore;
use rand::rngs::OsRng;

use crate::{
    algorithm::Algorithm,
    block::{BLOCK_LEN, Block, BlockCipher},
    engine::{CipherMode, CtsCipherEngine, Direction},
    error::CryptoError,
    iv::{SequenceTag, build_iv},
};

/// Algorithm, key and two directional cipher streams.
///
/// Not safe for concurrent use: each direction's stream state is
/// packet-ordered mutable state, so callers serialize access per media
/// stream direction.
pub struct KeyedCipherContext {
    algorithm: Algorithm,
    encrypt: Option<CtsCipherEngine>,
    decrypt: Option<CtsCipherEngine>,
}

impl KeyedCipherContext {
    /// Unkeyed context bound to `algorithm`.
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm, encrypt: None, decrypt: None }
    }

    /// Context keyed immediately.
    pub fn with_key(algorithm: Algorithm, key: &[u8]) -> Result<Self, CryptoError> {
        let mut context = Self::new(algorithm);
        context.set_key(key)?;
        Ok(context)
    }

    /// The algorithm this context was constructed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// True once key material has been installed.
    pub fn is_keyed(&self) -> bool {
        self.encrypt.is_some()
    }

    /// Install `key`, re-initializing both directions to an empty stream
    /// state.
    ///
    /// A key of the wrong length is rejected without touching whatever key
    /// was installed before.
    pub fn set_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        let cipher = BlockCipher::new(self.algorithm, key)?;
        self.encrypt = Some(CtsCipherEngine::new(cipher.clone(), Direction::Encrypt));
        self.decrypt = Some(CtsCipherEngine::new(cipher, Direction::Decrypt));
        Ok(())
    }

    /// Encrypt one message.
    ///
    /// Returns the ciphertext and whether padding was applied. Padding is
    /// used when forced or when the plaintext is shorter than one block;
    /// the flag must travel to the receiver alongside the ciphertext.
    pub fn encrypt(
        &mut self,
        plaintext: &[u8],
        tag: Option<&SequenceTag>,
        force_padding: bool,
    ) -> Result<(Vec<u8>, bool), CryptoError> {
        let iv = iv_block(tag);
        let engine = self.encrypt.as_mut().ok_or(CryptoError::UnkeyedContext)?;
        engine.reset(CipherMode::Cbc, &iv);

        let used_padding = force_padding || plaintext.len() < BLOCK_LEN;
        let mut ciphertext = Vec::with_capacity(plaintext.len() + BLOCK_LEN);
        if !used_padding && plaintext.len() % BLOCK_LEN != 0 {
            engine.update_cts(plaintext, &mut ciphertext);
            engine.finish_cts(&mut ciphertext)?;
        } else {
            engine.update(plaintext, &mut ciphertext);
            engine.finish(used_padding, &mut ciphertext)?;
        }
        Ok((ciphertext, used_padding))
    }

    /// Decrypt one message, mirroring [`encrypt`](Self::encrypt)'s mode
    /// selection via the caller-supplied `used_padding` flag.
    pub fn decrypt(
        &mut self,
        ciphertext: &[u8],
        tag: Option<&SequenceTag>,
        used_padding: bool,
    ) -> Result<Vec<u8>, CryptoError> {
        let iv = iv_block(tag);
        let engine = self.decrypt.as_mut().ok_or(CryptoError::UnkeyedContext)?;
        engine.reset(CipherMode::Cbc, &iv);

        let mut plaintext = Vec::with_capacity(ciphertext.len());
        if !used_padding && ciphertext.len() % BLOCK_LEN != 0 {
            engine.update_cts(ciphertext, &mut plaintext);
            engine.finish_cts(&mut plaintext)?;
        } else {
            engine.update(ciphertext, &mut plaintext);
            engine.finish(used_padding, &mut plaintext)?;
        }
        Ok(plaintext)
    }

    /// Fresh random key of `algorithm`'s key length from the OS entropy
    /// source.
    pub fn generate_key(algorithm: Algorithm) -> Vec<u8> {
        let mut key = vec![0u8; algorithm.key_len()];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Fresh random key for this context's algorithm, adopted immediately.
    pub fn generate_random_key(&mut self) -> Result<Vec<u8>, CryptoError> {
        let key = Self::generate_key(self.algorithm);
        self.set_key(&key)?;
        Ok(key)
    }
}

fn iv_block(tag: Option<&SequenceTag>) -> Block {
    let iv = build_iv(BLOCK_LEN, tag);
    let mut block = [0u8; BLOCK_LEN];
    block.copy_from_slice(&iv);
    block
}
