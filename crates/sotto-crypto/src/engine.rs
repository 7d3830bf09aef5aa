//! Streaming block-cipher engine: ciphertext stealing plus the standard
//! padded path.
//!
//! RTP payloads must not grow when encrypted, so payloads that are not a
//! multiple of the block length go through CBC/ECB ciphertext stealing
//! (the CS3 construction): the last two blocks are reordered so the final
//! output block may be short, and total output length equals total input
//! length.
//!
//! ```text
//! Update            Update              Finish
//!   │                 │                   │
//!   ▼                 ▼                   ▼
//! [head blocks] → [withheld block] → [steal + emit final pair]
//!                  + pending tail
//! ```
//!
//! The engine always runs one block behind: the most recent full input
//! block is withheld, because until input ends it cannot know whether that
//! block is the one stealing will rewrite. CBC decryption additionally
//! needs the ciphertext block *before* the withheld one (kept in the
//! chaining slot), since the synthetic final ciphertext block was never
//! transmitted and must be rebuilt by undoing two levels of chaining.
//!
//! All state is owned by [`CipherStreamState`]; the block cipher is used
//! only through its public single-block interface.

use crate::{
    block::{BLOCK_LEN, Block, BlockCipher},
    error::CryptoError,
    padding::{fill_pad, relaxed_unpad},
};

/// Direction a stream operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out
    Encrypt,
    /// Ciphertext in, plaintext out
    Decrypt,
}

/// Block chaining mode.
///
/// Sessions only ever instantiate CBC; ECB exists because the stealing
/// arithmetic differs per mode and both variants are exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherMode {
    /// Each block ciphered independently
    Ecb,
    /// Each block chained to the previous ciphertext block
    #[default]
    Cbc,
}

/// Owned streaming state for one direction.
///
/// `pending` holds input bytes not yet ciphered; it stays below one block
/// except between an aligned-stealing update and its finish, where it holds
/// exactly one. `withheld` is the block held back for stealing, or the
/// decrypted final block awaiting unpadding on the standard decrypt path.
/// `chain` is the running IV; after the head of a message is consumed it
/// holds the lookback block CBC stealing needs on decrypt.
#[derive(Debug, Clone)]
struct CipherStreamState {
    mode: CipherMode,
    chain: Block,
    pending: Vec<u8>,
    withheld: Option<Block>,
}

impl CipherStreamState {
    fn new() -> Self {
        Self {
            mode: CipherMode::default(),
            chain: [0; BLOCK_LEN],
            pending: Vec::with_capacity(BLOCK_LEN),
            withheld: None,
        }
    }
}

/// Streaming cipher engine for one direction of a keyed context.
///
/// Per-message use: [`reset`](Self::reset) with the message IV, then either
/// the stealing pair [`update_cts`](Self::update_cts) /
/// [`finish_cts`](Self::finish_cts) or the standard pair
/// [`update`](Self::update) / [`finish`](Self::finish).
pub struct CtsCipherEngine {
    cipher: BlockCipher,
    direction: Direction,
    state: CipherStreamState,
}

impl CtsCipherEngine {
    /// Engine over `cipher` running in `direction`.
    pub fn new(cipher: BlockCipher, direction: Direction) -> Self {
        Self { cipher, direction, state: CipherStreamState::new() }
    }

    /// Re-arm for a new message: set the chaining IV and mode, drop any
    /// pending or withheld bytes. The key is untouched.
    pub fn reset(&mut self, mode: CipherMode, iv: &Block) {
        self.state.mode = mode;
        self.state.chain = *iv;
        self.state.pending.clear();
        self.state.withheld = None;
    }

    /// Cipher one block with chaining, advancing the chain state.
    fn cipher_block(&mut self, block: &Block) -> Block {
        let mut out = *block;
        match (self.direction, self.state.mode) {
            (Direction::Encrypt, CipherMode::Cbc) => {
                xor_into(&mut out, &self.state.chain);
                self.cipher.encrypt_block(&mut out);
                self.state.chain = out;
            }
            (Direction::Encrypt, CipherMode::Ecb) => self.cipher.encrypt_block(&mut out),
            (Direction::Decrypt, CipherMode::Cbc) => {
                self.cipher.decrypt_block(&mut out);
                xor_into(&mut out, &self.state.chain);
                self.state.chain = *block;
            }
            (Direction::Decrypt, CipherMode::Ecb) => self.cipher.decrypt_block(&mut out),
        }
        out
    }

    /// Standard streaming update: ciphers whole blocks, buffers the tail.
    ///
    /// On the decrypt side the most recent output block is withheld so that
    /// [`finish`](Self::finish) can unpad it.
    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) {
        self.state.pending.extend_from_slice(input);
        while self.state.pending.len() >= BLOCK_LEN {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(&self.state.pending[..BLOCK_LEN]);
            self.state.pending.drain(..BLOCK_LEN);
            let produced = self.cipher_block(&block);
            match self.direction {
                Direction::Encrypt => out.extend_from_slice(&produced),
                Direction::Decrypt => {
                    if let Some(previous) = self.state.withheld.replace(produced) {
                        out.extend_from_slice(&previous);
                    }
                }
            }
        }
    }

    /// Finish the standard path.
    ///
    /// Encrypting with `padding` emits one final padded block; without it
    /// the input must have been block-aligned. Decrypting with `padding`
    /// applies relaxed unpadding to the withheld block; without it the
    /// withheld block is released as-is.
    pub fn finish(&mut self, padding: bool, out: &mut Vec<u8>) -> Result<(), CryptoError> {
        let trailing = self.state.pending.len();
        match (self.direction, padding) {
            (Direction::Encrypt, true) => {
                let mut block = [0u8; BLOCK_LEN];
                block[..trailing].copy_from_slice(&self.state.pending);
                fill_pad(&mut block, trailing);
                self.state.pending.clear();
                let produced = self.cipher_block(&block);
                out.extend_from_slice(&produced);
            }
            (Direction::Encrypt, false) => {
                if trailing != 0 {
                    return Err(CryptoError::UnalignedCiphertext { trailing });
                }
            }
            (Direction::Decrypt, false) => {
                if trailing != 0 {
                    return Err(CryptoError::UnalignedCiphertext { trailing });
                }
                if let Some(block) = self.state.withheld.take() {
                    out.extend_from_slice(&block);
                }
            }
            (Direction::Decrypt, true) => {
                if trailing != 0 {
                    return Err(CryptoError::MissingFinalBlock);
                }
                let block = self.state.withheld.take().ok_or(CryptoError::MissingFinalBlock)?;
                let kept = relaxed_unpad(&block)?;
                out.extend_from_slice(&block[..kept]);
            }
        }
        Ok(())
    }

    /// Ciphertext-stealing update.
    ///
    /// Buffers up to one block, withholds the last full input block, and
    /// ciphers everything before it. Works identically for both directions;
    /// only [`finish_cts`](Self::finish_cts) diverges.
    pub fn update_cts(&mut self, input: &[u8], out: &mut Vec<u8>) {
        if self.state.pending.len() + input.len() <= BLOCK_LEN {
            self.state.pending.extend_from_slice(input);
            return;
        }

        // More input arrived, so the withheld block is not final after all
        if let Some(block) = self.state.withheld.take() {
            let produced = self.cipher_block(&block);
            out.extend_from_slice(&produced);
        }

        let fill = BLOCK_LEN - self.state.pending.len();
        self.state.pending.extend_from_slice(&input[..fill]);
        let input = &input[fill..];

        if input.len() <= BLOCK_LEN {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(&self.state.pending);
            self.state.withheld = Some(block);
            self.state.pending.clear();
            self.state.pending.extend_from_slice(input);
            return;
        }

        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&self.state.pending);
        self.state.pending.clear();
        let produced = self.cipher_block(&block);
        out.extend_from_slice(&produced);

        // Split off the final pair: one full block to withhold, then the
        // tail (a full block when the input is aligned).
        let leftover = input.len() % BLOCK_LEN;
        let tail_len = if leftover > 0 { leftover } else { BLOCK_LEN };
        let head_len = input.len() - BLOCK_LEN - tail_len;

        for chunk in input[..head_len].chunks_exact(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            let produced = self.cipher_block(&block);
            out.extend_from_slice(&produced);
        }

        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&input[head_len..head_len + BLOCK_LEN]);
        self.state.withheld = Some(block);
        self.state.pending.extend_from_slice(&input[head_len + BLOCK_LEN..]);
    }

    /// Complete a ciphertext-stealing message: rewrite and emit the final
    /// two blocks.
    ///
    /// Fails with `CtsState` when the engine never saw enough input to
    /// withhold a block or has no trailing bytes to steal for.
    pub fn finish_cts(&mut self, out: &mut Vec<u8>) -> Result<(), CryptoError> {
        let withheld = self
            .state
            .withheld
            .take()
            .ok_or(CryptoError::CtsState { reason: "no withheld block to steal from" })?;
        let leftover = self.state.pending.len();
        if leftover == 0 {
            return Err(CryptoError::CtsState { reason: "no trailing bytes to steal for" });
        }

        match (self.direction, self.state.mode) {
            (Direction::Encrypt, CipherMode::Ecb) => {
                let mut tail = withheld;
                self.cipher.encrypt_block(&mut tail); // C_n ‖ C'
                let mut full = [0u8; BLOCK_LEN];
                full[..leftover].copy_from_slice(&self.state.pending);
                full[leftover..].copy_from_slice(&tail[leftover..]); // P_n ‖ C'
                self.cipher.encrypt_block(&mut full); // C_{n-1}
                out.extend_from_slice(&full);
                out.extend_from_slice(&tail[..leftover]);
            }
            (Direction::Encrypt, CipherMode::Cbc) => {
                let mut full = withheld;
                xor_into(&mut full, &self.state.chain);
                self.cipher.encrypt_block(&mut full); // C_{n-1} = E(P_{n-1} ⊕ C_{n-2})
                let mut last = [0u8; BLOCK_LEN];
                last[..leftover].copy_from_slice(&self.state.pending); // P_n ‖ 0s
                xor_into(&mut last, &full);
                self.cipher.encrypt_block(&mut last); // C_n = E((P_n ‖ 0s) ⊕ C_{n-1})
                out.extend_from_slice(&last);
                out.extend_from_slice(&full[..leftover]);
            }
            (Direction::Decrypt, CipherMode::Ecb) => {
                let mut tail = withheld;
                self.cipher.decrypt_block(&mut tail); // P_n ‖ C'
                let mut full = [0u8; BLOCK_LEN];
                full[..leftover].copy_from_slice(&self.state.pending);
                full[leftover..].copy_from_slice(&tail[leftover..]); // C_{n-1} rebuilt
                self.cipher.decrypt_block(&mut full); // P_{n-1}
                out.extend_from_slice(&full);
                out.extend_from_slice(&tail[..leftover]);
            }
            (Direction::Decrypt, CipherMode::Cbc) => {
                // withheld = transmitted final full block, pending = the
                // truncated C_{n-1}, chain = C_{n-2}: both lookback blocks
                // are needed to rebuild the never-transmitted synthetic
                // ciphertext block.
                let mut tail = withheld;
                self.cipher.decrypt_block(&mut tail); // (P_n ‖ 0s) ⊕ C_{n-1}
                for (byte, stolen) in tail.iter_mut().zip(&self.state.pending) {
                    *byte ^= stolen; // P_n ‖ C'
                }
                let mut full = [0u8; BLOCK_LEN];
                full[..leftover].copy_from_slice(&self.state.pending);
                full[leftover..].copy_from_slice(&tail[leftover..]); // C_{n-1} rebuilt
                self.cipher.decrypt_block(&mut full);
                xor_into(&mut full, &self.state.chain); // P_{n-1}
                out.extend_from_slice(&full);
                out.extend_from_slice(&tail[..leftover]);
            }
        }

        self.state.pending.clear();
        Ok(())
    }
}

fn xor_into(dst: &mut Block, src: &Block) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;

    // RFC 3962 appendix B key, "chicken teriyaki"
    const KEY: &str = "636869636b656e207465726979616b69";

    fn engine(direction: Direction) -> CtsCipherEngine {
        let key = hex::decode(KEY).unwrap();
        CtsCipherEngine::new(BlockCipher::new(Algorithm::Aes128, &key).unwrap(), direction)
    }

    fn cts_encrypt(plaintext: &[u8]) -> Vec<u8> {
        let mut enc = engine(Direction::Encrypt);
        enc.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        let mut out = Vec::new();
        enc.update_cts(plaintext, &mut out);
        enc.finish_cts(&mut out).unwrap();
        out
    }

    fn cts_decrypt(ciphertext: &[u8]) -> Vec<u8> {
        let mut dec = engine(Direction::Decrypt);
        dec.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        let mut out = Vec::new();
        dec.update_cts(ciphertext, &mut out);
        dec.finish_cts(&mut out).unwrap();
        out
    }

    #[test]
    fn rfc3962_vector_17_bytes() {
        let plaintext = hex::decode("4920776f756c64206c696b652074686520").unwrap();
        let expected = hex::decode("c6353568f2bf8cb4d8a580362da7ff7f97").unwrap();
        assert_eq!(cts_encrypt(&plaintext), expected);
        assert_eq!(cts_decrypt(&expected), plaintext);
    }

    #[test]
    fn rfc3962_vector_31_bytes() {
        let plaintext =
            hex::decode("4920776f756c64206c696b65207468652047656e6572616c20476175277320").unwrap();
        let expected =
            hex::decode("fc00783e0efdb2c1d445d4c8eff7ed2297687268d6ecccc0c07b25e25ecfe5").unwrap();
        assert_eq!(cts_encrypt(&plaintext), expected);
        assert_eq!(cts_decrypt(&expected), plaintext);
    }

    #[test]
    fn rfc3962_vector_32_bytes() {
        let plaintext =
            hex::decode("4920776f756c64206c696b65207468652047656e6572616c2047617527732043")
                .unwrap();
        let expected =
            hex::decode("39312523a78662d5be7fcbcc98ebf5a897687268d6ecccc0c07b25e25ecfe584")
                .unwrap();
        assert_eq!(cts_encrypt(&plaintext), expected);
        assert_eq!(cts_decrypt(&expected), plaintext);
    }

    #[test]
    fn cts_output_length_equals_input_length() {
        for len in BLOCK_LEN + 1..4 * BLOCK_LEN {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ciphertext = cts_encrypt(&plaintext);
            assert_eq!(ciphertext.len(), plaintext.len(), "length {len}");
            assert_eq!(cts_decrypt(&ciphertext), plaintext, "length {len}");
        }
    }

    #[test]
    fn cts_roundtrip_across_split_updates() {
        let plaintext: Vec<u8> = (0..61).map(|i| (i * 7) as u8).collect();
        let mut enc = engine(Direction::Encrypt);
        enc.reset(CipherMode::Cbc, &[0x11; BLOCK_LEN]);
        let mut ciphertext = Vec::new();
        for chunk in plaintext.chunks(5) {
            enc.update_cts(chunk, &mut ciphertext);
        }
        enc.finish_cts(&mut ciphertext).unwrap();

        let mut dec = engine(Direction::Decrypt);
        dec.reset(CipherMode::Cbc, &[0x11; BLOCK_LEN]);
        let mut recovered = Vec::new();
        for chunk in ciphertext.chunks(9) {
            dec.update_cts(chunk, &mut recovered);
        }
        dec.finish_cts(&mut recovered).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn ecb_stealing_roundtrip() {
        for len in [17, 23, 31, 32, 47] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 3) as u8).collect();
            let mut enc = engine(Direction::Encrypt);
            enc.reset(CipherMode::Ecb, &[0; BLOCK_LEN]);
            let mut ciphertext = Vec::new();
            enc.update_cts(&plaintext, &mut ciphertext);
            enc.finish_cts(&mut ciphertext).unwrap();
            assert_eq!(ciphertext.len(), plaintext.len());

            let mut dec = engine(Direction::Decrypt);
            dec.reset(CipherMode::Ecb, &[0; BLOCK_LEN]);
            let mut recovered = Vec::new();
            dec.update_cts(&ciphertext, &mut recovered);
            dec.finish_cts(&mut recovered).unwrap();
            assert_eq!(recovered, plaintext);
        }
    }

    #[test]
    fn finish_without_withheld_block_fails() {
        let mut enc = engine(Direction::Encrypt);
        enc.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        let mut out = Vec::new();
        enc.update_cts(&[0u8; BLOCK_LEN], &mut out); // one block buffers, never withholds
        let err = enc.finish_cts(&mut out).unwrap_err();
        assert!(matches!(err, CryptoError::CtsState { .. }));
    }

    #[test]
    fn standard_padded_roundtrip() {
        for len in [0usize, 1, 5, 15, 16, 20, 32] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let mut enc = engine(Direction::Encrypt);
            enc.reset(CipherMode::Cbc, &[0x22; BLOCK_LEN]);
            let mut ciphertext = Vec::new();
            enc.update(&plaintext, &mut ciphertext);
            enc.finish(true, &mut ciphertext).unwrap();
            assert_eq!(ciphertext.len(), (len / BLOCK_LEN + 1) * BLOCK_LEN);

            let mut dec = engine(Direction::Decrypt);
            dec.reset(CipherMode::Cbc, &[0x22; BLOCK_LEN]);
            let mut recovered = Vec::new();
            dec.update(&ciphertext, &mut recovered);
            dec.finish(true, &mut recovered).unwrap();
            assert_eq!(recovered, plaintext, "length {len}");
        }
    }

    #[test]
    fn standard_unpadded_requires_alignment() {
        let mut enc = engine(Direction::Encrypt);
        enc.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        let mut out = Vec::new();
        enc.update(&[0u8; 18], &mut out);
        let err = enc.finish(false, &mut out).unwrap_err();
        assert_eq!(err, CryptoError::UnalignedCiphertext { trailing: 2 });
    }

    #[test]
    fn decrypt_padded_with_no_final_block_fails() {
        let mut dec = engine(Direction::Decrypt);
        dec.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        let mut out = Vec::new();
        let err = dec.finish(true, &mut out).unwrap_err();
        assert_eq!(err, CryptoError::MissingFinalBlock);
    }

    #[test]
    fn reset_clears_stream_state() {
        let mut enc = engine(Direction::Encrypt);
        enc.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        let mut out = Vec::new();
        enc.update_cts(&[0xAB; 40], &mut out);
        enc.reset(CipherMode::Cbc, &[0; BLOCK_LEN]);
        out.clear();
        // After reset, behaves exactly like a fresh engine
        let plaintext = hex::decode("4920776f756c64206c696b652074686520").unwrap();
        enc.update_cts(&plaintext, &mut out);
        enc.finish_cts(&mut out).unwrap();
        assert_eq!(hex::encode(out), "c6353568f2bf8cb4d8a580362da7ff7f97");
    }
}
