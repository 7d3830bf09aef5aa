//! Final-block padding for the standard (non-stealing) path.
//!
//! Unpadding is deliberately relaxed: only the pad-length byte is checked.
//! Some deployed endpoints (Polycom m100 and PVX among them) write
//! arbitrary bytes into the pad area while keeping the length byte correct;
//! verifying every pad byte would reject their media outright.

use crate::{
    block::{BLOCK_LEN, Block},
    error::CryptoError,
};

/// Fill `block` from `used` to the end with pad bytes.
///
/// Every pad byte carries the pad length. `used` may be 0, producing a
/// whole block of padding.
pub(crate) fn fill_pad(block: &mut Block, used: usize) {
    let pad = (BLOCK_LEN - used) as u8;
    for byte in &mut block[used..] {
        *byte = pad;
    }
}

/// Relaxed unpadding of a final decrypted block.
///
/// Reads the last byte as the pad length `n` and returns the number of
/// content bytes to keep (`BLOCK_LEN - n`). The pad bytes themselves are
/// trusted, not verified.
///
/// # Errors
///
/// `InvalidPaddingLength` when `n` is 0 or larger than the block.
pub fn relaxed_unpad(block: &Block) -> Result<usize, CryptoError> {
    let length = block[BLOCK_LEN - 1] as usize;
    if length == 0 || length > BLOCK_LEN {
        return Err(CryptoError::InvalidPaddingLength { length, block_len: BLOCK_LEN });
    }
    Ok(BLOCK_LEN - length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_then_unpad_roundtrip() {
        for used in 0..BLOCK_LEN {
            let mut block = [0xEE; BLOCK_LEN];
            fill_pad(&mut block, used);
            assert_eq!(relaxed_unpad(&block).unwrap(), used);
        }
    }

    #[test]
    fn garbage_pad_bytes_are_tolerated() {
        // Correct length byte, nonsense pad bytes: must still unpad
        let mut block = [0xA7; BLOCK_LEN];
        block[BLOCK_LEN - 1] = 5;
        assert_eq!(relaxed_unpad(&block).unwrap(), BLOCK_LEN - 5);
    }

    #[test]
    fn full_block_of_padding_keeps_nothing() {
        let block = [BLOCK_LEN as u8; BLOCK_LEN];
        assert_eq!(relaxed_unpad(&block).unwrap(), 0);
    }

    #[test]
    fn zero_length_byte_is_rejected() {
        let block = [0u8; BLOCK_LEN];
        let err = relaxed_unpad(&block).unwrap_err();
        assert_eq!(err, CryptoError::InvalidPaddingLength { length: 0, block_len: BLOCK_LEN });
    }

    #[test]
    fn oversized_length_byte_is_rejected() {
        let mut block = [0u8; BLOCK_LEN];
        block[BLOCK_LEN - 1] = 17;
        let err = relaxed_unpad(&block).unwrap_err();
        assert_eq!(err, CryptoError::InvalidPaddingLength { length: 17, block_len: BLOCK_LEN });
    }
}
