//! Relaxed unpadding must never panic and must only reject out-of-range
//! length bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sotto_crypto::{relaxed_unpad, BLOCK_LEN};

fuzz_target!(|block: [u8; BLOCK_LEN]| {
    let length = block[BLOCK_LEN - 1] as usize;
    match relaxed_unpad(&block) {
        Ok(kept) => {
            assert!((1..=BLOCK_LEN).contains(&length));
            assert_eq!(kept, BLOCK_LEN - length);
        }
        Err(_) => assert!(length == 0 || length > BLOCK_LEN),
    }
});
