//! Roundtrip fuzzing of the keyed cipher context.
//!
//! For any key, tag and payload, decrypting an encryption under matching
//! parameters must return the payload, and ciphertext length must follow
//! the mode-selection contract.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sotto_crypto::{Algorithm, BLOCK_LEN, KeyedCipherContext, SequenceTag};

#[derive(Arbitrary, Debug)]
struct Input {
    key_seed: [u8; 32],
    sequence_number: u16,
    timestamp: u32,
    force_padding: bool,
    use_tag: bool,
    payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    if input.payload.is_empty() {
        return;
    }
    for algorithm in [Algorithm::Aes128, Algorithm::Aes192, Algorithm::Aes256] {
        let key = &input.key_seed[..algorithm.key_len()];
        let mut context = KeyedCipherContext::with_key(algorithm, key).unwrap();
        let tag = SequenceTag {
            sequence_number: input.sequence_number,
            timestamp: input.timestamp,
        };
        let tag = input.use_tag.then_some(&tag);

        let (ciphertext, used_padding) = context
            .encrypt(&input.payload, tag, input.force_padding)
            .unwrap();
        if used_padding {
            assert_eq!(ciphertext.len() % BLOCK_LEN, 0);
            assert!(ciphertext.len() > input.payload.len());
        } else {
            assert_eq!(ciphertext.len(), input.payload.len());
        }

        let recovered = context.decrypt(&ciphertext, tag, used_padding).unwrap();
        assert_eq!(recovered, input.payload);
    }
});
