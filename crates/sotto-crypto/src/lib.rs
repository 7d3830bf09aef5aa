//! Sotto media-path cryptography
//!
//! Symmetric crypto core for secure real-time-media sessions: RTP payload
//! encryption and media-key wrap/unwrap under a Diffie-Hellman-derived
//! key-encryption key.
//!
//! # Flow
//!
//! ```text
//! DH shared secret
//!        │
//!        ▼ HKDF-SHA256
//! KeyedCipherContext (key-encryption) ──► wrap / unwrap media key
//!        │
//!        ▼
//! KeyedCipherContext (media)
//!        │
//!        ▼ per packet: IV from sequence tag
//! CtsCipherEngine ──► AES block primitive
//! ```
//!
//! # Why ciphertext stealing
//!
//! Encrypted RTP payloads must not outgrow the original packet. Payloads
//! that are not block-aligned therefore go through CBC ciphertext stealing
//! (CS3), which trades the final two blocks' ordering for a ciphertext of
//! exactly the plaintext's length. Only payloads shorter than one block
//! fall back to padding, signalled to the receiver via the RTP padding
//! bit.
//!
//! # Interop
//!
//! Final-block unpadding validates only the pad-length byte; deployed
//! endpoints exist that write non-conformant pad bytes, and rejecting
//! their media would break calls that otherwise work.
//!
//! # Concurrency
//!
//! Sessions and contexts are deliberately single-threaded: cipher state is
//! packet-ordered. Give each media stream direction one exclusive owner.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod block;
pub mod context;
pub mod engine;
pub mod error;
pub mod iv;
pub mod padding;
pub mod session;

pub use algorithm::{Algorithm, OID_AES128, OID_AES192, OID_AES256};
pub use block::{BLOCK_LEN, Block, BlockCipher};
pub use context::KeyedCipherContext;
pub use engine::{CipherMode, CtsCipherEngine, Direction};
pub use error::CryptoError;
pub use iv::{SEQUENCE_TAG_LEN, SequenceTag, build_iv};
pub use padding::relaxed_unpad;
pub use session::{KeyAgreement, MediaSession, RtpFrame, SessionRole};
