//! Media-path crypto session.
//!
//! Ties the Diffie-Hellman collaborator, the media key and the per-packet
//! cipher contexts into one establishment and packet-processing flow:
//!
//! ```text
//! DH shared secret
//!        │
//!        ▼ HKDF-SHA256
//! key-encryption key ──► key context ──► wrap / unwrap media key
//!                                              │
//!                                              ▼
//!                          media key ──► media context ──► RTP payloads
//! ```
//!
//! The Master generates the media key at session creation; the Slave
//! receives it wrapped and must call [`decode_media_key`] before any
//! packet decrypt, otherwise the media context is unkeyed and packet
//! operations fail with [`CryptoError::UnkeyedContext`].
//!
//! [`decode_media_key`]: MediaSession::decode_media_key

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    algorithm::Algorithm,
    context::KeyedCipherContext,
    error::CryptoError,
    iv::SequenceTag,
};

/// Domain label for deriving the key-encryption key from the DH secret.
const KEK_LABEL: &[u8] = b"sotto media kek v1";

/// Produces the Diffie-Hellman shared secret for a session.
///
/// The agreement itself (group parameters, exchange messages) lives outside
/// this crate; a session only consumes the resulting secret bytes.
pub trait KeyAgreement {
    /// Shared secret bytes. Any length; the session adapts it to the
    /// key-encryption key length via HKDF.
    fn shared_secret(&self) -> Vec<u8>;
}

/// The RTP packet fields a session reads and writes.
///
/// Payload and padding flag are the only fields ever written; every other
/// header field stays untouched.
pub trait RtpFrame {
    /// RTP sequence number.
    fn sequence_number(&self) -> u16;
    /// RTP timestamp.
    fn timestamp(&self) -> u32;
    /// RTP padding bit.
    fn padding(&self) -> bool;
    /// Set the RTP padding bit.
    fn set_padding(&mut self, padding: bool);
    /// Payload bytes.
    fn payload(&self) -> &[u8];
    /// Replace the payload, resizing it to the new length.
    fn set_payload(&mut self, payload: Vec<u8>);
}

/// Which side of the key exchange this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Generates the media key
    Master,
    /// Receives and unwraps the media key
    Slave,
}

/// One secure media session: a key-encryption context keyed from the DH
/// secret and a media context keyed with the session's media key.
///
/// Single-threaded by design; all cipher state is packet-ordered. One
/// exclusive owner per media stream direction.
pub struct MediaSession<D: KeyAgreement> {
    dh: D,
    key_context: KeyedCipherContext,
    media_context: KeyedCipherContext,
    media_key: Zeroizing<Vec<u8>>,
    role: Option<SessionRole>,
}

impl<D: KeyAgreement> MediaSession<D> {
    /// Session bound to `dh`, both contexts on `algorithm`, uninitialized.
    pub fn new(dh: D, algorithm: Algorithm) -> Self {
        Self {
            dh,
            key_context: KeyedCipherContext::new(algorithm),
            media_context: KeyedCipherContext::new(algorithm),
            media_key: Zeroizing::new(Vec::new()),
            role: None,
        }
    }

    /// Session from the negotiated algorithm OID.
    pub fn from_oid(dh: D, oid: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(dh, Algorithm::from_oid(oid)?))
    }

    /// True once [`create_session`](Self::create_session) has run.
    pub fn is_initialized(&self) -> bool {
        self.role.is_some()
    }

    /// The role recorded at session creation, if any.
    pub fn role(&self) -> Option<SessionRole> {
        self.role
    }

    /// Establish (or re-establish) the session.
    ///
    /// Derives the key-encryption key from the DH shared secret and keys
    /// the key context with it. The Master additionally generates a fresh
    /// media key and keys the media context. Calling this twice re-derives
    /// everything; it is a re-establishment, not a no-op.
    pub fn create_session(&mut self, role: SessionRole) -> Result<(), CryptoError> {
        let secret = Zeroizing::new(self.dh.shared_secret());
        let kek = derive_key_encryption_key(&secret, self.key_context.algorithm());
        self.key_context.set_key(&kek)?;

        if role == SessionRole::Master {
            self.media_key = Zeroizing::new(self.media_context.generate_random_key()?);
            tracing::debug!(key_len = self.media_key.len(), "generated media key");
        }
        self.role = Some(role);
        tracing::debug!(?role, "media session established");
        Ok(())
    }

    /// Wrap the current media key under the key-encryption context.
    ///
    /// No sequence tag, so the IV is zero; the wire mode follows the key
    /// length (24-byte AES-192 keys travel via stealing, 16/32-byte keys
    /// via the aligned path).
    pub fn encode_media_key(&mut self) -> Result<Vec<u8>, CryptoError> {
        if self.media_key.is_empty() {
            return Err(CryptoError::UnkeyedContext);
        }
        let (wrapped, _used_padding) = self.key_context.encrypt(&self.media_key, None, false)?;
        tracing::debug!(wrapped_len = wrapped.len(), "encoded media key");
        Ok(wrapped)
    }

    /// Unwrap a received media key and immediately key the media context
    /// with it. The Slave must call this before any packet decrypt.
    pub fn decode_media_key(&mut self, wrapped: &[u8]) -> Result<(), CryptoError> {
        let key = Zeroizing::new(self.key_context.decrypt(wrapped, None, false)?);
        self.media_context.set_key(&key)?;
        self.media_key = key;
        tracing::debug!(key_len = self.media_key.len(), "decoded media key");
        Ok(())
    }

    /// Encrypt a frame's payload in place.
    ///
    /// Uses the frame's own sequence tag for the IV and raises the frame's
    /// padding bit when padding was applied.
    pub fn encrypt_packet<F: RtpFrame>(&mut self, frame: &mut F) -> Result<(), CryptoError> {
        let tag = frame_tag(frame);
        let (ciphertext, used_padding) =
            self.media_context.encrypt(frame.payload(), Some(&tag), false)?;
        frame.set_payload(ciphertext);
        frame.set_padding(used_padding);
        Ok(())
    }

    /// Decrypt a frame's payload in place, consuming the frame's padding
    /// bit to select the mode and clearing it once padding is stripped.
    pub fn decrypt_packet<F: RtpFrame>(&mut self, frame: &mut F) -> Result<(), CryptoError> {
        let tag = frame_tag(frame);
        let plaintext =
            self.media_context.decrypt(frame.payload(), Some(&tag), frame.padding())?;
        frame.set_payload(plaintext);
        frame.set_padding(false);
        Ok(())
    }
}

fn frame_tag<F: RtpFrame>(frame: &F) -> SequenceTag {
    SequenceTag { sequence_number: frame.sequence_number(), timestamp: frame.timestamp() }
}

/// Adapt the DH shared secret to the key-encryption key length.
///
/// HKDF-SHA256 with a fixed domain label, applied unconditionally even when
/// the secret already has the right length, so both endpoints agree
/// bit-for-bit regardless of the DH group size.
fn derive_key_encryption_key(secret: &[u8], algorithm: Algorithm) -> Zeroizing<Vec<u8>> {
    let hkdf = Hkdf::<Sha256>::new(None, secret);
    let mut key = Zeroizing::new(vec![0u8; algorithm.key_len()]);
    let Ok(()) = hkdf.expand(KEK_LABEL, key.as_mut_slice()) else {
        unreachable!("AES key lengths are valid HKDF-SHA256 output lengths");
    };
    key
}
