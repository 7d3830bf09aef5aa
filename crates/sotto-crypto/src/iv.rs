//! Per-packet IV synthesis.
//!
//! The IV is never transmitted. Both endpoints rebuild it from the packet's
//! sequence tag (RTP sequence number and timestamp), so synthesis must be a
//! pure function: same tag, same bytes, bit for bit.

/// Length of a serialized sequence tag: 2 bytes sequence number plus 4
/// bytes timestamp.
pub const SEQUENCE_TAG_LEN: usize = 6;

/// Packet ordering tag taken from the RTP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTag {
    /// RTP sequence number
    pub sequence_number: u16,
    /// RTP timestamp
    pub timestamp: u32,
}

impl SequenceTag {
    /// Serialize as sequence number followed by timestamp, big-endian.
    pub fn to_bytes(self) -> [u8; SEQUENCE_TAG_LEN] {
        let mut bytes = [0u8; SEQUENCE_TAG_LEN];
        bytes[..2].copy_from_slice(&self.sequence_number.to_be_bytes());
        bytes[2..].copy_from_slice(&self.timestamp.to_be_bytes());
        bytes
    }
}

/// Build an IV of `iv_len` bytes.
///
/// With a tag, the 6 tag bytes are tiled across the IV, with a partial
/// copy at the end when `iv_len` is not a multiple of 6. Without one, the
/// IV is all zeros.
pub fn build_iv(iv_len: usize, tag: Option<&SequenceTag>) -> Vec<u8> {
    let mut iv = vec![0u8; iv_len];
    if let Some(tag) = tag {
        let bytes = tag.to_bytes();
        for chunk in iv.chunks_mut(SEQUENCE_TAG_LEN) {
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
    iv
}
