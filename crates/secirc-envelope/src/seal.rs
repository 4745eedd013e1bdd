//! `seal`/`open`: the envelope's wire format and integrity check.
//!
//! Wire layout: `[2B type_tag][4B payload_len][payload][32B salt]
//! [8B timestamp][8B sequence_number][32B integrity_hash]`, all
//! multi-byte integers big-endian. `integrity_hash ==
//! SHA256(type_tag ∥ payload ∥ salt ∥ type_domain_string)`.

use secirc_crypto::hashing;
use secirc_types::MessageType;

use crate::replay::{ReplayWindow, SequenceAllocator};
use crate::{EnvelopeError, Result};

const SALT_LEN: usize = 32;
const HASH_LEN: usize = 32;
const HEADER_LEN: usize = 2 + 4; // type_tag + payload_len
const TRAILER_LEN: usize = SALT_LEN + 8 + 8 + HASH_LEN;

/// A sealed wire envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub type_tag: MessageType,
    pub payload: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    pub timestamp: u64,
    pub sequence_number: u64,
    pub integrity_hash: [u8; HASH_LEN],
}

fn generate_salt(domain: &str, timestamp: u64) -> [u8; SALT_LEN] {
    let mut base = [0u8; SALT_LEN];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut base);
    let combined = hashing::encode_multi_field(&[&base, domain.as_bytes(), &timestamp.to_be_bytes()]);
    hashing::sha256(&combined)
}

fn compute_integrity_hash(type_tag: MessageType, payload: &[u8], salt: &[u8; SALT_LEN]) -> [u8; HASH_LEN] {
    let domain = type_tag.domain_string();
    let input = hashing::encode_multi_field(&[
        &type_tag.wire_tag().to_be_bytes(),
        payload,
        salt,
        domain.as_bytes(),
    ]);
    hashing::sha256(&input)
}

/// Seal `payload` under `type_tag`, allocating the next per-type
/// sequence number from `allocator` and stamping the envelope with
/// `now` (unix seconds).
pub fn seal(type_tag: MessageType, payload: &[u8], allocator: &mut SequenceAllocator, now: u64) -> Envelope {
    let domain = type_tag.domain_string();
    let salt = generate_salt(&domain, now);
    let sequence_number = allocator.next(type_tag);
    let integrity_hash = compute_integrity_hash(type_tag, payload, &salt);

    Envelope {
        type_tag,
        payload: payload.to_vec(),
        salt,
        timestamp: now,
        sequence_number,
        integrity_hash,
    }
}

impl Envelope {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len() + TRAILER_LEN);
        out.extend_from_slice(&self.type_tag.wire_tag().to_be_bytes());
        out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
        out.extend_from_slice(&self.integrity_hash);
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN + TRAILER_LEN {
            return Err(EnvelopeError::Malformed);
        }

        let mut offset = 0;
        let wire_tag = u16::from_be_bytes(data[offset..offset + 2].try_into().unwrap());
        offset += 2;
        let payload_len =
            u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;

        if data.len() != HEADER_LEN + payload_len + TRAILER_LEN {
            return Err(EnvelopeError::Malformed);
        }

        let payload = data[offset..offset + payload_len].to_vec();
        offset += payload_len;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[offset..offset + SALT_LEN]);
        offset += SALT_LEN;

        let timestamp = u64::from_be_bytes(data[offset..offset + 8].try_into().unwrap());
        offset += 8;
        let sequence_number = u64::from_be_bytes(data[offset..offset + 8].try_into().unwrap());
        offset += 8;

        let mut integrity_hash = [0u8; HASH_LEN];
        integrity_hash.copy_from_slice(&data[offset..offset + HASH_LEN]);

        Ok(Self {
            type_tag: MessageType::from_wire_tag(wire_tag),
            payload,
            salt,
            timestamp,
            sequence_number,
            integrity_hash,
        })
    }
}

/// Open a wire envelope: parse, recompute and check the integrity hash,
/// reject stale timestamps and replayed sequence numbers.
pub fn open(
    data: &[u8],
    replay_window: &mut ReplayWindow,
    max_message_age_secs: u64,
    now: u64,
) -> Result<(MessageType, Vec<u8>)> {
    let envelope = Envelope::from_bytes(data)?;

    let expected = compute_integrity_hash(envelope.type_tag, &envelope.payload, &envelope.salt);
    if expected != envelope.integrity_hash {
        return Err(EnvelopeError::BadIntegrity);
    }

    let age = now.abs_diff(envelope.timestamp);
    if age > max_message_age_secs {
        return Err(EnvelopeError::Stale);
    }

    if !replay_window.observe(envelope.type_tag, envelope.sequence_number) {
        return Err(EnvelopeError::Replay);
    }

    Ok((envelope.type_tag, envelope.payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let mut allocator = SequenceAllocator::new();
        let mut window = ReplayWindow::new();
        let envelope = seal(MessageType::Datagram, b"hello", &mut allocator, 1_000_000);
        let bytes = envelope.to_bytes();

        let (ty, payload) = open(&bytes, &mut window, 300, 1_000_000).expect("open");
        assert_eq!(ty, MessageType::Datagram);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn test_open_rejects_tampered_payload() {
        let mut allocator = SequenceAllocator::new();
        let mut window = ReplayWindow::new();
        let envelope = seal(MessageType::Datagram, b"hello", &mut allocator, 1_000_000);
        let mut bytes = envelope.to_bytes();
        let payload_start = HEADER_LEN;
        bytes[payload_start] ^= 0xFF;

        assert!(matches!(
            open(&bytes, &mut window, 300, 1_000_000),
            Err(EnvelopeError::BadIntegrity)
        ));
    }

    #[test]
    fn test_open_rejects_stale_timestamp() {
        let mut allocator = SequenceAllocator::new();
        let mut window = ReplayWindow::new();
        let envelope = seal(MessageType::Datagram, b"hello", &mut allocator, 1_000_000);
        let bytes = envelope.to_bytes();

        assert!(matches!(
            open(&bytes, &mut window, 300, 1_000_000 + 10_000),
            Err(EnvelopeError::Stale)
        ));
    }

    #[test]
    fn test_open_rejects_replay() {
        let mut allocator = SequenceAllocator::new();
        let mut window = ReplayWindow::new();
        let envelope = seal(MessageType::Datagram, b"hello", &mut allocator, 1_000_000);
        let bytes = envelope.to_bytes();

        assert!(open(&bytes, &mut window, 300, 1_000_000).is_ok());
        assert!(matches!(
            open(&bytes, &mut window, 300, 1_000_000),
            Err(EnvelopeError::Replay)
        ));
    }

    #[test]
    fn test_open_rejects_malformed_short_input() {
        let mut window = ReplayWindow::new();
        assert!(matches!(
            open(&[0u8; 4], &mut window, 300, 0),
            Err(EnvelopeError::Malformed)
        ));
    }

    #[test]
    fn test_different_types_yield_different_salts_and_hashes() {
        let mut allocator = SequenceAllocator::new();
        let e1 = seal(MessageType::Datagram, b"same payload", &mut allocator, 42);
        let e2 = seal(MessageType::GroupPost, b"same payload", &mut allocator, 42);
        assert_ne!(e1.integrity_hash, e2.integrity_hash);
    }

    #[test]
    fn test_unknown_type_tag_roundtrips_via_other() {
        let mut allocator = SequenceAllocator::new();
        let mut window = ReplayWindow::new();
        let envelope = seal(MessageType::Other(4242), b"future type", &mut allocator, 1000);
        let bytes = envelope.to_bytes();
        let (ty, payload) = open(&bytes, &mut window, 300, 1000).expect("open");
        assert_eq!(ty, MessageType::Other(4242));
        assert_eq!(payload, b"future type");
    }
}
