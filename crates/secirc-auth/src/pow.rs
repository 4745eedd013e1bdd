//! Plain SHA-256 leading-zero-bit proof-of-work, as used for
//! registration and publishing challenges. Deliberately not
//! Argon2id-backed — see `secirc_crypto::argon2id`'s module doc.

use sha2::{Digest, Sha256};

/// Number of leading zero bits in `hash`.
fn leading_zero_bits(hash: &[u8]) -> u32 {
    let mut zeros = 0u32;
    for byte in hash {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

/// Checks whether `nonce` solves the proof-of-work puzzle
/// `SHA256(challenge || nonce)` at the given `difficulty` (required
/// leading zero bits).
pub fn verify(challenge: &[u8], nonce: &[u8], difficulty: u32) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(challenge);
    hasher.update(nonce);
    let digest = hasher.finalize();
    leading_zero_bits(&digest) >= difficulty
}

/// Brute-forces a nonce solving the puzzle. Intended for test fixtures
/// and the client side of the protocol, not the relay.
pub fn solve(challenge: &[u8], difficulty: u32) -> Vec<u8> {
    let mut counter: u64 = 0;
    loop {
        let nonce = counter.to_be_bytes().to_vec();
        if verify(challenge, &nonce, difficulty) {
            return nonce;
        }
        counter += 1;
    }
}
