// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Content hashing helpers for attachment summaries.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of in-memory bytes as lowercase hex.
///
/// # Examples
///
/// ```rust
/// let digest = ideas::utils::hash_bytes(b"abc");
/// assert_eq!(digest.len(), 64);
/// ```
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes).as_slice())
}

#[cfg(test)]
mod tests {
    use super::hash_bytes;

    #[test]
    fn hash_bytes_matches_known_digest() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn identical_content_hashes_identically() {
        assert_eq!(hash_bytes(b"same-bytes"), hash_bytes(b"same-bytes"));
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"b"));
    }
}
