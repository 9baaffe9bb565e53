//! Digest functions used to redact contact values.
//!
//! A [`ContactDigest`] is a pure function of its input bytes. Implementations
//! must not keep hashing state between calls: a single pipeline serves many
//! concurrent requests.

use sha1::{Digest, Sha1};

/// `digest(bytes) -> bytes`, deterministic and safe to call concurrently.
pub trait ContactDigest: Send + Sync {
    fn digest(&self, input: &[u8]) -> Vec<u8>;

    /// The digest as lowercase hexadecimal.
    fn digest_hex(&self, input: &[u8]) -> String {
        hex::encode(self.digest(input))
    }
}

/// SHA-1, the algorithm behind `foaf:mbox_sha1sum`.
///
/// Each call builds its own hasher, so one instance can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Digest;

impl ContactDigest for Sha1Digest {
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        let mut hasher = Sha1::new();
        hasher.update(input);
        hasher.finalize().to_vec()
    }
}

/// Any stateless closure works as a digest.
impl<F> ContactDigest for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        self(input)
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        assert_eq!(
            Sha1Digest.digest_hex(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let a = Sha1Digest.digest_hex(b"mailto:a@example.org");
        let b = Sha1Digest.digest_hex(b"mailto:a@example.org");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn closures_are_digests() {
        let reverse = |input: &[u8]| input.iter().rev().copied().collect::<Vec<u8>>();
        assert_eq!(reverse.digest_hex(&[0x01, 0xab]), "ab01");
    }
}
