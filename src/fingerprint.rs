//! MinHash content fingerprinting
//!
//! Computes fixed-width MinHash signatures over a document's whitespace
//! token set. Two signatures support Jaccard similarity estimation without
//! retaining the token sets themselves. Signatures are deterministic: the
//! permutation parameters are derived from a compile-time seed, so the same
//! text always produces the same signature across runs and machines, and
//! signatures persisted in earlier runs stay comparable.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Number of permutation slots in every signature. All fingerprints ever
/// compared must use the same width.
pub const SIGNATURE_LEN: usize = 128;

/// Seed for both token hashing and permutation parameter generation.
/// Changing this invalidates every persisted fingerprint.
const FINGERPRINT_SEED: u64 = 0x1f03_7a2c_9b4d_e581;

/// Mersenne prime modulus for the universal hash family, same choice as
/// the usual MinHash formulation.
const MERSENNE_PRIME: u128 = (1 << 61) - 1;

/// Largest slot value; empty signatures hold this in every slot.
const MAX_HASH: u64 = MERSENNE_PRIME as u64;

/// One `(a, b)` pair per slot for `h(x) = (a*x + b) mod p`.
struct Permutations {
    a: [u64; SIGNATURE_LEN],
    b: [u64; SIGNATURE_LEN],
}

static PERMUTATIONS: LazyLock<Permutations> = LazyLock::new(|| {
    let mut rng = ChaCha8Rng::seed_from_u64(FINGERPRINT_SEED);
    let mut a = [0u64; SIGNATURE_LEN];
    let mut b = [0u64; SIGNATURE_LEN];
    for i in 0..SIGNATURE_LEN {
        // `a` must be nonzero for the hash family to be universal
        a[i] = rng.gen_range(1..MAX_HASH);
        b[i] = rng.gen_range(0..MAX_HASH);
    }
    Permutations { a, b }
});

/// A MinHash signature over a document's token set.
///
/// Append-only once created; the dedup index never mutates stored
/// signatures. Serialized as an ordered list of unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint(Vec<u64>);

impl Fingerprint {
    /// Compute the signature for `text`.
    ///
    /// Tokenization is whitespace splitting; token order does not affect
    /// the result. Empty text yields the well-defined empty signature,
    /// which is still comparable against any other signature.
    pub fn compute(text: &str) -> Self {
        let perms = &*PERMUTATIONS;
        let mut slots = vec![MAX_HASH; SIGNATURE_LEN];

        for token in text.split_whitespace() {
            let token_hash = xxh3_64_with_seed(token.as_bytes(), FINGERPRINT_SEED);
            for i in 0..SIGNATURE_LEN {
                let permuted = ((perms.a[i] as u128 * token_hash as u128
                    + perms.b[i] as u128)
                    % MERSENNE_PRIME) as u64;
                if permuted < slots[i] {
                    slots[i] = permuted;
                }
            }
        }

        Fingerprint(slots)
    }

    /// Reconstruct a signature from its persisted slot values.
    pub fn from_slots(slots: Vec<u64>) -> Self {
        Fingerprint(slots)
    }

    /// The raw slot values, in permutation order.
    pub fn slots(&self) -> &[u64] {
        &self.0
    }

    /// Estimate Jaccard similarity with another signature, in [0, 1].
    ///
    /// 1.0 means the sketch judges the token sets identical, 0.0 disjoint.
    /// Both signatures must have been computed at the same width; mixing
    /// widths is a programming error.
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        assert_eq!(
            self.0.len(),
            other.0.len(),
            "cannot compare fingerprints of different signature widths"
        );
        if self.0.is_empty() {
            return 1.0;
        }
        let matching = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a == b)
            .count();
        matching as f64 / self.0.len() as f64
    }

    /// Whether this is the empty signature (no tokens contributed).
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&slot| slot == MAX_HASH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let text = "APT41 dropped a loader at 203.0.113.7 during the campaign";
        let a = Fingerprint::compute(text);
        let b = Fingerprint::compute(text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let fp = Fingerprint::compute("the quick brown fox jumps over the lazy dog");
        assert_eq!(fp.similarity(&fp), 1.0);
    }

    #[test]
    fn test_token_order_insensitive() {
        let a = Fingerprint::compute("alpha beta gamma delta");
        let b = Fingerprint::compute("delta gamma beta alpha");
        assert_eq!(a, b);
    }

    #[test]
    fn test_disjoint_texts_dissimilar() {
        let a = Fingerprint::compute("completely unrelated words about malware campaigns");
        let b = Fingerprint::compute("quarterly financial results exceeded analyst expectations");
        assert!(a.similarity(&b) < 0.2);
    }

    #[test]
    fn test_near_identical_texts_similar() {
        let base: String = (0..200).map(|i| format!("token{} ", i)).collect();
        let tweaked = format!("{} extra", base);
        let a = Fingerprint::compute(&base);
        let b = Fingerprint::compute(&tweaked);
        assert!(a.similarity(&b) > 0.8);
    }

    #[test]
    fn test_empty_text_well_defined() {
        let empty = Fingerprint::compute("");
        assert!(empty.is_empty());
        assert_eq!(empty.similarity(&empty), 1.0);

        // Comparable against nonempty content, and maximally dissimilar
        let full = Fingerprint::compute("some actual report text with tokens");
        assert_eq!(empty.similarity(&full), 0.0);
    }

    #[test]
    fn test_roundtrip_through_slots() {
        let fp = Fingerprint::compute("persisted and reloaded");
        let restored = Fingerprint::from_slots(fp.slots().to_vec());
        assert_eq!(fp.similarity(&restored), 1.0);
    }

    #[test]
    fn test_signature_width() {
        let fp = Fingerprint::compute("width check");
        assert_eq!(fp.slots().len(), SIGNATURE_LEN);
    }
}
