//! 64-bit SimHash over weighted tokens, plus the two similarity measures.

use ahash::AHashSet;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a, stable across runs and platforms.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Compute simhash fingerprint over a token sequence.
///
/// Repeated tokens count once per occurrence; order does not matter.
/// A bit is set only when its accumulator is strictly positive.
pub fn compute_simhash<S: AsRef<str>>(tokens: &[S]) -> u64 {
    let mut v = [0i64; 64];

    for token in tokens {
        let h = fnv1a64(token.as_ref().as_bytes());
        for (i, acc) in v.iter_mut().enumerate() {
            if (h >> i) & 1 == 1 {
                *acc += 1;
            } else {
                *acc -= 1;
            }
        }
    }

    let mut fingerprint: u64 = 0;
    for (i, acc) in v.iter().enumerate() {
        if *acc > 0 {
            fingerprint |= 1 << i;
        }
    }

    fingerprint
}

/// Count differing bits between two simhashes (Hamming distance)
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Intersection over union of two distinct-token sets; two empty sets are identical.
pub fn jaccard_similarity(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

pub fn token_set<S: AsRef<str>>(tokens: &[S]) -> AHashSet<String> {
    tokens.iter().map(|t| t.as_ref().to_string()).collect()
}
