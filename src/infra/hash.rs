use std::hash::Hasher;

use twox_hash::XxHash64;

/// Content fingerprint for one line of text.
///
/// Seeded with 0 so fingerprints are stable across parses and revisions;
/// comment anchoring depends on that stability.
pub fn fingerprint(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}
