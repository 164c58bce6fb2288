//! Stable request fingerprint used as the route cache key (spec §4.1):
//! lowercase, strip stop words, take the top 10 remaining terms sorted, and
//! hash with `sha2` (the teacher's standardized content-hashing crate),
//! truncated to 12 hex characters.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "to", "of", "in", "on", "for",
        "with", "and", "or", "but", "please", "can", "you", "i", "it", "this", "that", "me", "my",
        "we", "our", "from", "at", "by", "as", "do", "does", "did", "will", "would", "should",
        "could", "so", "if", "then",
    ]
    .into_iter()
    .collect()
});

/// A stable 12-character hex fingerprint of the request, used as the route
/// cache key. Deterministic for the same semantic request modulo word order.
#[must_use]
pub fn fingerprint(request_text: &str) -> String {
    let mut terms: Vec<&str> = request_text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .collect();
    terms.sort_unstable();
    terms.dedup();
    terms.truncate(10);

    let joined = terms.join(" ");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    let digest = hasher.finalize();

    digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_twelve_hex_chars() {
        let fp = fingerprint("fix the typo in the README please");
        assert_eq!(fp.len(), 12);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_stable_for_equivalent_requests() {
        let a = fingerprint("Please fix the typo in README");
        let b = fingerprint("fix typo in the readme, please");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_for_different_content() {
        let a = fingerprint("fix typo in README");
        let b = fingerprint("generate a sales report from the database");
        assert_ne!(a, b);
    }
}
