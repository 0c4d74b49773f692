//! Description matching
//!
//! The ledger has no foreign keys between a recurring obligation and its
//! occurrences, between a declared fixed expense and the payment that
//! fulfils it, or between a card issuer name and an invoice cluster. The
//! engine joins them on normalized text, and all of those joins go through
//! this module so the heuristic can be swapped for an explicit link field
//! without touching callers.
//!
//! The heuristic is brittle by nature: renaming "Netflix" to "Netflix 4K"
//! breaks exact matches. That is accepted.

/// Canonical form used as a join key: trimmed, lower-cased, inner
/// whitespace collapsed to single spaces.
pub fn normalize(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strict join: the two descriptions name the same obligation
pub fn same_description(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

/// Loose join: either normalized description contains the other.
///
/// Used for fixed expenses ("Rent" vs "Rent March") and issuer names
/// ("Nubank" vs "nubank mastercard").
pub fn loosely_matches(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Issuer join used to cluster invoices and link recurring card charges
pub fn same_issuer(a: &str, b: &str) -> bool {
    loosely_matches(a, b)
}

/// Amount join: `actual` is within `tolerance` (a fraction) of `expected`
pub fn amount_within(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= expected.abs() * tolerance + f64::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  NETFLIX   Premium "), "netflix premium");
        assert_eq!(normalize("Uber"), "uber");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_same_description() {
        assert!(same_description("Netflix", " netflix "));
        assert!(!same_description("Netflix", "Netflix 4K"));
        assert!(!same_description("", ""));
    }

    #[test]
    fn test_loosely_matches_is_bidirectional() {
        assert!(loosely_matches("Rent", "rent march"));
        assert!(loosely_matches("rent march", "Rent"));
        assert!(!loosely_matches("Rent", "Gym"));
        assert!(!loosely_matches("", "Gym"));
    }

    #[test]
    fn test_same_issuer() {
        assert!(same_issuer("Nubank", "NUBANK MASTERCARD"));
        assert!(!same_issuer("Nubank", "Itau"));
    }

    #[test]
    fn test_amount_within() {
        assert!(amount_within(109.0, 100.0, 0.10));
        assert!(amount_within(90.0, 100.0, 0.10));
        assert!(!amount_within(111.0, 100.0, 0.10));
        assert!(!amount_within(89.0, 100.0, 0.10));
    }
}
