//! Idempotency-error handling (spec §4.7): a handful of well-known provider
//! error codes mean "the desired end state already holds" rather than
//! "the call failed" — these are rewritten to success before reaching the
//! caller.

const IDEMPOTENT_SUCCESS_CODES: &[&str] = &[
    "already_reacted",
    "no_reaction",
    "already_pinned",
    "no_pin",
    "already_in_channel",
    "already_archived",
];

/// `true` if `error_code` names a condition the provider treats as already
/// satisfied.
#[must_use]
pub fn is_idempotent_success(error_code: &str) -> bool {
    IDEMPOTENT_SUCCESS_CODES.contains(&error_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_idempotency_codes_are_treated_as_success() {
        assert!(is_idempotent_success("already_reacted"));
        assert!(is_idempotent_success("already_archived"));
    }

    #[test]
    fn unknown_error_codes_are_not() {
        assert!(!is_idempotent_success("rate_limited"));
        assert!(!is_idempotent_success(""));
    }
}
