//! Key case normalization for outgoing request keys and policy-name lookups.
//!
//! The same rule must apply everywhere a caller-supplied key is compared or
//! transmitted: a policy registered as `"Upload"` and requested as `"upload"`
//! resolves to the same rule when case-insensitivity is enabled, and fails to
//! resolve when it is not.

use std::borrow::Cow;

/// Canonicalizes a single key according to the case-sensitivity switch.
///
/// Identity when `case_sensitive` is true; ASCII-lowercased otherwise.
pub fn normalize_key(key: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive || !key.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(key.to_ascii_lowercase())
    }
}

/// Compares two keys under the case-sensitivity switch.
pub fn keys_match(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}
