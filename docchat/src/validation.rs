//! Collection name rules enforced by the backend's vector store.
//!
//! A collection name is 3 to 512 characters long, starts and ends with an
//! ASCII letter or digit, and otherwise only contains letters, digits, `.`,
//! `_` and `-`.

use std::sync::LazyLock;

use regex::Regex;

/// Shortest accepted collection name.
pub const MIN_COLLECTION_NAME_LEN: usize = 3;
/// Longest accepted collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 512;

/// Appended by [`sanitize_collection_name`] when the cleaned name is too short.
const PAD_SUFFIX: &str = "_01";

static VALID_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]{1,510}[a-zA-Z0-9]$").expect("valid name pattern")
});

static DISALLOWED_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid charset pattern"));

static LEADING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^a-zA-Z0-9]+").expect("valid leading pattern"));

static TRAILING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+$").expect("valid trailing pattern"));

/// Check whether `name` is acceptable as a collection name.
pub fn is_valid_collection_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

/// Explain why `name` is not a valid collection name.
///
/// Returns `None` for valid names.
pub fn collection_name_problem(name: &str) -> Option<&'static str> {
    let len = name.chars().count();
    if len < MIN_COLLECTION_NAME_LEN {
        return Some("must be at least 3 characters long");
    }
    if len > MAX_COLLECTION_NAME_LEN {
        return Some("must be at most 512 characters long");
    }
    if DISALLOWED_CHAR.is_match(name) {
        return Some("may only contain letters, numbers, '.', '_' or '-'");
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Some("must start with a letter or number");
    }
    if !name.ends_with(|c: char| c.is_ascii_alphanumeric()) {
        return Some("must end with a letter or number");
    }
    None
}

/// Best-effort repair of a proposed collection name.
///
/// Disallowed characters become `_`, leading and trailing non-alphanumeric
/// runs are stripped, short results are padded and long ones truncated. The
/// output always has a length within bounds but is not guaranteed to pass
/// [`is_valid_collection_name`]: `"!!"` becomes `"_01"`.
pub fn sanitize_collection_name(name: &str) -> String {
    let replaced = DISALLOWED_CHAR.replace_all(name, "_");
    let trimmed = LEADING_JUNK.replace(&replaced, "");
    let mut sanitized = TRAILING_JUNK.replace(&trimmed, "").into_owned();

    if sanitized.len() < MIN_COLLECTION_NAME_LEN {
        sanitized.push_str(PAD_SUFFIX);
    }
    // Only ASCII survives the replacement above, so byte truncation is safe.
    sanitized.truncate(MAX_COLLECTION_NAME_LEN);
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_collection_name("abc"));
        assert!(is_valid_collection_name("a--b"));
        assert!(is_valid_collection_name("italy.trip_2024-v2"));
        assert!(is_valid_collection_name("007"));
        assert!(is_valid_collection_name(&"x".repeat(512)));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("a"));
        assert!(!is_valid_collection_name("ab"));
        assert!(!is_valid_collection_name("-ab"));
        assert!(!is_valid_collection_name("ab-"));
        assert!(!is_valid_collection_name("a b"));
        assert!(!is_valid_collection_name("caffè"));
        assert!(!is_valid_collection_name(&"x".repeat(513)));
    }

    #[test]
    fn test_length_bounds_with_separators() {
        for len in [3, 4, 100, 511, 512] {
            let name = format!("a{}z", "._-".repeat(len).chars().take(len - 2).collect::<String>());
            assert_eq!(name.len(), len);
            assert!(is_valid_collection_name(&name), "len {len} should be valid");
        }
        let too_long = format!("a{}z", "-".repeat(511));
        assert!(!is_valid_collection_name(&too_long));
    }

    #[test]
    fn test_problem_descriptions() {
        assert_eq!(collection_name_problem("docs"), None);
        assert_eq!(
            collection_name_problem("ab"),
            Some("must be at least 3 characters long")
        );
        assert_eq!(
            collection_name_problem(&"a".repeat(600)),
            Some("must be at most 512 characters long")
        );
        assert_eq!(
            collection_name_problem("a b"),
            Some("may only contain letters, numbers, '.', '_' or '-'")
        );
        assert_eq!(
            collection_name_problem("_abc"),
            Some("must start with a letter or number")
        );
        assert_eq!(
            collection_name_problem("abc."),
            Some("must end with a letter or number")
        );
    }

    #[test]
    fn test_sanitize_replaces_and_strips() {
        assert_eq!(sanitize_collection_name("my docs!"), "my_docs");
        assert_eq!(sanitize_collection_name("--trip 2024--"), "trip_2024");
        assert_eq!(sanitize_collection_name("already-ok"), "already-ok");
    }

    #[test]
    fn test_sanitize_pads_short_names() {
        let padded = sanitize_collection_name("!!");
        assert_eq!(padded, "_01");
        assert!(padded.len() >= MIN_COLLECTION_NAME_LEN);
        // Padding does not guarantee validity.
        assert!(!is_valid_collection_name(&padded));

        let padded = sanitize_collection_name("a");
        assert_eq!(padded, "a_01");
        assert!(is_valid_collection_name(&padded));
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long = "b".repeat(700);
        let sanitized = sanitize_collection_name(&long);
        assert_eq!(sanitized.len(), MAX_COLLECTION_NAME_LEN);
        assert!(is_valid_collection_name(&sanitized));

        // Truncation can leave a trailing separator.
        let mut tricky = "c".repeat(511);
        tricky.push_str("-dd");
        let sanitized = sanitize_collection_name(&tricky);
        assert_eq!(sanitized.len(), MAX_COLLECTION_NAME_LEN);
        assert!(sanitized.ends_with('-'));
        assert!(!is_valid_collection_name(&sanitized));
    }

    #[test]
    fn test_sanitize_handles_unicode() {
        let sanitized = sanitize_collection_name("città d'arte");
        assert_eq!(sanitized, "citt__d_arte");
        assert!(sanitized.is_ascii());
    }
}
