//! Id generation and normalization.
//!
//! Record ids are either client-supplied strings or generated UUID v4
//! values. Property ids and VDR file names are derived from display names
//! through [`normalize_id`].

use uuid::Uuid;

use crate::{Error, Result};

/// Generate a fresh record id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Normalize a display name into a lowercase kebab-case id.
///
/// Underscores and whitespace become hyphen separators, characters that are
/// neither alphanumeric nor `-` are dropped, and runs of separators collapse.
///
/// # Examples
///
/// ```
/// use cornerstone_core::util::ids::normalize_id;
///
/// assert_eq!(normalize_id("Given Name"), "given-name");
/// assert_eq!(normalize_id("birth_date"), "birth-date");
/// assert_eq!(normalize_id("  Email (work)  "), "email-work");
/// ```
pub fn normalize_id(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    cleaned.split_whitespace().collect::<Vec<&str>>().join("-")
}

/// Trim a client-supplied id, generating a new one when it was omitted.
///
/// An omitted id arrives as the empty string. An id made only of
/// whitespace is rejected.
pub fn ensure_id(id: &str) -> Result<String> {
    if id.is_empty() {
        return Ok(new_id());
    }
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(Error::validation_field("id", "must not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Whether `s` is a plain identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_id_is_uuid() {
        let id = new_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(new_id(), id);
    }

    #[test]
    fn test_normalize_id_simple() {
        assert_eq!(normalize_id("email"), "email");
        assert_eq!(normalize_id("Given Name"), "given-name");
        assert_eq!(normalize_id("family_name"), "family-name");
    }

    #[test]
    fn test_normalize_id_drops_punctuation() {
        assert_eq!(normalize_id("Address (Line 1)"), "address-line-1");
        assert_eq!(normalize_id("a.b/c"), "abc");
    }

    #[test]
    fn test_normalize_id_collapses_separators() {
        assert_eq!(normalize_id("  Mixed __ Case  "), "mixed-case");
        assert_eq!(normalize_id("already-normal"), "already-normal");
        assert_eq!(normalize_id("x--y"), "x-y");
    }

    #[test]
    fn test_normalize_id_empty() {
        assert_eq!(normalize_id(""), "");
        assert_eq!(normalize_id("  ()  "), "");
    }

    #[test]
    fn test_ensure_id() {
        assert_eq!(ensure_id("  cred-1 ").unwrap(), "cred-1");
        let generated = ensure_id("").unwrap();
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn test_ensure_id_rejects_blank() {
        let err = ensure_id("   ").unwrap_err();
        assert_eq!(err.category(), "validation");
        assert_eq!(err.field(), Some("id"));
        assert!(ensure_id("\t\n").is_err());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("given_name"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("with-dash"));
        assert!(!is_identifier(""));
    }

    proptest! {
        #[test]
        fn test_normalize_id_is_idempotent(s in "\\PC*") {
            let once = normalize_id(&s);
            prop_assert_eq!(normalize_id(&once), once.clone());
        }

        #[test]
        fn test_normalize_id_has_no_edge_hyphens(s in "[a-zA-Z _-]{0,40}") {
            let id = normalize_id(&s);
            prop_assert!(!id.starts_with('-'));
            prop_assert!(!id.ends_with('-'));
            prop_assert!(!id.contains("--"));
        }
    }
}
