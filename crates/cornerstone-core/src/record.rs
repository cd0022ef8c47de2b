//! The `Record` trait shared by every stored console record.
//!
//! Repositories are generic over `Record`: the trait supplies the collection
//! name, id access, server-managed timestamps, and the record's own
//! validation rules.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::util::ids::ensure_id;

/// A record persisted in a named collection.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Collection name, also used as the JSON file stem.
    const KIND: &'static str;

    /// The record id.
    fn id(&self) -> &str;

    /// Replace the record id.
    fn set_id(&mut self, id: String);

    /// When the record was first stored.
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Set the server-managed timestamps.
    fn stamp(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    /// Fill in derived fields (nested ids and the like) before validation.
    fn normalize(&mut self) {}

    /// Check required fields and internal consistency.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Prepare a record for insertion: trim or generate its id, stamp both
/// timestamps with `now`, then normalize and validate. A blank id fails.
pub fn prepare_insert<T: Record>(record: &mut T, now: DateTime<Utc>) -> Result<()> {
    let id = ensure_id(record.id())?;
    record.set_id(id);
    record.stamp(now, now);
    record.normalize();
    record.validate()
}

/// Prepare a full replacement of `existing`: the id comes from the path,
/// `created_at` is carried over, `updated_at` becomes `now`.
pub fn prepare_replace<T: Record>(
    record: &mut T,
    existing: &T,
    now: DateTime<Utc>,
) -> Result<()> {
    record.set_id(existing.id().to_string());
    record.stamp(existing.created_at().unwrap_or(now), now);
    record.normalize();
    record.validate()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    }

    impl Record for Note {
        const KIND: &'static str = "notes";

        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn created_at(&self) -> Option<DateTime<Utc>> {
            self.created_at
        }

        fn stamp(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
            self.created_at = Some(created_at);
            self.updated_at = Some(updated_at);
        }

        fn validate(&self) -> Result<()> {
            if self.text.trim().is_empty() {
                return Err(Error::validation_field("text", "must not be empty"));
            }
            Ok(())
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_prepare_insert_generates_id_and_stamps() {
        let now = Utc::now();
        let mut n = note("", "hello");
        prepare_insert(&mut n, now).unwrap();
        assert!(!n.id.is_empty());
        assert_eq!(n.created_at, Some(now));
        assert_eq!(n.updated_at, Some(now));
    }

    #[test]
    fn test_prepare_insert_trims_id() {
        let mut n = note("  n1 ", "hello");
        prepare_insert(&mut n, Utc::now()).unwrap();
        assert_eq!(n.id, "n1");
    }

    #[test]
    fn test_prepare_insert_rejects_blank_id() {
        let mut n = note("   ", "hello");
        let err = prepare_insert(&mut n, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(err.field(), Some("id"));
        assert!(n.created_at.is_none());
    }

    #[test]
    fn test_prepare_insert_validates() {
        let mut n = note("n1", "  ");
        let err = prepare_insert(&mut n, Utc::now()).unwrap_err();
        assert_eq!(err.field(), Some("text"));
    }

    #[test]
    fn test_prepare_replace_keeps_created_at() {
        let created = Utc::now() - chrono::Duration::hours(1);
        let mut existing = note("n1", "old");
        existing.stamp(created, created);

        let now = Utc::now();
        let mut replacement = note("ignored", "new");
        prepare_replace(&mut replacement, &existing, now).unwrap();
        assert_eq!(replacement.id, "n1");
        assert_eq!(replacement.created_at, Some(created));
        assert_eq!(replacement.updated_at, Some(now));
    }
}
