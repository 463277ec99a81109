//! Tag text and ID resolution.

use crate::error::{ErrorKind, Result};
use b2_booru::Tag;
use exn::ResultExt;
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

/// Fold a search tag into the form the database stores.
///
/// Multi-word tags are stored with spaces, so every underscore becomes a
/// space. A tag that really contains an underscore can't be searched for.
pub(crate) fn normalize(tag: &str) -> String {
    tag.replace('_', " ")
}

/// Every namespace in the database, keyed by ID.
///
/// Loaded once when the backend opens; the table is small and changes only
/// when the user creates a new namespace.
#[derive(Debug, Default)]
pub(crate) struct Namespaces(HashMap<i64, String>);

impl Namespaces {
    pub async fn load(conn: &mut SqliteConnection) -> Result<Self> {
        let rows: Vec<(i64, String)> = sqlx::query_as(include_str!("../queries/namespaces.sql"))
            .fetch_all(conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self(rows.into_iter().collect()))
    }

    /// Namespace text for an ID. ID 0 and empty text both mean "no namespace".
    pub fn get(&self, id: i64) -> Option<&str> {
        if id == 0 {
            return None;
        }
        match self.0.get(&id) {
            Some(text) if text.is_empty() => None,
            Some(text) => Some(text),
            None => {
                warn!(namespace_id = id, "unknown namespace, treating as none");
                None
            },
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Build the tag for a mapping row.
    pub fn tag(&self, namespace_id: i64, subtag: String) -> Tag {
        Tag::new(self.get(namespace_id), subtag)
    }
}
impl FromIterator<(i64, String)> for Namespaces {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve normalized tag texts to IDs through the tag lookup cache.
///
/// Returns `None` if any tag is unknown: a search for it can match nothing.
pub(crate) async fn lookup_ids(conn: &mut SqliteConnection, tags: &BTreeSet<String>) -> Result<Option<Vec<i64>>> {
    let wanted = serde_json::to_string(tags).or_raise(|| ErrorKind::InvalidData("tags"))?;
    let rows: Vec<(String, i64)> = sqlx::query_as(include_str!("../queries/cached_tag_ids.sql"))
        .bind(wanted)
        .fetch_all(conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    let found: BTreeMap<String, i64> = rows.into_iter().collect();
    if tags.iter().any(|tag| !found.contains_key(tag)) {
        return Ok(None);
    }
    Ok(Some(found.into_values().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("big_cat", "big cat")]
    #[case("solo", "solo")]
    #[case("character:hatsune_miku", "character:hatsune miku")]
    #[case("__", "  ")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_namespaces() {
        let namespaces: Namespaces = [(0, String::new()), (1, "character".to_string()), (2, String::new())]
            .into_iter()
            .collect();
        assert_eq!(namespaces.get(0), None);
        assert_eq!(namespaces.get(1), Some("character"));
        assert_eq!(namespaces.get(2), None);
        assert_eq!(namespaces.get(99), None);
        assert_eq!(namespaces.tag(1, "miku".to_string()), Tag::new(Some("character"), "miku"));
        assert_eq!(namespaces.tag(0, "solo".to_string()), Tag::plain("solo"));
    }
}
