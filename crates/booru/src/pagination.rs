//! Pagination strategies and resumption offsets.

use crate::models::Post;
use derive_more::Display;

/// A way a booru can be asked for "more" results.
///
/// Ordered by preference: when a booru supports several, the greatest one is
/// used.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaginationType {
    /// No pagination; the first fetch is all there is.
    #[display("none")]
    None,
    /// Numbered pages.
    #[display("pages")]
    Pages,
    /// Everything below the lowest post ID of the previous chunk.
    #[display("relative to lowest ID")]
    RelativeToLowestId,
}

/// Where a paginated query should resume.
///
/// Page numbers are zero-based; backends translate them into whatever their
/// API expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Offset {
    #[default]
    None,
    Page(u32),
    /// The chunk fetched immediately before the one being requested.
    PreviousChunk(Vec<Post>),
}
impl Offset {
    /// Offset of the very first fetch for a pagination type.
    pub fn initial(pagination: PaginationType) -> Self {
        match pagination {
            PaginationType::None => Self::None,
            PaginationType::Pages => Self::Page(0),
            PaginationType::RelativeToLowestId => Self::PreviousChunk(Vec::new()),
        }
    }

    /// Offset of the fetch following this one.
    ///
    /// Cursor offsets are derived from `last_chunk` alone (the most recently
    /// fetched chunk), never from everything fetched so far.
    pub fn advance(&self, last_chunk: &[Post]) -> Self {
        match self {
            Self::None => Self::None,
            Self::Page(page) => Self::Page(page.saturating_add(1)),
            Self::PreviousChunk(_) => Self::PreviousChunk(last_chunk.to_vec()),
        }
    }

    /// Lowest post ID of a [`PreviousChunk`](Self::PreviousChunk) offset.
    pub fn lowest_id(&self) -> Option<i64> {
        match self {
            Self::PreviousChunk(posts) => posts.iter().map(|post| post.id).min(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mime, Resolved};
    use rstest::rstest;
    use std::collections::BTreeSet;
    use time::OffsetDateTime;
    use url::Url;
    use uuid::Uuid;

    fn posts(source: Uuid, ids: &[i64]) -> Vec<Post> {
        let url = Url::parse("https://example.com/x.png").unwrap();
        ids.iter()
            .map(|id| {
                let details = Resolved { image_url: url.clone(), thumbnail_url: url.clone(), tags: vec![] };
                Post::new(source, *id, OffsetDateTime::UNIX_EPOCH, 0, Mime::Png, details)
            })
            .collect()
    }

    #[test]
    fn test_ordering() {
        assert!(PaginationType::None < PaginationType::Pages);
        assert!(PaginationType::Pages < PaginationType::RelativeToLowestId);
        let supported = BTreeSet::from([PaginationType::Pages, PaginationType::RelativeToLowestId]);
        assert_eq!(supported.last(), Some(&PaginationType::RelativeToLowestId));
    }

    #[rstest]
    #[case(PaginationType::None, Offset::None)]
    #[case(PaginationType::Pages, Offset::Page(0))]
    #[case(PaginationType::RelativeToLowestId, Offset::PreviousChunk(vec![]))]
    fn test_initial(#[case] pagination: PaginationType, #[case] expected: Offset) {
        assert_eq!(Offset::initial(pagination), expected);
    }

    #[test]
    fn test_advance_pages() {
        assert_eq!(Offset::Page(0).advance(&[]), Offset::Page(1));
        assert_eq!(Offset::Page(u32::MAX).advance(&[]), Offset::Page(u32::MAX));
        assert_eq!(Offset::None.advance(&[]), Offset::None);
    }

    #[test]
    fn test_advance_uses_latest_chunk_only() {
        let source = Uuid::new_v4();
        let first = posts(source, &[5, 9]);
        let latest = posts(source, &[2, 7]);
        let offset = Offset::PreviousChunk(first).advance(&latest);
        assert_eq!(offset, Offset::PreviousChunk(latest));
        assert_eq!(offset.lowest_id(), Some(2));
    }

    #[test]
    fn test_lowest_id_of_empty_chunk() {
        assert_eq!(Offset::PreviousChunk(vec![]).lowest_id(), None);
        assert_eq!(Offset::Page(3).lowest_id(), None);
    }
}
