use std::fmt::{Display, Formatter, Result as FmtResult};

/// A tag describing a quality of a post.
///
/// Equality is by text: two tags are the same if their namespace and subtag
/// are, regardless of which backend produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    /// Namespace text (e.g. `"artist"`); `None` is the default namespace.
    pub namespace: Option<String>,
    /// Subtag text.
    pub subtag: String,
}
impl Tag {
    /// Create a tag, treating an empty namespace as the default namespace.
    pub fn new(namespace: Option<impl Into<String>>, subtag: impl Into<String>) -> Self {
        let namespace = namespace.map(Into::into).filter(|ns: &String| !ns.is_empty());
        Self { namespace, subtag: subtag.into() }
    }

    /// Create a tag in the default namespace.
    pub fn plain(subtag: impl Into<String>) -> Self {
        Self { namespace: None, subtag: subtag.into() }
    }

    /// Parse the rendered form of a tag, splitting on the first colon.
    ///
    /// ```
    /// use b2_booru::Tag;
    ///
    /// assert_eq!(Tag::parse("character:samus aran"), Tag::new(Some("character"), "samus aran"));
    /// assert_eq!(Tag::parse("solo"), Tag::plain("solo"));
    /// assert_eq!(Tag::parse(":3"), Tag::plain("3"));
    /// ```
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((namespace, subtag)) => Self::new(Some(namespace), subtag),
            None => Self::plain(text),
        }
    }
}
impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}:{}", self.subtag),
            None => write!(f, "{}", self.subtag),
        }
    }
}
