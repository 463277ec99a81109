//! A booru with nothing in it.

use crate::booru::{Booru, Identity};
use crate::error::Result;
use crate::models::Post;
use crate::pagination::{Offset, PaginationType};
use async_trait::async_trait;

/// Booru that returns no posts for every request.
///
/// Stands in when no source is selected, so consumers never special-case
/// "no backend".
#[derive(Debug, Clone)]
pub struct NullBooru {
    identity: Identity,
}
impl NullBooru {
    pub fn new(name: impl Into<String>) -> Self {
        Self { identity: Identity::new(name, "None", [PaginationType::None]) }
    }
}
impl Default for NullBooru {
    fn default() -> Self {
        Self::new("none")
    }
}

#[async_trait]
impl Booru for NullBooru {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn initial_posts(&self) -> Result<Vec<Post>> {
        Ok(Vec::new())
    }

    async fn search(&self, _tags: &[String], _offset: &Offset) -> Result<Vec<Post>> {
        Ok(Vec::new())
    }
}
