//! Boorus reached over HTTP.
//!
//! - [`PagedBooru`]: `/post/index.json` APIs paginated by page number.
//! - [`CursorBooru`]: `/posts.json` APIs that can also page relative to the
//!   lowest post ID seen so far.
//! - [`ClientApiBooru`]: the client API of a running Hydrus client.

mod client_api;
mod cursor;
mod paged;
mod request;

pub use crate::client_api::ClientApiBooru;
pub use crate::cursor::{Credentials, CursorBooru};
pub use crate::paged::PagedBooru;
