mod mime;
mod post;
mod tag;

pub use self::mime::Mime;
pub use self::post::{Dimensions, GlobalId, Post, PostDetails, Resolved, placeholder_url};
pub use self::tag::Tag;
