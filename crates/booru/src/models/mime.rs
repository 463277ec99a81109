use std::fmt::{Display, Formatter, Result as FmtResult};

/// MIME type of a post's full-resolution media.
///
/// Only the formats that can be displayed are represented; backends drop
/// posts of any other type before they reach a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mime {
    Png,
    Jpeg,
    Webp,
    Gif,
    Webm,
    Mp4,
    /// Shockwave Flash
    Swf,
}
impl Mime {
    /// Guess the MIME type from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "webm" => Some(Self::Webm),
            "mp4" => Some(Self::Mp4),
            "swf" => Some(Self::Swf),
            _ => None,
        }
    }

    /// Parse a MIME type string such as `"image/png"`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        [Self::Png, Self::Jpeg, Self::Webp, Self::Gif, Self::Webm, Self::Mp4, Self::Swf]
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(mime.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
            Self::Swf => "application/x-shockwave-flash",
        }
    }
}
impl Display for Mime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
