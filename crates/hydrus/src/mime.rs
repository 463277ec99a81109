use b2_booru::Mime;

/// File type codes as stored in `files_info.mime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum HydrusMime {
    Jpeg = 1,
    Png = 2,
    Gif = 3,
    Bmp = 4,
    Flash = 5,
    Yaml = 6,
    Icon = 7,
    Html = 8,
    Flv = 9,
    Pdf = 10,
    Zip = 11,
    HydrusEncryptedZip = 12,
    Mp3 = 13,
    Mp4 = 14,
    Ogg = 15,
    Flac = 16,
    Wma = 17,
    Wmv = 18,
    UndeterminedWindowsMedia = 19,
    Mkv = 20,
    Webm = 21,
    Json = 22,
    Apng = 23,
    UndeterminedPng = 24,
    Mpeg = 25,
    Mov = 26,
    Avi = 27,
    HydrusUpdateDefinitions = 28,
    HydrusUpdateContent = 29,
    Txt = 30,
    Rar = 31,
    Archive7zip = 32,
    Webp = 33,
    Tiff = 34,
    Psd = 35,
    OctetStream = 100,
    Unknown = 101,
}

impl HydrusMime {
    /// Decode a stored type code. Codes this table doesn't know are
    /// [`Unknown`](Self::Unknown).
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Jpeg,
            2 => Self::Png,
            3 => Self::Gif,
            4 => Self::Bmp,
            5 => Self::Flash,
            6 => Self::Yaml,
            7 => Self::Icon,
            8 => Self::Html,
            9 => Self::Flv,
            10 => Self::Pdf,
            11 => Self::Zip,
            12 => Self::HydrusEncryptedZip,
            13 => Self::Mp3,
            14 => Self::Mp4,
            15 => Self::Ogg,
            16 => Self::Flac,
            17 => Self::Wma,
            18 => Self::Wmv,
            19 => Self::UndeterminedWindowsMedia,
            20 => Self::Mkv,
            21 => Self::Webm,
            22 => Self::Json,
            23 => Self::Apng,
            24 => Self::UndeterminedPng,
            25 => Self::Mpeg,
            26 => Self::Mov,
            27 => Self::Avi,
            28 => Self::HydrusUpdateDefinitions,
            29 => Self::HydrusUpdateContent,
            30 => Self::Txt,
            31 => Self::Rar,
            32 => Self::Archive7zip,
            33 => Self::Webp,
            34 => Self::Tiff,
            35 => Self::Psd,
            100 => Self::OctetStream,
            _ => Self::Unknown,
        }
    }

    /// The displayable type, if this is one.
    pub fn display_mime(self) -> Option<Mime> {
        match self {
            Self::Png => Some(Mime::Png),
            Self::Jpeg => Some(Mime::Jpeg),
            Self::Webp => Some(Mime::Webp),
            Self::Gif => Some(Mime::Gif),
            Self::Webm => Some(Mime::Webm),
            Self::Mp4 => Some(Mime::Mp4),
            Self::Flash => Some(Mime::Swf),
            _ => None,
        }
    }

    /// Extension of the original file in `client_files`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Flash => "swf",
            Self::Mpeg => "mpeg",
            Self::Mov => "mov",
            Self::Avi => "avi",
            _ => "unknown",
        }
    }
}
