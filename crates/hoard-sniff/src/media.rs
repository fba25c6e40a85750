use std::borrow::Cow;
use std::fmt;

/// A detected media type such as `image/png` or `text/plain; charset=utf-8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(Cow<'static, str>);

impl MediaType {
    pub const PNG: MediaType = MediaType::from_static("image/png");
    pub const JPEG: MediaType = MediaType::from_static("image/jpeg");
    pub const WEBP: MediaType = MediaType::from_static("image/webp");
    pub const GIF: MediaType = MediaType::from_static("image/gif");
    pub const BMP: MediaType = MediaType::from_static("image/bmp");
    pub const ICON: MediaType = MediaType::from_static("image/x-icon");
    pub const PDF: MediaType = MediaType::from_static("application/pdf");
    pub const ZIP: MediaType = MediaType::from_static("application/zip");
    pub const GZIP: MediaType = MediaType::from_static("application/x-gzip");
    pub const OGG: MediaType = MediaType::from_static("application/ogg");
    pub const WAVE: MediaType = MediaType::from_static("audio/wave");
    pub const AVI: MediaType = MediaType::from_static("video/avi");
    pub const WEBM: MediaType = MediaType::from_static("video/webm");
    pub const MP4: MediaType = MediaType::from_static("video/mp4");
    pub const MPEG: MediaType = MediaType::from_static("audio/mpeg");
    pub const HTML: MediaType = MediaType::from_static("text/html; charset=utf-8");
    pub const XML: MediaType = MediaType::from_static("text/xml; charset=utf-8");
    pub const TEXT: MediaType = MediaType::from_static("text/plain; charset=utf-8");
    pub const TEXT_UTF16BE: MediaType = MediaType::from_static("text/plain; charset=utf-16be");
    pub const TEXT_UTF16LE: MediaType = MediaType::from_static("text/plain; charset=utf-16le");
    pub const OCTET_STREAM: MediaType = MediaType::from_static("application/octet-stream");

    pub const fn from_static(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    pub fn new(s: impl Into<String>) -> Self {
        Self(Cow::Owned(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `type/subtype` part, without parameters, lowercased.
    pub fn essence(&self) -> String {
        self.0
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    pub fn into_string(self) -> String {
        self.0.into_owned()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(MediaType::TEXT.essence(), "text/plain");
        assert_eq!(MediaType::new("Image/PNG").essence(), "image/png");
    }
}
