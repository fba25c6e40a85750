use crate::{Error, MediaType, Result, sniff};

/// Decides whether a byte prefix is acceptable and what it is.
///
/// The prefix is the first bytes of a fully written file (at most
/// [`SNIFF_LEN`](crate::SNIFF_LEN) are meaningful). Rejections must be
/// reported as [`Error::Unsupported`] so callers can tell them apart from I/O
/// failures.
pub trait Validator: Send + Sync {
    fn validate(&self, prefix: &[u8]) -> Result<MediaType>;
}

impl<F> Validator for F
where
    F: Fn(&[u8]) -> Result<MediaType> + Send + Sync,
{
    fn validate(&self, prefix: &[u8]) -> Result<MediaType> {
        self(prefix)
    }
}

/// Accepts content whose sniffed type is in a fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    essences: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            essences: types
                .into_iter()
                .map(|t| MediaType::new(t.as_ref()).essence())
                .collect(),
        }
    }

    /// JPEG, PNG and WebP.
    pub fn images() -> Self {
        Self::new([MediaType::JPEG, MediaType::PNG, MediaType::WEBP])
    }

    pub fn is_allowed(&self, media_type: &MediaType) -> bool {
        let essence = media_type.essence();
        self.essences.iter().any(|allowed| *allowed == essence)
    }

    pub fn is_empty(&self) -> bool {
        self.essences.is_empty()
    }
}

impl Validator for AllowList {
    fn validate(&self, prefix: &[u8]) -> Result<MediaType> {
        let detected = sniff(prefix);
        if self.is_allowed(&detected) {
            Ok(detected)
        } else {
            Err(Error::Unsupported { detected })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_accepts_png_jpeg_webp() {
        let images = AllowList::images();
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(images.validate(&png).unwrap(), MediaType::PNG);
        assert_eq!(images.validate(&[0xFF, 0xD8, 0xFF, 0xDB]).unwrap(), MediaType::JPEG);
        assert_eq!(images.validate(b"RIFF\0\0\0\0WEBP").unwrap(), MediaType::WEBP);
    }

    #[test]
    fn images_rejects_text_as_unsupported() {
        let err = AllowList::images()
            .validate(b"this is not a valid image file")
            .unwrap_err();
        assert!(err.is_rejection());
        match err {
            Error::Unsupported { detected } => assert_eq!(detected, MediaType::TEXT),
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn images_rejects_gif() {
        assert!(AllowList::images().validate(b"GIF89a....").is_err());
    }

    #[test]
    fn allow_list_matches_on_essence() {
        let text = AllowList::new(["Text/Plain"]);
        assert!(text.validate(b"hello").is_ok());
    }

    #[test]
    fn closures_are_validators() {
        let only_pdf = |prefix: &[u8]| -> Result<MediaType> {
            match sniff(prefix) {
                t if t == MediaType::PDF => Ok(t),
                detected => Err(Error::Unsupported { detected }),
            }
        };
        assert!(only_pdf.validate(b"%PDF-1.7").is_ok());
        assert!(only_pdf.validate(b"plain").is_err());
    }
}
