//! Core type definitions shared by the validator, storage and HTTP layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats accepted for a school's picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG, declared as `image/jpeg` or `image/jpg`.
    Jpeg,
    /// PNG, declared as `image/png`.
    Png,
}

impl ImageFormat {
    /// Content types accepted on upload.
    pub const ACCEPTED_CONTENT_TYPES: &'static [&'static str] =
        &["image/jpeg", "image/png", "image/jpg"];

    /// Map a declared content type to a format.
    ///
    /// Matching is exact apart from ASCII case, so `image/jpeg; charset=x`
    /// is rejected just like an unknown type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// File extension (with leading dot) used when none can be taken from
    /// the uploaded file name.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
        }
    }

    /// Canonical content type.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_content_type() {
        assert_eq!(ImageFormat::from_content_type("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_content_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_content_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_content_type("image/gif"), None);
        assert_eq!(ImageFormat::from_content_type(""), None);
    }

    #[test]
    fn test_accepted_content_types_all_map() {
        for ct in ImageFormat::ACCEPTED_CONTENT_TYPES {
            assert!(ImageFormat::from_content_type(ct).is_some(), "{ct} should map");
        }
    }

    #[test]
    fn test_extension_and_display() {
        assert_eq!(ImageFormat::Jpeg.extension(), ".jpg");
        assert_eq!(ImageFormat::Png.extension(), ".png");
        assert_eq!(ImageFormat::Jpeg.to_string(), "jpeg");
        assert_eq!(ImageFormat::Png.content_type(), "image/png");
    }
}
