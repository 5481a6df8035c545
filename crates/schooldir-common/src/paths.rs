//! Path utilities for naming uploaded images and resolving stored references.
//!
//! Uploads are named `{unix_millis}_{sanitized name}` both on disk and as the
//! remote public id, so a listing page can tell images apart at a glance.

use std::path::Path;

/// Public path under which locally stored images are served.
pub const DEFAULT_PUBLIC_PATH: &str = "/schoolImages";

/// Shown when a record carries no image reference.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Replace every character that is not ASCII alphanumeric with `_`.
///
/// # Examples
///
/// ```
/// use schooldir_common::paths::sanitize_name;
///
/// assert_eq!(sanitize_name("Oak Hill High"), "Oak_Hill_High");
/// assert_eq!(sanitize_name("St. Mary's"), "St__Mary_s");
/// ```
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Build the collision-resistant stem for an upload.
///
/// # Examples
///
/// ```
/// use schooldir_common::paths::upload_stem;
///
/// assert_eq!(upload_stem(1700000000000, "Oak Hill"), "1700000000000_Oak_Hill");
/// ```
pub fn upload_stem(timestamp_millis: i64, name: &str) -> String {
    format!("{}_{}", timestamp_millis, sanitize_name(name))
}

/// Extension of an uploaded file name, lowercased and with its leading dot.
///
/// Returns `None` when the name has no extension or it is not plain ASCII
/// alphanumeric (so it can never smuggle a path separator into a filename).
///
/// # Examples
///
/// ```
/// use schooldir_common::paths::file_extension;
///
/// assert_eq!(file_extension("campus.PNG").as_deref(), Some(".png"));
/// assert_eq!(file_extension("campus"), None);
/// ```
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Whether a reference starts with a URI scheme such as `https:`.
pub fn has_uri_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve a stored image reference to something a browser can load.
///
/// Remote references (anything with a URI scheme) are returned unchanged;
/// local filenames are placed under `public_path`.
///
/// # Examples
///
/// ```
/// use schooldir_common::paths::resolve_image_url;
///
/// assert_eq!(
///     resolve_image_url("https://cdn.example.com/a.png", "/schoolImages"),
///     "https://cdn.example.com/a.png"
/// );
/// assert_eq!(resolve_image_url("1_Oak.png", "/schoolImages/"), "/schoolImages/1_Oak.png");
/// ```
pub fn resolve_image_url(reference: &str, public_path: &str) -> String {
    if reference.is_empty() {
        return PLACEHOLDER_IMAGE.to_string();
    }
    if has_uri_scheme(reference) {
        return reference.to_string();
    }
    format!("{}/{}", public_path.trim_end_matches('/'), reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Oak Hill"), "Oak_Hill");
        assert_eq!(sanitize_name("abc123"), "abc123");
        assert_eq!(sanitize_name("../etc"), "___etc");
        assert_eq!(sanitize_name(""), "");
    }

    #[test]
    fn test_upload_stem() {
        assert_eq!(upload_stem(5, "A B"), "5_A_B");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("x.jpeg").as_deref(), Some(".jpeg"));
        assert_eq!(file_extension("dir/x.Jpg").as_deref(), Some(".jpg"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(file_extension("weird.p g"), None);
    }

    #[test]
    fn test_has_uri_scheme() {
        assert!(has_uri_scheme("https://res.cloudinary.com/x.png"));
        assert!(has_uri_scheme("http://x"));
        assert!(has_uri_scheme("data:image/png;base64,AAAA"));
        assert!(!has_uri_scheme("1700_Oak.png"));
        assert!(!has_uri_scheme("1700:Oak.png"));
        assert!(!has_uri_scheme(""));
    }

    #[test]
    fn test_resolve_image_url() {
        assert_eq!(resolve_image_url("", DEFAULT_PUBLIC_PATH), PLACEHOLDER_IMAGE);
        assert_eq!(
            resolve_image_url("1_Oak.jpg", DEFAULT_PUBLIC_PATH),
            "/schoolImages/1_Oak.jpg"
        );
        assert_eq!(
            resolve_image_url("http://cdn/x.jpg", DEFAULT_PUBLIC_PATH),
            "http://cdn/x.jpg"
        );
    }
}
