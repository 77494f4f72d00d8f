use std::path::{Component, Path};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::errors::LibraryError;

/// Extension of every document in the tree
pub const MARKDOWN_EXT: &str = ".md";
/// Document a directory renders when requested directly
pub const INDEX_DOCUMENT: &str = "README.md";
/// URL prefix under which logical paths are routed
pub const DOCUMENTS_PREFIX: &str = "books";

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    html_escape::encode_safe(text).into_owned()
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Reduce a user supplied path to `seg/seg/seg` form.
///
/// `.` and empty segments vanish, `..` is resolved lexically and may not
/// climb above the root. Backslashes count as separators.
pub fn normalize_logical_path(raw: &str) -> Result<String, LibraryError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(LibraryError::InvalidPath);
                }
            }
            other => {
                if other.contains('\0') || !is_plain_segment(other) {
                    return Err(LibraryError::InvalidPath);
                }
                segments.push(other);
            }
        }
    }
    if segments.is_empty() {
        return Err(LibraryError::InvalidPath);
    }
    Ok(segments.join("/"))
}

// Rejects things like `C:` that the platform would treat as a prefix.
fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// `name.md` -> `name`; anything else is returned untouched
pub fn strip_markdown_ext(name: &str) -> &str {
    name.strip_suffix(MARKDOWN_EXT).unwrap_or(name)
}

/// Build the routed URL for a logical path, percent-encoding each segment
pub fn document_url(logical_path: &str) -> String {
    let segments = logical_path.split('/').filter(|s| !s.is_empty());
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return format!("/{}/{}", DOCUMENTS_PREFIX, logical_path.trim_matches('/'));
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().push(DOCUMENTS_PREFIX).extend(segments);
    }
    url.path().to_string()
}

/// Turn a file or directory name into a display title.
///
/// Hyphens become spaces. ASCII letters are upper-cased at the start of a
/// word and lower-cased inside one; other characters are left as they are.
pub fn display_title(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        let ch = if ch == '-' { ' ' } else { ch };
        if ch.is_ascii_alphabetic() {
            out.push(if in_word { ch.to_ascii_lowercase() } else { ch.to_ascii_uppercase() });
        } else {
            out.push(ch);
        }
        in_word = ch.is_alphabetic();
    }
    out
}

/// Shorten `text` to at most `max` characters without splitting one
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Generate last modified metadata HTML
pub fn last_modified_html(path: &Path) -> String {
    let Ok(mtime) = std::fs::metadata(path).and_then(|m| m.modified()) else {
        return String::new();
    };
    match OffsetDateTime::from(mtime).format(&Rfc3339) {
        Ok(s) => format!("<p class=\"meta\">Last modified: {}</p>", escape_html(&s)),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_and_dotted() {
        assert_eq!(normalize_logical_path("poetry/night").unwrap(), "poetry/night");
        assert_eq!(normalize_logical_path("/poetry//./night/").unwrap(), "poetry/night");
        assert_eq!(normalize_logical_path("poetry\\night").unwrap(), "poetry/night");
        assert_eq!(normalize_logical_path("a/b/../c").unwrap(), "a/c");
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(matches!(normalize_logical_path("../etc/passwd"), Err(LibraryError::InvalidPath)));
        assert!(matches!(normalize_logical_path("a/../../b"), Err(LibraryError::InvalidPath)));
        assert!(matches!(normalize_logical_path(""), Err(LibraryError::InvalidPath)));
        assert!(matches!(normalize_logical_path("a/.."), Err(LibraryError::InvalidPath)));
        assert!(matches!(normalize_logical_path("a/b\0c"), Err(LibraryError::InvalidPath)));
    }

    #[test]
    fn test_document_url_encodes_segments() {
        assert_eq!(document_url("poetry/night"), "/books/poetry/night");
        assert_eq!(document_url("my book/ch 1"), "/books/my%20book/ch%201");
        assert_eq!(document_url("a//b/"), "/books/a/b");
        assert_eq!(document_url("q?#"), "/books/q%3F%23");
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("the-starry-night"), "The Starry Night");
        assert_eq!(display_title("README"), "Readme");
        assert_eq!(display_title("vol1"), "Vol1");
        assert_eq!(display_title("o'neil"), "O'Neil");
    }

    #[test]
    fn test_display_title_non_latin_unchanged() {
        assert_eq!(display_title("ぷらいべーと"), "ぷらいべーと");
        assert_eq!(display_title("星-空"), "星 空");
        assert_eq!(display_title("naïve-café"), "Naïve Café");
    }

    #[test]
    fn test_strip_markdown_ext() {
        assert_eq!(strip_markdown_ext("night.md"), "night");
        assert_eq!(strip_markdown_ext("night"), "night");
        assert_eq!(strip_markdown_ext("notes.md.txt"), "notes.md.txt");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("星空の下", 2), "星空");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_escape() {
        let escaped = escape_html("<b>&</b>");
        assert!(escaped.starts_with("&lt;b&gt;&amp;&lt;"));
        assert!(!escaped.contains('<'));
        assert!(escape_attr("a\"b").contains("&quot;"));
    }
}
