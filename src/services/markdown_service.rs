use log::debug;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::errors::LibraryError;
use crate::services::FileService;
use crate::types::{DocumentTarget, RenderedDocument};
use crate::utils::{display_title, document_url, normalize_logical_path, strip_markdown_ext};

/// Service for handling markdown rendering
pub struct MarkdownService {
    options: Options,
}

impl MarkdownService {
    /// Create a new markdown service
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }

    /// Read and render a resolved document
    pub fn render(&self, files: &FileService, target: &DocumentTarget) -> Result<RenderedDocument, LibraryError> {
        let raw = files.read_document(target)?;
        let html = self.to_html(&raw, &target.logical_path);
        let title = document_title(target);
        debug!("Rendered '{}' ({} bytes of HTML)", target.logical_path, html.len());
        Ok(RenderedDocument { title, html })
    }

    /// Convert markdown to HTML.
    ///
    /// Single newlines become `<br />` so lyrics keep their line structure.
    /// Link and image destinations starting with `./` are rewritten against
    /// `document_path` before the HTML is produced.
    pub fn to_html(&self, raw: &str, document_path: &str) -> String {
        let events = Parser::new_ext(raw, self.options).map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
                link_type,
                dest_url: rewrite_destination(document_path, dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
                link_type,
                dest_url: rewrite_destination(document_path, dest_url),
                title,
                id,
            }),
            other => other,
        });

        let mut out = String::with_capacity(raw.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

fn rewrite_destination<'a>(document_path: &str, dest: CowStr<'a>) -> CowStr<'a> {
    if dest.starts_with("./") {
        CowStr::from(rewrite_link(document_path, &dest))
    } else {
        dest
    }
}

/// Rewrite a `./target` link relative to the full logical path of the
/// current document, so `./x` inside `a/b` points at `a/b/x`.
///
/// Any other target is returned unchanged. A `#fragment` survives the
/// rewrite outside the encoded path. `..` segments are resolved within the
/// books root.
pub fn rewrite_link(document_path: &str, target: &str) -> String {
    let Some(rest) = target.strip_prefix("./") else {
        return target.to_string();
    };
    let (path_part, fragment) = match rest.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (rest, None),
    };

    let joined = format!("{}/{}", document_path.trim_end_matches('/'), path_part);
    // `..` is resolved before encoding; a target climbing above the root is left as written.
    let Ok(logical) = normalize_logical_path(&joined) else {
        return target.to_string();
    };
    let mut url = document_url(&logical);
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

/// Title from the backing file name: extension dropped, hyphens to spaces, title-cased
pub fn document_title(target: &DocumentTarget) -> String {
    let name = target
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.logical_path.clone());
    display_title(strip_markdown_ext(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn target(logical: &str, file: &str) -> DocumentTarget {
        DocumentTarget { logical_path: logical.to_string(), file: PathBuf::from(file) }
    }

    #[test]
    fn test_soft_breaks_become_line_breaks() {
        let html = MarkdownService::new().to_html("first line\nsecond line", "poetry/night");
        assert_eq!(html, "<p>first line<br />\nsecond line</p>\n");
    }

    #[test]
    fn test_relative_links_join_the_document_path() {
        let html = MarkdownService::new().to_html("[next](./chapter-2)", "novels/vol1");
        assert!(html.contains("href=\"/books/novels/vol1/chapter-2\""), "{html}");
    }

    #[test]
    fn test_other_links_pass_through() {
        let service = MarkdownService::new();
        let html = service.to_html("[up](../index) [web](https://example.com/a) [abs](/sitemap)", "a/b");
        assert!(html.contains("href=\"../index\""));
        assert!(html.contains("href=\"https://example.com/a\""));
        assert!(html.contains("href=\"/sitemap\""));
    }

    #[test]
    fn test_parenthesised_prose_is_not_rewritten() {
        let html = MarkdownService::new().to_html("a remark (./not-a-link) in passing", "a/b");
        assert!(html.contains("(./not-a-link)"));
    }

    #[test]
    fn test_images_are_rewritten() {
        let html = MarkdownService::new().to_html("![cover](./cover.png)", "a/b");
        assert!(html.contains("src=\"/books/a/b/cover.png\""), "{html}");
    }

    #[test]
    fn test_rewrite_link_encodes_and_keeps_fragment() {
        assert_eq!(rewrite_link("my book", "./part one#verse-2"), "/books/my%20book/part%20one#verse-2");
        assert_eq!(rewrite_link("a\\b", "./x"), "/books/a/b/x");
        assert_eq!(rewrite_link("a/b", "x"), "x");
        assert_eq!(rewrite_link("a/b", "./"), "/books/a/b");
    }

    #[test]
    fn test_parent_segments_are_resolved_not_dropped() {
        let html = MarkdownService::new().to_html("[s](./../sibling)", "a/b");
        assert!(html.contains("href=\"/books/a/sibling\""), "{html}");

        assert_eq!(rewrite_link("a/b", "./../../c#top"), "/books/c#top");
        assert_eq!(rewrite_link("a/b", "././x/../y"), "/books/a/b/y");
        assert_eq!(rewrite_link("a/b", "./../../../etc"), "./../../../etc");
    }

    #[test]
    fn test_document_title_from_file_name() {
        assert_eq!(document_title(&target("poetry/night", "/lib/poetry/the-long-night.md")), "The Long Night");
        assert_eq!(document_title(&target("poetry", "/lib/poetry/README.md")), "Readme");

        let title = document_title(&target("songs/夜-空", "/lib/songs/夜-空.md"));
        assert!(!title.contains('-'));
        assert!(!title.contains(".md"));
    }
}
