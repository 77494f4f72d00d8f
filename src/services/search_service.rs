use std::fs;
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use walkdir::{DirEntry, WalkDir};

use crate::errors::LibraryError;
use crate::services::FileService;
use crate::types::SearchResult;
use crate::utils::{MARKDOWN_EXT, document_url, strip_markdown_ext};

/// Characters of context kept before the match
const SNIPPET_BEFORE: usize = 30;
/// Characters kept from the match start onwards
const SNIPPET_AFTER: usize = 150;

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#>*_`~\-]+").expect("markup regex is valid"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

/// Linear full-text search over every document in the tree
pub struct SearchService {
    file_service: FileService,
}

impl SearchService {
    /// Create a new search service
    pub fn new(file_service: FileService) -> Self {
        Self { file_service }
    }

    /// Case-insensitive literal search; one result per matching document,
    /// in the order of a name-sorted depth-first walk.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, LibraryError> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Empty search query received");
            return Ok(Vec::new());
        }

        info!("Starting search for query: '{}'", query);
        let start_time = std::time::Instant::now();

        let matcher = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| LibraryError::Search(e.to_string()))?;

        let root = self.file_service.base_dir();
        // Symlinks are followed only while their target stays inside the root,
        // matching what the resolver will serve.
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || (!is_hidden(entry)
                        && (!entry.path_is_symlink() || self.file_service.contained(entry.path())))
            });

        let mut results = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry during search: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.ends_with(MARKDOWN_EXT) {
                continue;
            }

            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable document {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            let Some(found) = matcher.find(&content) else {
                continue;
            };

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let Some(relative) = relative.to_str() else {
                continue;
            };
            let path = strip_markdown_ext(&relative.replace('\\', "/")).to_string();
            debug!("Match in '{}' at byte {}", path, found.start());

            let book = path.split('/').next().unwrap_or_default().to_string();
            let volume = path.rsplit('/').next().unwrap_or_default().to_string();

            results.push(SearchResult {
                url: document_url(&path),
                snippet: snippet(&content, found.start()),
                book,
                volume,
                path,
            });
        }

        let duration = start_time.elapsed();
        info!("Search completed in {}ms, found {} results", duration.as_millis(), results.len());
        Ok(results)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Excerpt around a match at byte offset `match_start`, counted in characters,
/// with markdown punctuation and HTML tags removed.
pub fn snippet(content: &str, match_start: usize) -> String {
    let char_pos = content[..match_start].chars().count();
    let start = char_pos.saturating_sub(SNIPPET_BEFORE);
    let window: String = content
        .chars()
        .skip(start)
        .take(char_pos + SNIPPET_AFTER - start)
        .collect();

    let cleaned = MARKUP_RE.replace_all(&window, "");
    let cleaned = TAG_RE.replace_all(&cleaned, "");
    format!("{}...", cleaned.trim())
}
