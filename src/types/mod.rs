use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::services::AccessService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub base_dir: Arc<PathBuf>,
    pub static_dir: Arc<PathBuf>,
    pub templates_dir: Arc<PathBuf>,
    pub site_title: Arc<String>,
    pub access: Option<AccessService>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            static_dir: config.static_dir.clone(),
            templates_dir: config.templates_dir.clone(),
            site_title: Arc::new(config.site_title.clone()),
            access: config.password.as_deref().map(AccessService::new),
        }
    }
}

/// Outcome of resolving a logical path against the books directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Document(DocumentTarget),
    Listing(DirectoryListing),
    NotFound,
}

/// A markdown file chosen to answer a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTarget {
    /// Logical path without the `.md` extension; links inside the
    /// document are resolved relative to this.
    pub logical_path: String,
    pub file: PathBuf,
}

/// Contents of a directory that has no index document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub logical_path: String,
    pub entries: Vec<ListingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub logical_path: String,
    pub is_dir: bool,
}

/// Rendered document
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub title: String,
    pub html: String,
}

/// Search hit, one per matching document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub path: String,
    pub book: String,
    pub volume: String,
    pub url: String,
    pub snippet: String,
}

/// A top-level collection and its immediate chapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapBook {
    pub title: String,
    pub path: String,
    pub chapters: Vec<SitemapChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapChapter {
    pub title: String,
    pub path: String,
}

/// Template rendering context
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub title: String,
    pub site_title: String,
    pub content: String,
    pub fab: String,
}
