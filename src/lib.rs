//! Bookshelf - a small self-hosted browser for Markdown books
//!
//! A tree of Markdown documents is served as HTML pages with folder
//! listings, full-text search, a sitemap and an optional shared-password gate.

pub mod components;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod router;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::{Args, Config};
pub use errors::LibraryError;
pub use router::create_router;
pub use services::{AccessService, FileService, MarkdownService, SearchService};
pub use types::{AppState, DirectoryListing, DocumentTarget, ListingEntry, RenderedDocument, Resolution, SearchResult};

pub use utils::{display_title, document_url, escape_attr, escape_html, normalize_logical_path};
