use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::errors::LibraryError;
use crate::types::{DirectoryListing, DocumentTarget, ListingEntry, Resolution, SitemapBook, SitemapChapter};
use crate::utils::{INDEX_DOCUMENT, MARKDOWN_EXT, display_title, normalize_logical_path, strip_markdown_ext};

/// Resolves logical paths against the books directory and lists its contents
#[derive(Clone)]
pub struct FileService {
    base_dir: PathBuf,
}

/// Name and kind of a visible directory child
struct Child {
    name: String,
    is_dir: bool,
}

impl FileService {
    /// Create a new file service
    pub fn new(base_dir: PathBuf) -> Self {
        debug!("Creating FileService with base directory: {:?}", base_dir);
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Decide whether `raw_path` names a document, a directory listing, or nothing.
    ///
    /// A directory wins over a same-named document and is answered by its
    /// `README.md` when one exists. Otherwise `.md` is appended unless the
    /// path already carries it. Paths that fail normalization or leave the
    /// books directory resolve to [`Resolution::NotFound`].
    pub fn resolve(&self, raw_path: &str) -> Result<Resolution, LibraryError> {
        let logical = match normalize_logical_path(raw_path) {
            Ok(logical) => logical,
            Err(_) => {
                warn!("Rejected malformed path: '{}'", raw_path);
                return Ok(Resolution::NotFound);
            }
        };

        let requested = self.base_dir.join(&logical);
        if requested.is_dir() {
            if !self.contained(&requested) {
                warn!("Directory escapes the books root: '{}'", logical);
                return Ok(Resolution::NotFound);
            }
            let index = requested.join(INDEX_DOCUMENT);
            if index.is_file() && self.contained(&index) {
                debug!("Directory '{}' resolved to its index document", logical);
                return Ok(Resolution::Document(DocumentTarget { logical_path: logical, file: index }));
            }
            debug!("Directory '{}' has no index document, listing it", logical);
            return self.list_directory(&logical).map(Resolution::Listing);
        }

        let file = if logical.ends_with(MARKDOWN_EXT) {
            requested
        } else {
            self.base_dir.join(format!("{logical}{MARKDOWN_EXT}"))
        };
        if file.is_file() && self.contained(&file) {
            let logical_path = strip_markdown_ext(&logical).to_string();
            debug!("Path '{}' resolved to document {:?}", logical_path, file);
            return Ok(Resolution::Document(DocumentTarget { logical_path, file }));
        }

        debug!("Path '{}' resolved to nothing", logical);
        Ok(Resolution::NotFound)
    }

    /// List a directory: child directories first, then documents other than
    /// the index, each group in byte order of the raw file name.
    ///
    /// An empty `logical_path` lists the books root.
    pub fn list_directory(&self, logical_path: &str) -> Result<DirectoryListing, LibraryError> {
        let full_path = self.base_dir.join(logical_path);
        let children = self.visible_children(&full_path)?;

        let child_path = |name: &str| {
            if logical_path.is_empty() {
                name.to_string()
            } else {
                format!("{logical_path}/{name}")
            }
        };

        let mut dirs: Vec<&Child> = children.iter().filter(|c| c.is_dir).collect();
        let mut docs: Vec<&Child> = children
            .iter()
            .filter(|c| !c.is_dir && c.name.ends_with(MARKDOWN_EXT) && c.name != INDEX_DOCUMENT)
            .collect();
        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        docs.sort_by(|a, b| a.name.cmp(&b.name));

        let mut entries = Vec::with_capacity(dirs.len() + docs.len());
        for dir in dirs {
            entries.push(ListingEntry {
                name: display_title(&dir.name),
                logical_path: child_path(&dir.name),
                is_dir: true,
            });
        }
        for doc in docs {
            let stem = strip_markdown_ext(&doc.name);
            entries.push(ListingEntry {
                name: display_title(stem),
                logical_path: child_path(stem),
                is_dir: false,
            });
        }

        info!("Listed directory '{}', {} entries", logical_path, entries.len());
        Ok(DirectoryListing { logical_path: logical_path.to_string(), entries })
    }

    /// Every top-level directory with its immediate chapters
    pub fn sitemap(&self) -> Result<Vec<SitemapBook>, LibraryError> {
        let mut books = Vec::new();
        let mut top = self.visible_children(&self.base_dir)?;
        top.sort_by(|a, b| a.name.cmp(&b.name));

        for book in top.into_iter().filter(|c| c.is_dir) {
            let mut items = match self.visible_children(&self.base_dir.join(&book.name)) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Skipping unreadable book '{}': {}", book.name, e);
                    continue;
                }
            };
            items.sort_by(|a, b| a.name.cmp(&b.name));

            let mut chapters = Vec::new();
            for item in items {
                if item.is_dir {
                    chapters.push(SitemapChapter {
                        title: display_title(&item.name),
                        path: format!("{}/{}", book.name, item.name),
                    });
                } else if item.name.ends_with(MARKDOWN_EXT)
                    && !item.name.eq_ignore_ascii_case(INDEX_DOCUMENT)
                {
                    let stem = strip_markdown_ext(&item.name);
                    chapters.push(SitemapChapter {
                        title: display_title(stem),
                        path: format!("{}/{}", book.name, stem),
                    });
                }
            }

            books.push(SitemapBook { title: display_title(&book.name), path: book.name, chapters });
        }

        info!("Built sitemap with {} books", books.len());
        Ok(books)
    }

    /// Read a resolved document as UTF-8
    pub fn read_document(&self, target: &DocumentTarget) -> Result<String, LibraryError> {
        let bytes = fs::read(&target.file).map_err(|e| {
            error!("Failed to read document {:?}: {}", target.file, e);
            LibraryError::Io(e)
        })?;
        String::from_utf8(bytes).map_err(|e| {
            error!("Document {:?} is not valid UTF-8: {}", target.file, e);
            LibraryError::Decode { path: target.logical_path.clone() }
        })
    }

    /// A non-markdown file addressed exactly, such as an image a book links to
    pub fn asset(&self, raw_path: &str) -> Option<PathBuf> {
        let logical = normalize_logical_path(raw_path).ok()?;
        if logical.ends_with(MARKDOWN_EXT) || logical.split('/').any(|s| s.starts_with('.')) {
            return None;
        }
        let path = self.base_dir.join(&logical);
        (path.is_file() && self.contained(&path)).then_some(path)
    }

    /// Determine content type for a file
    pub fn content_type_for(&self, path: &Path) -> &'static str {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css; charset=utf-8",
            "js" => "application/javascript; charset=utf-8",
            "json" => "application/json",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "txt" => "text/plain; charset=utf-8",
            "pdf" => "application/pdf",
            "mp3" => "audio/mpeg",
            _ => "application/octet-stream",
        }
    }

    /// True when `path` still lies under the books root once symlinks are followed
    pub(crate) fn contained(&self, path: &Path) -> bool {
        match (fs::canonicalize(&self.base_dir), fs::canonicalize(path)) {
            (Ok(root), Ok(target)) => target.starts_with(root),
            _ => false,
        }
    }

    fn visible_children(&self, dir: &Path) -> Result<Vec<Child>, LibraryError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                return LibraryError::NotFound;
            }
            error!("Failed to read directory {:?}: {}", dir, e);
            LibraryError::Io(e)
        })?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry in {:?}: {}", dir, e);
                    continue;
                }
            };
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 file name in {:?}", dir);
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            children.push(Child { is_dir: entry.path().is_dir(), name });
        }
        Ok(children)
    }
}
