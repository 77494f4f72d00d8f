use log::{debug, info};

use crate::errors::LibraryError;
use crate::services::FileService;
use crate::types::{DirectoryListing, ListingEntry};
use crate::utils::{display_title, document_url, escape_attr, escape_html};

/// Component for the navigation views: breadcrumbs, folder listings,
/// the home page collection list and the sitemap
pub struct NavigationComponent {
    file_service: FileService,
}

impl NavigationComponent {
    /// Create a new navigation component
    pub fn new(file_service: FileService) -> Self {
        debug!("Creating new NavigationComponent");
        Self { file_service }
    }

    /// Trail of links from the home page down to `logical_path`
    pub fn breadcrumbs(&self, logical_path: &str) -> String {
        let mut html = String::from("<nav class=\"breadcrumbs\"><a href=\"/\">Home</a>");
        let mut prefix = String::new();
        for segment in logical_path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            html.push_str(&format!(
                " / <a href=\"{}\">{}</a>",
                escape_attr(&document_url(&prefix)),
                escape_html(&display_title(segment))
            ));
        }
        html.push_str("</nav>");
        html
    }

    /// Body of a folder index page
    pub fn listing_html(&self, listing: &DirectoryListing) -> String {
        let mut html = self.breadcrumbs(&listing.logical_path);
        html.push_str(&format!(
            "<h1>{}</h1>",
            escape_html(&display_title(&listing.logical_path))
        ));
        if listing.entries.is_empty() {
            html.push_str("<p class=\"empty\">This folder is empty.</p>");
            return html;
        }
        html.push_str(&entries_list(&listing.entries));
        html
    }

    /// Body of the home page: one link per collection and loose document
    pub fn home_html(&self, site_title: &str) -> Result<String, LibraryError> {
        let root = self.file_service.list_directory("")?;
        let mut html = format!("<section class=\"hero\"><h1>{}</h1></section>", escape_html(site_title));
        if root.entries.is_empty() {
            html.push_str("<p class=\"empty\">No books yet.</p>");
        } else {
            html.push_str(&entries_list(&root.entries));
        }
        Ok(html)
    }

    /// Body of the sitemap page: every book with its chapters
    pub fn sitemap_html(&self) -> Result<String, LibraryError> {
        let start_time = std::time::Instant::now();
        let books = self.file_service.sitemap()?;

        let mut html = String::from("<h1>Sitemap</h1><div class=\"sitemap\">");
        for book in &books {
            html.push_str("<section class=\"sitemap-book\">");
            html.push_str(&format!(
                "<h2><a href=\"{}\">{}</a></h2>",
                escape_attr(&document_url(&book.path)),
                escape_html(&book.title)
            ));
            if !book.chapters.is_empty() {
                html.push_str("<ul>");
                for chapter in &book.chapters {
                    html.push_str(&format!(
                        "<li><a href=\"{}\">{}</a></li>",
                        escape_attr(&document_url(&chapter.path)),
                        escape_html(&chapter.title)
                    ));
                }
                html.push_str("</ul>");
            }
            html.push_str("</section>");
        }
        html.push_str("</div>");

        info!("Sitemap built in {}ms", start_time.elapsed().as_millis());
        Ok(html)
    }
}

fn entries_list(entries: &[ListingEntry]) -> String {
    let mut html = String::from("<ul class=\"listing\">\n");
    for entry in entries {
        let class = if entry.is_dir { "dir" } else { "doc" };
        let marker = if entry.is_dir { "/" } else { "" };
        html.push_str(&format!(
            "  <li class=\"{}\"><a href=\"{}\">{}{}</a></li>\n",
            class,
            escape_attr(&document_url(&entry.logical_path)),
            escape_html(&entry.name),
            marker
        ));
    }
    html.push_str("</ul>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_breadcrumbs() {
        let nav = NavigationComponent::new(FileService::new(PathBuf::from("books")));
        let html = nav.breadcrumbs("my-books/vol 1");
        assert!(html.contains("<a href=\"/books/my-books\">My Books</a>"));
        assert!(html.contains("<a href=\"/books/my-books/vol%201\">Vol 1</a>"));
    }

    #[test]
    fn test_listing_links_directories_then_documents() {
        let listing = DirectoryListing {
            logical_path: "fantasy".to_string(),
            entries: vec![
                ListingEntry { name: "Vol1".to_string(), logical_path: "fantasy/vol1".to_string(), is_dir: true },
                ListingEntry { name: "Intro".to_string(), logical_path: "fantasy/intro".to_string(), is_dir: false },
            ],
        };
        let nav = NavigationComponent::new(FileService::new(PathBuf::from("books")));
        let html = nav.listing_html(&listing);
        let vol = html.find("href=\"/books/fantasy/vol1\"").unwrap();
        let intro = html.find("href=\"/books/fantasy/intro\"").unwrap();
        assert!(vol < intro);
    }

    #[test]
    fn test_sitemap_html() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("night-songs")).unwrap();
        fs::write(tmp.path().join("night-songs/moon-river.md"), "moon").unwrap();
        fs::write(tmp.path().join("night-songs/readme.md"), "index").unwrap();
        let nav = NavigationComponent::new(FileService::new(tmp.path().to_path_buf()));
        let html = nav.sitemap_html().unwrap();
        assert!(html.contains(">Night Songs</a></h2>"));
        assert!(html.contains("<a href=\"/books/night-songs/moon-river\">Moon River</a>"));
        assert!(!html.contains("Readme"));
    }
}
