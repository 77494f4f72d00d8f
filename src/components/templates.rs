use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::LibraryError;
use crate::types::TemplateContext;
use crate::utils::escape_html;

const BASE_TEMPLATE: &str = "base.html";

/// Component for handling HTML template rendering
pub struct TemplateComponent {
    templates_dir: PathBuf,
}

impl TemplateComponent {
    /// Create a new template component
    pub fn new(templates_dir: &Path) -> Self {
        Self { templates_dir: templates_dir.to_path_buf() }
    }

    /// Load and render the main HTML shell template
    pub fn render_shell_template(&self, context: &TemplateContext) -> Result<String, LibraryError> {
        let base_path = self.templates_dir.join(BASE_TEMPLATE);
        let title = escape_html(&context.title);
        let site_title = escape_html(&context.site_title);

        match fs::read_to_string(&base_path) {
            Ok(base) => {
                if !base.contains("{{CONTENT}}") {
                    return Err(LibraryError::Template(format!(
                        "{:?} has no {{{{CONTENT}}}} placeholder",
                        base_path
                    )));
                }
                Ok(fill_placeholders(
                    &base,
                    &[
                        ("{{TITLE}}", title.as_str()),
                        ("{{SITE_TITLE}}", site_title.as_str()),
                        ("{{FAB}}", context.fab.as_str()),
                        ("{{CONTENT}}", context.content.as_str()),
                    ],
                ))
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read template {:?}: {}", base_path, e);
                }
                debug!("Using inline page shell");
                Ok(format!(
                    "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>{} · {}</title><link rel=\"stylesheet\" href=\"/static/css/bookshelf.css\"></head><body><a id=\"top\"></a><header class=\"site-header\"><a href=\"/\">{}</a></header><main class=\"content\"><article class=\"page\">{}</article></main><a class=\"back-to-top\" href=\"#top\" aria-label=\"Back to top\">↑</a>{}</body></html>",
                    title, site_title, site_title, context.content, context.fab
                ))
            }
        }
    }

    /// Generate a complete page around already-rendered content
    pub fn render_page(
        &self,
        site_title: &str,
        content: &str,
        fab: &str,
        title: &str,
    ) -> Result<String, LibraryError> {
        let context = TemplateContext {
            title: title.to_string(),
            site_title: site_title.to_string(),
            content: content.to_string(),
            fab: fab.to_string(),
        };

        self.render_shell_template(&context)
    }
}

/// Fill placeholders in one pass over the template; inserted values are
/// never scanned again.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find("{{") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fallback_shell_escapes_title() {
        let templates = TemplateComponent::new(Path::new("/no/such/templates"));
        let page = templates.render_page("Library", "<p>body</p>", "", "<Night>").unwrap();
        assert!(page.contains("&lt;Night&gt;"));
        assert!(page.contains("<p>body</p>"));
    }

    #[test]
    fn test_base_template_placeholders() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("base.html"),
            "<title>{{TITLE}}</title><h1>{{SITE_TITLE}}</h1>{{FAB}}<main>{{CONTENT}}</main>",
        )
        .unwrap();
        let templates = TemplateComponent::new(tmp.path());
        let page = templates.render_page("Library", "<p>{{FAB}} stays literal</p>", "<nav>fab</nav>", "Night").unwrap();
        assert_eq!(
            page,
            "<title>Night</title><h1>Library</h1><nav>fab</nav><main><p>{{FAB}} stays literal</p></main>"
        );
    }

    #[test]
    fn test_inserted_values_are_not_rescanned() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("base.html"), "{{FAB}}|{{CONTENT}}|{{UNKNOWN}}").unwrap();
        let templates = TemplateComponent::new(tmp.path());
        let page = templates.render_page("L", "<p>body</p>", "value=\"{{CONTENT}}\"", "t").unwrap();
        assert_eq!(page, "value=\"{{CONTENT}}\"|<p>body</p>|{{UNKNOWN}}");
    }

    #[test]
    fn test_template_without_content_placeholder_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("base.html"), "<html></html>").unwrap();
        let templates = TemplateComponent::new(tmp.path());
        assert!(matches!(templates.render_page("L", "c", "", "t"), Err(LibraryError::Template(_))));
    }
}
