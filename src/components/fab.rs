use log::debug;

use crate::utils::{document_url, escape_attr, escape_html};

/// Floating toolbar shown on every page: home, sitemap, search and
/// page-specific actions.
pub struct FabComponent;

impl FabComponent {
    pub fn new() -> Self {
        Self
    }

    /// Actions for a page at `logical_path`; empty for pages outside the tree
    pub fn generate_actions(&self, logical_path: &str) -> Vec<FabAction> {
        let mut actions = Vec::new();
        if logical_path.is_empty() {
            return actions;
        }

        let href = match logical_path.rsplit_once('/') {
            Some((parent, _)) => document_url(parent),
            None => "/".to_string(),
        };
        actions.push(FabAction {
            href,
            title: "Up one level".to_string(),
            class: "fab-action-up".to_string(),
            label: "⬑ Up".to_string(),
        });

        debug!("Generated {} toolbar actions for '{}'", actions.len(), logical_path);
        actions
    }

    /// Generate complete toolbar HTML; `query` pre-fills the search box
    pub fn generate_fab_html(&self, actions: &[FabAction], query: &str) -> String {
        let mut html = String::from("<div class=\"fab\" id=\"fab\"><div class=\"fab-menu\">");
        html.push_str("<a href=\"/\" class=\"fab-item\" title=\"Home\">Home</a>");
        html.push_str("<a href=\"/sitemap\" class=\"fab-item\" title=\"Sitemap\">Sitemap</a>");

        html.push_str("<form class=\"fab-search\" action=\"/search\" method=\"get\">");
        html.push_str(&format!(
            "<input type=\"search\" name=\"q\" placeholder=\"Search...\" value=\"{}\">",
            escape_attr(query)
        ));
        html.push_str("</form>");

        if !actions.is_empty() {
            html.push_str("<div class=\"fab-actions\">");
            for action in actions {
                html.push_str(&format!(
                    "<a href=\"{}\" title=\"{}\" class=\"{}\">{}</a>",
                    escape_attr(&action.href),
                    escape_attr(&action.title),
                    escape_attr(&action.class),
                    escape_html(&action.label)
                ));
            }
            html.push_str("</div>");
        }

        html.push_str("</div></div>");
        html
    }
}

impl Default for FabComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents a toolbar action button
pub struct FabAction {
    pub href: String,
    pub title: String,
    pub class: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_action_targets_parent() {
        let fab = FabComponent::new();
        let actions = fab.generate_actions("books/fantasy/vol1");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].href, "/books/books/fantasy");

        let top = fab.generate_actions("poetry");
        assert_eq!(top[0].href, "/");
        assert!(fab.generate_actions("").is_empty());
    }

    #[test]
    fn test_query_is_escaped() {
        let html = FabComponent::new().generate_fab_html(&[], "\"><script>");
        assert!(!html.contains("\"><script>"));
        assert!(html.contains("action=\"/search\""));
    }
}
