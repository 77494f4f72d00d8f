use std::io;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use log::error;
use thiserror::Error;

/// Error types for the library server
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("not found")]
    NotFound,

    #[error("invalid path")]
    InvalidPath,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("document is not valid UTF-8: {path}")]
    Decode { path: String },

    #[error("template error: {0}")]
    Template(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),
}

impl LibraryError {
    /// Unknown and malformed paths are indistinguishable to clients.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::NotFound | LibraryError::InvalidPath)
    }

    pub fn status(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_not_found() {
            return (status, Html(error_page("404", "Page Not Found", "The requested page could not be found."))).into_response();
        }

        // Details stay in the log, never in the page.
        error!("Request failed: {}", self);
        (
            status,
            Html(error_page("500", "Something Went Wrong", "The page could not be displayed.")),
        )
            .into_response()
    }
}

fn error_page(code: &str, title: &str, message: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{code} - {title}</title>
    <link rel="stylesheet" href="/static/css/bookshelf.css">
</head>
<body>
    <div class="error-page">
        <div class="error-icon">{code}</div>
        <h1 class="error-title">{title}</h1>
        <p class="error-message">{message}</p>
        <p class="error-actions"><a href="/">Go Home</a> · <a href="/sitemap">Sitemap</a></p>
    </div>
</body>
</html>"#
    )
}
