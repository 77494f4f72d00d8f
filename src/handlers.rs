use std::path::Path;

use axum::{
    Form,
    body::Body,
    extract::{Path as AxumPath, Query, Request, State},
    http::{HeaderValue, Response, StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Redirect},
};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::components::{FabComponent, NavigationComponent, TemplateComponent};
use crate::errors::LibraryError;
use crate::services::{FileService, MarkdownService, SearchService};
use crate::types::{AppState, Resolution, SearchResult};
use crate::utils::{display_title, escape_attr, escape_html, last_modified_html, truncate_chars};

/// Longest query the search handler will run
const MAX_QUERY_CHARS: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// Wrap page content in the site shell with the toolbar
fn render_page(
    state: &AppState,
    title: &str,
    content: &str,
    logical_path: &str,
    query: &str,
) -> Result<Html<String>, LibraryError> {
    let fab = FabComponent::new();
    let actions = fab.generate_actions(logical_path);
    let fab_html = fab.generate_fab_html(&actions, query);
    let templates = TemplateComponent::new(&state.templates_dir);
    let page = templates.render_page(&state.site_title, content, &fab_html, title)?;
    Ok(Html(page))
}

/// Handle root path requests
pub async fn handle_root(State(state): State<AppState>) -> Result<impl IntoResponse, LibraryError> {
    let file_service = FileService::new(state.base_dir.as_ref().clone());
    let navigation = NavigationComponent::new(file_service);
    let body = navigation.home_html(&state.site_title)?;
    render_page(&state, &state.site_title, &body, "", "")
}

/// Handle `/books/*path`: a document, a folder listing, or a file the books link to
pub async fn handle_book(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<Response<Body>, LibraryError> {
    info!("Book request received: '{}'", path);
    let file_service = FileService::new(state.base_dir.as_ref().clone());
    let navigation = NavigationComponent::new(file_service.clone());

    match file_service.resolve(&path)? {
        Resolution::Document(target) => {
            let rendered = MarkdownService::new().render(&file_service, &target)?;
            let body = format!(
                "{}{}<div class=\"markdown-body\">{}</div>",
                navigation.breadcrumbs(&target.logical_path),
                last_modified_html(&target.file),
                rendered.html
            );
            info!("Serving document '{}'", target.logical_path);
            Ok(render_page(&state, &rendered.title, &body, &target.logical_path, "")?.into_response())
        }
        Resolution::Listing(listing) => {
            let body = navigation.listing_html(&listing);
            let title = display_title(&listing.logical_path);
            info!("Serving directory listing for '{}'", listing.logical_path);
            Ok(render_page(&state, &title, &body, &listing.logical_path, "")?.into_response())
        }
        Resolution::NotFound => match file_service.asset(&path) {
            Some(asset) => {
                debug!("Serving book asset {:?}", asset);
                serve_file(&file_service, &asset)
            }
            None => {
                warn!("Path not found: '{}'", path);
                Err(LibraryError::NotFound)
            }
        },
    }
}

fn serve_file(file_service: &FileService, path: &Path) -> Result<Response<Body>, LibraryError> {
    let bytes = std::fs::read(path)?;
    let content_type = file_service.content_type_for(path);
    let mut resp = Response::new(Body::from(bytes));
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Ok(resp)
}

/// Handle sitemap requests
pub async fn handle_sitemap(State(state): State<AppState>) -> Result<impl IntoResponse, LibraryError> {
    let navigation = NavigationComponent::new(FileService::new(state.base_dir.as_ref().clone()));
    let body = navigation.sitemap_html()?;
    render_page(&state, "Sitemap", &body, "", "")
}

/// Handle search requests
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, LibraryError> {
    let trimmed = params.q.trim();
    let query = truncate_chars(trimmed, MAX_QUERY_CHARS);
    if query.len() < trimmed.len() {
        warn!("Very long search query received ({} chars), truncating", trimmed.chars().count());
    }
    info!("Search request received for query: '{}'", query);

    let start_time = std::time::Instant::now();
    let search_service = SearchService::new(FileService::new(state.base_dir.as_ref().clone()));
    let results = search_service.search(query)?;
    let body = render_search_results(query, &results);
    let page = render_page(&state, "Search Results", &body, "", query)?;

    info!("Search request completed in {}ms", start_time.elapsed().as_millis());
    Ok(page)
}

/// Render search results HTML
fn render_search_results(query: &str, results: &[SearchResult]) -> String {
    let mut content = String::from("<div class=\"search-results\">");

    if query.is_empty() {
        content.push_str("<p class=\"no-query\">Enter a search query to find content.</p></div>");
        return content;
    }

    content.push_str(&format!(
        "<h1 class=\"search-header\">Search Results for \"{}\"</h1>",
        escape_html(query)
    ));
    content.push_str(&format!(
        "<p class=\"results-count\">Found {} result{}</p>",
        results.len(),
        if results.len() == 1 { "" } else { "s" }
    ));

    if results.is_empty() {
        content.push_str("<p class=\"no-results\">No results found for your search.</p>");
    } else {
        content.push_str("<ol class=\"search-results-list\">");
        for result in results {
            content.push_str("<li class=\"search-result-item\">");
            content.push_str(&format!(
                "<h3 class=\"result-title\"><a href=\"{}\">{}</a></h3>",
                escape_attr(&result.url),
                escape_html(&display_title(&result.volume))
            ));
            content.push_str(&format!(
                "<p class=\"result-book\">{} · <code>{}</code></p>",
                escape_html(&display_title(&result.book)),
                escape_html(&result.path)
            ));
            content.push_str(&format!(
                "<p class=\"result-excerpt\">{}</p>",
                escape_html(&result.snippet)
            ));
            content.push_str("</li>");
        }
        content.push_str("</ol>");
    }

    content.push_str("</div>");
    content
}

/// Runtime information page
pub async fn handle_info(State(state): State<AppState>) -> Result<impl IntoResponse, LibraryError> {
    let executable = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let rows = [
        ("Package", env!("CARGO_PKG_NAME").to_string()),
        ("Version", env!("CARGO_PKG_VERSION").to_string()),
        ("Platform", format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH)),
        ("Executable", executable),
        ("Access gate", if state.access.is_some() { "enabled" } else { "disabled" }.to_string()),
    ];

    let mut body = String::from("<h1>Server Info</h1><table class=\"info\"><tr><th>Item</th><th>Value</th></tr>");
    for (item, value) in rows {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(item),
            escape_html(&value)
        ));
    }
    body.push_str("</table>");
    render_page(&state, "Server Info", &body, "", "")
}

fn login_body(error: Option<&str>) -> String {
    let mut body = String::from("<section class=\"login\"><h1>Enter Password</h1>");
    if let Some(error) = error {
        body.push_str(&format!("<p class=\"login-error\">{}</p>", escape_html(error)));
    }
    body.push_str(
        "<form method=\"post\" action=\"/login\"><input type=\"password\" name=\"password\" autofocus><button type=\"submit\">Enter</button></form></section>",
    );
    body
}

/// Show the password form
pub async fn handle_login_form(State(state): State<AppState>) -> Result<impl IntoResponse, LibraryError> {
    render_page(&state, "Login", &login_body(None), "", "")
}

/// Check the submitted password and hand out the access cookie
pub async fn handle_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response<Body>, LibraryError> {
    let Some(access) = state.access.as_ref() else {
        return Ok(Redirect::to("/").into_response());
    };

    if access.check_password(&form.password) {
        info!("Access granted");
        let cookie = access.set_cookie_header();
        return Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response());
    }

    warn!("Rejected login attempt");
    let page = render_page(&state, "Login", &login_body(Some("Incorrect password.")), "", "")?;
    Ok((StatusCode::UNAUTHORIZED, page).into_response())
}

/// Redirect to the login form unless the request carries a valid access cookie
pub async fn require_access(State(state): State<AppState>, request: Request, next: Next) -> Response<Body> {
    let Some(access) = state.access.as_ref() else {
        return next.run(request).await;
    };

    let path = request.uri().path().to_string();
    if path == "/login" || path.starts_with("/static/") {
        return next.run(request).await;
    }

    let authorized = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| access.verify_cookie_header(value));
    if authorized {
        return next.run(request).await;
    }

    debug!("Unauthenticated request for '{}', redirecting to login", path);
    Redirect::to("/login").into_response()
}

/// Handle static file requests
pub async fn handle_static(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<Response<Body>, LibraryError> {
    let file_service = FileService::new(state.static_dir.as_ref().clone());
    match file_service.asset(&path) {
        Some(asset) => serve_file(&file_service, &asset),
        None => Err(LibraryError::NotFound),
    }
}

/// Anything no route matched
pub async fn handle_not_found() -> LibraryError {
    LibraryError::NotFound
}
