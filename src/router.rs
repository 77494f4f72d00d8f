use axum::{
    Router, middleware,
    routing::get,
};

use crate::handlers::{
    handle_book, handle_info, handle_login, handle_login_form, handle_not_found, handle_root,
    handle_search, handle_sitemap, handle_static, require_access,
};
use crate::types::AppState;

/// Create the HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handle_root))
        .route("/books/*path", get(handle_book))
        .route("/sitemap", get(handle_sitemap))
        .route("/search", get(handle_search))
        .route("/info", get(handle_info))
        .route("/static/*path", get(handle_static));

    if state.access.is_some() {
        router = router
            .route("/login", get(handle_login_form).post(handle_login))
            .layer(middleware::from_fn_with_state(state.clone(), require_access));
    }

    router.fallback(handle_not_found).with_state(state)
}
