pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{documents, forms, grants, matching, tokenizer};

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/analyzegrant",
            post(grants::handlers::handle_analyze_grant),
        )
        .route(
            "/api/processdocument",
            post(documents::handlers::handle_process_document),
        )
        .route(
            "/api/getmatches",
            get(matching::handlers::handle_get_matches),
        )
        .route(
            "/api/fillgrantform",
            post(forms::handlers::handle_fill_grant_form),
        )
        .route(
            "/api/tokenizerfunction",
            get(tokenizer::handlers::handle_tokenizer_info)
                .post(tokenizer::handlers::handle_tokenize)
                .fallback(tokenizer::handlers::handle_unsupported_method),
        )
        // base64 PDFs exceed axum's 2 MB default
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
