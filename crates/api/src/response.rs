//! Response shapes and pagination.

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pantry_common::Config;
use serde::{Deserialize, Serialize};

/// Paginated listing envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: u64,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    /// Wrap a page of results with the unpaged total.
    #[must_use]
    pub const fn new(count: u64, results: Vec<T>) -> Self {
        Self { count, results }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Limit/offset query parameters for list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PageQuery {
    /// Resolve against configured defaults and the hard page-size cap.
    #[must_use]
    pub fn resolve(&self, config: &Config) -> (u64, u64) {
        let limit = self
            .limit
            .unwrap_or(config.pagination.default_page_size)
            .min(config.pagination.max_page_size)
            .max(1);
        (limit, self.offset.unwrap_or(0))
    }
}

/// Convenience alias for extracting [`PageQuery`].
pub type Page = Query<PageQuery>;

/// 201 Created with a JSON body.
pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// 204 No Content.
#[must_use]
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// A plain-text file download response.
#[must_use]
pub fn text_attachment(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
