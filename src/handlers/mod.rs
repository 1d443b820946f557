//! HTTP handlers. Shared extractors and response shapes live here.

pub mod health_handlers;
pub mod task_handlers;
pub mod user_handlers;

use crate::{
    errors::AppError,
    services::pagination::{Page, PageSelector},
};
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, header},
};
use serde::{Deserialize, Serialize};

/// `axum::Json` whose rejections become 400 responses in the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with the same rejection handling as `ApiJson`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Query string for paginated list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn selector(&self) -> Result<PageSelector, AppError> {
        match self.page.as_deref() {
            None | Some("") => Ok(PageSelector::default()),
            Some(raw) => Ok(raw.parse()?),
        }
    }
}

/// Paginated list body: `{count, next, previous, results}`.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PageResponse<T> {
    /// Build the body for `page`, linking neighbours from `url`.
    pub fn from_page(page: Page<T>, url: &str) -> Self {
        let next = page
            .has_next()
            .then(|| format!("{}?page={}", url, page.number + 1));
        let previous = page.has_previous().then(|| match page.number - 1 {
            1 => url.to_string(),
            n => format!("{}?page={}", url, n),
        });

        Self {
            count: page.count,
            next,
            previous,
            results: page.items,
        }
    }
}

/// Absolute URL of `path` on the host the request was sent to.
///
/// Falls back to the bare path when the request carries no usable `Host`.
pub fn page_url(headers: &HeaderMap, path: &str) -> String {
    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(|host| format!("http://{}{}", host, path))
        .unwrap_or_else(|| path.to_string())
}

/// Parse a path id; non-integer ids are reported as `not_found`.
pub fn parse_id(raw: &str, not_found: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::not_found(not_found))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, num_pages: u32) -> Page<u8> {
        Page {
            items: vec![],
            count: 30,
            number,
            num_pages,
        }
    }

    #[test]
    fn first_page_links_only_forward() {
        let body = PageResponse::from_page(page(1, 3), "/api/tasks/");
        assert_eq!(body.next.as_deref(), Some("/api/tasks/?page=2"));
        assert_eq!(body.previous, None);
    }

    #[test]
    fn second_page_links_back_without_page_param() {
        let body = PageResponse::from_page(page(2, 3), "/api/tasks/");
        assert_eq!(body.next.as_deref(), Some("/api/tasks/?page=3"));
        assert_eq!(body.previous.as_deref(), Some("/api/tasks/"));
    }

    #[test]
    fn last_page_links_only_back() {
        let body = PageResponse::from_page(page(3, 3), "/api/tasks/");
        assert_eq!(body.next, None);
        assert_eq!(body.previous.as_deref(), Some("/api/tasks/?page=2"));
    }

    #[test]
    fn links_use_the_request_host() {
        let mut headers = HeaderMap::new();
        assert_eq!(page_url(&headers, "/api/users/"), "/api/users/");

        headers.insert(header::HOST, "testserver:8000".parse().unwrap());
        let url = page_url(&headers, "/api/users/");
        assert_eq!(url, "http://testserver:8000/api/users/");

        let body = PageResponse::from_page(page(2, 3), &url);
        assert_eq!(
            body.next.as_deref(),
            Some("http://testserver:8000/api/users/?page=3")
        );
        assert_eq!(
            body.previous.as_deref(),
            Some("http://testserver:8000/api/users/")
        );
    }

    #[test]
    fn non_numeric_ids_are_not_found() {
        let err = parse_id("abc", "Task not found").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
        assert_eq!(parse_id("42", "Task not found").unwrap(), 42);
    }
}
