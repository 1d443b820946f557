//! Page-number pagination for list endpoints.

use super::{ServiceError, ServiceResult};
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which page a client asked for: `?page=3` or `?page=last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    Number(u32),
    Last,
}

impl Default for PageSelector {
    fn default() -> Self {
        PageSelector::Number(1)
    }
}

impl FromStr for PageSelector {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "last" {
            return Ok(PageSelector::Last);
        }
        match raw.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(PageSelector::Number(n)),
            _ => Err(ServiceError::InvalidPage),
        }
    }
}

/// One page of results plus the bookkeeping needed to link neighbours.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of rows across all pages.
    pub count: i64,
    /// 1-based number of this page.
    pub number: u32,
    pub num_pages: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Resolved position of a page inside a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub limit: i64,
    pub offset: i64,
}

/// Map a selector onto LIMIT/OFFSET for `count` rows.
///
/// An empty result set still has one (empty) page.
pub fn window(selector: PageSelector, count: i64, page_size: u32) -> ServiceResult<PageWindow> {
    let page_size = page_size.max(1);
    let count = count.max(0) as u64;
    let num_pages = count.div_ceil(u64::from(page_size)).max(1);
    let num_pages = u32::try_from(num_pages).map_err(|_| ServiceError::InvalidPage)?;

    let number = match selector {
        PageSelector::Last => num_pages,
        PageSelector::Number(n) if n >= 1 && n <= num_pages => n,
        PageSelector::Number(_) => return Err(ServiceError::InvalidPage),
    };

    Ok(PageWindow {
        number,
        num_pages,
        limit: i64::from(page_size),
        offset: i64::from(number - 1) * i64::from(page_size),
    })
}
