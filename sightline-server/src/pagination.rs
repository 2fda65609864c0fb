//! Pagination utilities for list endpoints

use serde::Deserialize;

/// Page size used when the client does not ask for one
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page a client may request
pub const MAX_LIMIT: i64 = 100;

/// Raw `?limit=&offset=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Sanitized LIMIT/OFFSET pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Rows per page, within [1, MAX_LIMIT]
    pub limit: i64,
    /// Rows to skip, never negative
    pub offset: i64,
}

impl Page {
    /// Clamp client-supplied values into range
    ///
    /// # Examples
    /// ```
    /// use sightline_server::pagination::{Page, PageParams};
    ///
    /// let p = Page::from_params(PageParams { limit: Some(500), offset: Some(-3) });
    /// assert_eq!(p.limit, 100);
    /// assert_eq!(p.offset, 0);
    /// ```
    pub fn from_params(params: PageParams) -> Self {
        Self {
            limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: params.offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::from_params(PageParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Page::default();
        assert_eq!(p.limit, DEFAULT_LIMIT);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_limit_clamped_high() {
        let p = Page::from_params(PageParams { limit: Some(1000), offset: None });
        assert_eq!(p.limit, MAX_LIMIT);
    }

    #[test]
    fn test_limit_clamped_low() {
        let p = Page::from_params(PageParams { limit: Some(0), offset: None });
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let p = Page::from_params(PageParams { limit: Some(10), offset: Some(-5) });
        assert_eq!(p, Page { limit: 10, offset: 0 });
    }

    #[test]
    fn test_values_in_range_pass_through() {
        let p = Page::from_params(PageParams { limit: Some(25), offset: Some(50) });
        assert_eq!(p, Page { limit: 25, offset: 50 });
    }
}
