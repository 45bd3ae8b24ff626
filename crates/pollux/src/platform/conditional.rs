//! Shared types for conditional HTTP fetching.
//!
//! Platform clients send `If-None-Match` with the ETag from their previous
//! response; a 304 means nothing changed since then.

/// Pagination information from an API response.
///
/// - GitHub: Link header with `rel="next"` and `rel="last"` links
/// - GitLab: `x-page` / `x-total-pages` headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// Total number of pages (if known).
    pub total_pages: Option<u32>,
    /// Next page number (if there are more pages).
    pub next_page: Option<u32>,
}

impl PaginationInfo {
    /// Build pagination info from GitLab's `x-page` and `x-total-pages` headers.
    pub fn from_page_headers(page: Option<&str>, total_pages: Option<&str>) -> Self {
        let page = page.and_then(|p| p.trim().parse::<u32>().ok());
        let total_pages = total_pages.and_then(|p| p.trim().parse::<u32>().ok());
        let next_page = match (page, total_pages) {
            (Some(page), Some(total)) if page < total => Some(page + 1),
            _ => None,
        };
        Self {
            total_pages,
            next_page,
        }
    }
}

/// Result of a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult<T> {
    /// Server returned 304 Not Modified: nothing changed since the last fetch.
    NotModified,
    /// Server returned data with an optional ETag for the next request.
    Fetched {
        /// The fetched data.
        data: T,
        /// ETag for caching (if provided by server).
        etag: Option<String>,
    },
}

impl<T> FetchResult<T> {
    /// Returns true if the result indicates no changes.
    #[inline]
    pub fn is_not_modified(&self) -> bool {
        matches!(self, FetchResult::NotModified)
    }

    /// Extract data if fetched, returning None if not modified.
    pub fn into_data(self) -> Option<T> {
        match self {
            FetchResult::NotModified => None,
            FetchResult::Fetched { data, .. } => Some(data),
        }
    }

    /// Get ETag if fetched, None otherwise.
    pub fn etag(&self) -> Option<&str> {
        match self {
            FetchResult::NotModified => None,
            FetchResult::Fetched { etag, .. } => etag.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_info_default() {
        let info = PaginationInfo::default();
        assert_eq!(info.total_pages, None);
        assert_eq!(info.next_page, None);
    }

    #[test]
    fn test_pagination_info_from_page_headers() {
        let info = PaginationInfo::from_page_headers(Some("1"), Some("3"));
        assert_eq!(info.total_pages, Some(3));
        assert_eq!(info.next_page, Some(2));

        let last = PaginationInfo::from_page_headers(Some("3"), Some("3"));
        assert_eq!(last.next_page, None);

        let missing = PaginationInfo::from_page_headers(None, Some("3"));
        assert_eq!(missing.next_page, None);

        let garbage = PaginationInfo::from_page_headers(Some("x"), Some("-1"));
        assert_eq!(garbage, PaginationInfo::default());
    }

    #[test]
    fn test_fetch_result_not_modified() {
        let result: FetchResult<String> = FetchResult::NotModified;
        assert!(result.is_not_modified());
        assert!(result.etag().is_none());
        assert!(result.into_data().is_none());
    }

    #[test]
    fn test_fetch_result_fetched_exposes_etag() {
        let result = FetchResult::Fetched {
            data: vec![1, 2, 3],
            etag: Some("abc123".to_string()),
        };
        assert!(!result.is_not_modified());
        assert_eq!(result.etag(), Some("abc123"));
        assert_eq!(result.into_data(), Some(vec![1, 2, 3]));
    }
}
