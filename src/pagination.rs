//! Pagination utilities for `startAt`/`maxResults` responses.

use serde::{Deserialize, Serialize};

/// A page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Index of the first item on this page.
    pub start_at: u64,
    /// Page size that was requested.
    pub max_results: u64,
    /// Total number of items across all pages (if known).
    pub total: Option<u64>,
    /// Whether there are more pages.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    #[must_use]
    pub fn new(items: Vec<T>, start_at: u64, max_results: u64, total: Option<u64>) -> Self {
        let has_more = match total {
            Some(t) => start_at + (items.len() as u64) < t,
            None => max_results > 0 && items.len() as u64 >= max_results,
        };
        Self {
            items,
            start_at,
            max_results,
            total,
            has_more,
        }
    }

    /// Offset of the page after this one.
    #[must_use]
    pub fn next_start(&self) -> u64 {
        self.start_at + self.items.len() as u64
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            start_at: self.start_at,
            max_results: self.max_results,
            total: self.total,
            has_more: self.has_more,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Query parameters for paginated requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Index of the first item to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u64>,
    /// Maximum number of items to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u64>,
}

impl PaginationParams {
    /// Pagination params for a specific window.
    #[must_use]
    pub fn window(start_at: u64, max_results: u64) -> Self {
        Self {
            start_at: Some(start_at),
            max_results: Some(max_results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_more_with_total() {
        // First 50 of 120
        let page: Page<i32> = Page::new(vec![1; 50], 0, 50, Some(120));
        assert!(page.has_more);
        assert_eq!(page.next_start(), 50);

        // Last 20 of 120
        let page: Page<i32> = Page::new(vec![1; 20], 100, 50, Some(120));
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_has_more_without_total() {
        // Full page suggests more
        let page: Page<i32> = Page::new(vec![1; 50], 0, 50, None);
        assert!(page.has_more);

        // Partial page means no more
        let page: Page<i32> = Page::new(vec![1; 10], 0, 50, None);
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 0, 50, Some(3));
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert!(!mapped.has_more);
    }
}
