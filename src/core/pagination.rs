//! Page requests and paginated responses for list operations.

use crate::config::LedgerConfig;
use sea_orm::ItemsAndPagesNumber;

/// A 1-based page request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// Page number, starting at 1
    pub number: u64,
    /// Items per page
    pub per_page: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            per_page: 10,
        }
    }
}

impl Page {
    /// Builds a page request. Page 0 is treated as page 1 and `per_page` is at least 1.
    #[must_use]
    pub fn new(number: u64, per_page: u64) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Builds a page request from optional caller input using the configured sizes.
    #[must_use]
    pub fn from_request(number: Option<u64>, per_page: Option<u64>, config: &LedgerConfig) -> Self {
        let per_page = per_page
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);
        Self::new(number.unwrap_or(1), per_page)
    }

    /// Zero-based page index as used by the `SeaORM` paginator.
    #[must_use]
    pub const fn index(self) -> u64 {
        self.number.saturating_sub(1)
    }
}

/// One page of results plus the totals needed to render page navigation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// The page that was requested
    pub page: Page,
    /// Total matching items across all pages
    pub total_items: u64,
    /// Total number of pages
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Wraps fetched items with the paginator's totals.
    #[must_use]
    pub const fn new(items: Vec<T>, page: Page, totals: ItemsAndPagesNumber) -> Self {
        Self {
            items,
            page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        }
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page.number < self.total_pages
    }

    /// Converts every item, keeping the page metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_normalization() {
        assert_eq!(Page::new(0, 0), Page::new(1, 1));
        assert_eq!(Page::new(3, 20).index(), 2);
    }

    #[test]
    fn test_page_from_request_clamps_to_config() {
        let config = LedgerConfig::default();
        assert_eq!(Page::from_request(None, None, &config), Page::new(1, 10));
        assert_eq!(
            Page::from_request(Some(2), Some(500), &config),
            Page::new(2, config.max_page_size)
        );
    }

    #[test]
    fn test_has_next_and_map() {
        let page = Paginated::new(
            vec![1, 2],
            Page::new(1, 2),
            ItemsAndPagesNumber {
                number_of_items: 3,
                number_of_pages: 2,
            },
        );
        assert!(page.has_next());
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4]);
        assert_eq!(doubled.total_items, 3);
    }
}
