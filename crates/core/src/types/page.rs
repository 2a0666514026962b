//! Server-side pagination.

use serde::{Deserialize, Serialize};

/// Page request sent to list endpoints (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            page_size,
        }
    }

    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }
}

/// One page of results plus the totals needed to render pagers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u32,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total_count: u32, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page: request.page,
            page_size: request.page_size,
        }
    }

    #[must_use]
    pub const fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// 1-based index of the first item on this page, 0 when empty.
    #[must_use]
    pub const fn first_index(&self) -> u32 {
        if self.total_count == 0 {
            0
        } else {
            self.page.saturating_sub(1) * self.page_size + 1
        }
    }

    /// 1-based index of the last item on this page.
    #[must_use]
    pub const fn last_index(&self) -> u32 {
        let end = self.page * self.page_size;
        if end < self.total_count {
            end
        } else {
            self.total_count
        }
    }
}

/// Number of pages needed for `total` items.
#[must_use]
pub const fn total_pages(total: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page::new(vec![1, 2, 3], 23, PageRequest::new(3, 10));
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!(page.first_index(), 21);
        assert_eq!(page.last_index(), 23);
    }

    #[test]
    fn test_page_zero_is_clamped() {
        assert_eq!(PageRequest::new(0, 10).page, 1);
    }

    #[test]
    fn test_empty_page_indices() {
        let page: Page<u8> = Page::empty(PageRequest::first(10));
        assert_eq!(page.first_index(), 0);
        assert_eq!(page.last_index(), 0);
        assert!(!page.has_next());
    }
}
