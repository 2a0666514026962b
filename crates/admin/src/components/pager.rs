//! Previous/next links for server-paged lists.

use segishop_core::types::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    /// "Showing 11-20 of 43", or "No results".
    pub summary: String,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Pager {
    /// `link` builds the URL of a given page number.
    #[must_use]
    pub fn new<T>(page: &Page<T>, link: impl Fn(u32) -> String) -> Self {
        let summary = if page.total_count == 0 {
            "No results".to_string()
        } else {
            format!(
                "Showing {}-{} of {}",
                page.first_index(),
                page.last_index(),
                page.total_count
            )
        };
        Self {
            summary,
            previous: page.has_previous().then(|| link(page.page - 1)),
            next: page.has_next().then(|| link(page.page + 1)),
        }
    }

    #[must_use]
    pub const fn is_single_page(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use segishop_core::types::PageRequest;

    #[test]
    fn test_middle_page_links_both_ways() {
        let page = Page::new(vec![0u8; 10], 43, PageRequest::new(2, 10));
        let pager = Pager::new(&page, |p| format!("/products?page={p}"));
        assert_eq!(pager.summary, "Showing 11-20 of 43");
        assert_eq!(pager.previous.as_deref(), Some("/products?page=1"));
        assert_eq!(pager.next.as_deref(), Some("/products?page=3"));
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::empty(PageRequest::first(10));
        let pager = Pager::new(&page, |p| p.to_string());
        assert_eq!(pager.summary, "No results");
        assert!(pager.is_single_page());
    }
}
