/// Page arithmetic for list views
///
/// Out-of-range requests never fail: pages below 1 land on the first page,
/// pages past the end land on the last one, and an empty list still has one
/// (empty) page.

use serde::{Deserialize, Serialize};

/// Items per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Number of page links shown around the current page
pub const PAGE_WINDOW: i64 = 8;

/// Requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageNumber {
    Number(i64),
    Last,
}

impl Default for PageNumber {
    fn default() -> Self {
        PageNumber::Number(1)
    }
}

impl PageNumber {
    /// Parses a `page` query value; `last` selects the final page and
    /// anything unparseable selects the first
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("last") => PageNumber::Last,
            Some(value) => value.parse().map(PageNumber::Number).unwrap_or_default(),
            None => PageNumber::default(),
        }
    }
}

/// Pagination metadata returned next to every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub previous_page: Option<i64>,
    pub next_page: Option<i64>,
    /// Up to eight page numbers around the current page
    pub page_range: Vec<i64>,
}

impl PageMeta {
    pub fn new(requested: PageNumber, per_page: i64, total_items: i64) -> Self {
        let per_page = per_page.max(1);
        let total_items = total_items.max(0);
        let total_pages = ((total_items + per_page - 1) / per_page).max(1);

        let page = match requested {
            PageNumber::Number(n) => n.clamp(1, total_pages),
            PageNumber::Last => total_pages,
        };

        Self {
            page,
            per_page,
            total_items,
            total_pages,
            previous_page: (page > 1).then(|| page - 1),
            next_page: (page < total_pages).then(|| page + 1),
            page_range: page_window(page, total_pages),
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn has_other_pages(&self) -> bool {
        self.total_pages > 1
    }
}

/// Pages `[page - 4, page + 3]`, shifted to stay inside `[1, total_pages]`
pub fn page_window(page: i64, total_pages: i64) -> Vec<i64> {
    let half = PAGE_WINDOW / 2;
    let start = (page - half).min(total_pages - PAGE_WINDOW + 1).max(1);
    let end = (start + PAGE_WINDOW - 1).min(total_pages);
    (start..=end).collect()
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_number() {
        assert_eq!(PageNumber::parse(None), PageNumber::Number(1));
        assert_eq!(PageNumber::parse(Some("3")), PageNumber::Number(3));
        assert_eq!(PageNumber::parse(Some("last")), PageNumber::Last);
        assert_eq!(PageNumber::parse(Some("abc")), PageNumber::Number(1));
        assert_eq!(PageNumber::parse(Some("-2")), PageNumber::Number(-2));
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let meta = PageMeta::new(PageNumber::Number(5), 10, 0);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.total_pages, 1);
        assert_eq!(meta.page_range, vec![1]);
        assert_eq!(meta.offset(), 0);
        assert!(meta.previous_page.is_none() && meta.next_page.is_none());
        assert!(!meta.has_other_pages());
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let meta = PageMeta::new(PageNumber::Number(0), 10, 50);
        assert_eq!(meta.page, 1);

        let meta = PageMeta::new(PageNumber::Number(99), 10, 50);
        assert_eq!(meta.page, 5);
        assert_eq!(meta.offset(), 40);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.previous_page, Some(4));

        let meta = PageMeta::new(PageNumber::Last, 10, 51);
        assert_eq!(meta.page, 6);
        assert_eq!(meta.total_pages, 6);
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(1, 20), (1..=8).collect::<Vec<_>>());
        assert_eq!(page_window(10, 20), (6..=13).collect::<Vec<_>>());
        assert_eq!(page_window(20, 20), (13..=20).collect::<Vec<_>>());
        assert_eq!(page_window(3, 20), (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_keeps_meta() {
        let page = Page {
            items: vec![1, 2, 3],
            meta: PageMeta::new(PageNumber::Number(1), 10, 3),
        };
        let page = page.map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.meta.total_items, 3);
    }
}
