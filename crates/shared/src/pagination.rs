//! Offset-based pagination utilities.
//!
//! The list payload mirrors the shape produced by mongoose-paginate, which is
//! what the admin screens consume.

use serde::Serialize;

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u32,
    pub page: u32,
    pub total_pages: u32,
    /// 1-based position of the first doc of this page within the full result.
    pub paging_counter: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl<T> Paginated<T> {
    /// Builds the page metadata for `docs`, the `page`-th slice of size `limit`
    /// out of `total_docs` matching records.
    pub fn new(docs: Vec<T>, total_docs: u64, page: u32, limit: u32) -> Self {
        let page = page.max(1);
        let total_pages = total_pages(total_docs, limit);
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            paging_counter: page_offset(page, limit) + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }

    /// Converts every doc while keeping the metadata intact.
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            paging_counter: self.paging_counter,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        }
    }
}

/// Number of records to skip for a 1-based `page` of size `limit`.
pub fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}

/// Number of pages needed to hold `total` records, at least 1.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(limit)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_first_page() {
        assert_eq!(page_offset(1, 30), 0);
    }

    #[test]
    fn test_page_offset_later_pages() {
        assert_eq!(page_offset(2, 30), 30);
        assert_eq!(page_offset(5, 10), 40);
    }

    #[test]
    fn test_page_offset_zero_page_is_treated_as_first() {
        assert_eq!(page_offset(0, 50), 0);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 50), 1);
        assert_eq!(total_pages(50, 50), 1);
        assert_eq!(total_pages(51, 50), 2);
        assert_eq!(total_pages(120, 50), 3);
    }

    #[test]
    fn test_total_pages_zero_limit() {
        assert_eq!(total_pages(10, 0), 1);
    }

    #[test]
    fn test_paginated_middle_page() {
        let page = Paginated::new(vec![1, 2, 3], 130, 2, 50);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.paging_counter, 51);
        assert!(page.has_prev_page);
        assert!(page.has_next_page);
        assert_eq!(page.prev_page, Some(1));
        assert_eq!(page.next_page, Some(3));
    }

    #[test]
    fn test_paginated_single_page() {
        let page = Paginated::new(vec!["a"], 1, 1, 50);
        assert!(!page.has_prev_page);
        assert!(!page.has_next_page);
        assert_eq!(page.prev_page, None);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_paginated_map_keeps_metadata() {
        let page = Paginated::new(vec![1, 2], 2, 1, 50).map(|n| n * 10);
        assert_eq!(page.docs, vec![10, 20]);
        assert_eq!(page.total_docs, 2);
        assert_eq!(page.limit, 50);
    }

    #[test]
    fn test_paginated_serializes_camel_case() {
        let page = Paginated::new(vec![1], 1, 1, 50);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalDocs"], 1);
        assert_eq!(json["hasNextPage"], false);
        assert!(json["nextPage"].is_null());
        assert_eq!(json["pagingCounter"], 1);
    }
}
