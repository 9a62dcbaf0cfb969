//! Page windows over listings
//!
//! Page sizes come from configuration; clients only pick the page. A page
//! past the end is an empty listing, not an error.

use serde::{Deserialize, Serialize};

/// Upper bound on any configured page size
const MAX_PER_PAGE: u32 = 100;

/// A 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Page 0 becomes 1; `per_page` is held to 1..=100.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Last page holding `total` items; 1 when there are none.
pub fn last_page(total: i64, per_page: u32) -> u32 {
    if total <= 0 {
        return 1;
    }
    let per_page = i64::from(per_page.max(1));
    u32::try_from((total - 1) / per_page + 1).unwrap_or(u32::MAX)
}

/// One page of a listing plus where it sits among the others.
///
/// `prev`/`next` are page numbers, absent at either end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, window: Pagination) -> Self {
        let pages = last_page(total, window.per_page);
        Self {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            pages,
            prev: (window.page > 1).then(|| (window.page - 1).min(pages)),
            next: (window.page < pages).then_some(window.page + 1),
        }
    }

    pub fn empty(window: Pagination) -> Self {
        Self::new(Vec::new(), 0, window)
    }

    pub fn total_pages(&self) -> u32 {
        self.pages
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }

    /// Convert items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
            prev: self.prev,
            next: self.next,
        }
    }
}

/// `?page=N` on ordinary listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
}

impl PaginationParams {
    pub fn with_per_page(self, per_page: u32) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), per_page)
    }
}

/// `?page=N` on a post's comments. `page=-1` asks for the last page,
/// where a freshly added comment lands.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CommentPageParams {
    pub page: Option<i64>,
}

impl CommentPageParams {
    pub fn resolve(self, total: i64, per_page: u32) -> Pagination {
        let page = match self.page {
            Some(-1) => last_page(total, per_page),
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };
        Pagination::new(page, per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(page: u32) -> Pagination {
        Pagination::new(page, 10)
    }

    #[test]
    fn offsets_follow_page_size() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 10).offset(), 10);
        assert_eq!(Pagination::new(3, 15).offset(), 30);
        assert_eq!(Pagination::new(3, 15).limit(), 15);
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(1, 0).per_page, 1);
        assert_eq!(Pagination::new(1, 999).per_page, 100);
    }

    #[test]
    fn last_page_arithmetic() {
        assert_eq!(last_page(0, 10), 1);
        assert_eq!(last_page(1, 10), 1);
        assert_eq!(last_page(10, 10), 1);
        assert_eq!(last_page(11, 10), 2);
        assert_eq!(last_page(25, 10), 3);
    }

    #[test]
    fn comment_page_minus_one_is_last() {
        assert_eq!(CommentPageParams { page: Some(-1) }.resolve(21, 10).page, 3);
        assert_eq!(CommentPageParams { page: Some(-1) }.resolve(0, 10).page, 1);
        assert_eq!(CommentPageParams { page: Some(2) }.resolve(21, 10).page, 2);
        assert_eq!(CommentPageParams { page: None }.resolve(21, 10).page, 1);
        assert_eq!(CommentPageParams { page: Some(-7) }.resolve(21, 10).page, 1);
    }

    #[test]
    fn neighbours_in_the_middle() {
        let page: Paginated<()> = Paginated::new(vec![], 30, window(2));
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.prev, Some(1));
        assert_eq!(page.next, Some(3));
    }

    #[test]
    fn ends_have_no_neighbour() {
        let first: Paginated<()> = Paginated::new(vec![], 30, window(1));
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last: Paginated<()> = Paginated::new(vec![], 30, window(3));
        assert!(last.has_prev());
        assert!(!last.has_next());

        let empty: Paginated<()> = Paginated::empty(window(1));
        assert_eq!(empty.pages, 1);
        assert!(empty.prev.is_none() && empty.next.is_none());
    }

    #[test]
    fn past_the_end_points_back_to_last_page() {
        let page: Paginated<()> = Paginated::new(vec![], 30, window(9));
        assert_eq!(page.prev, Some(3));
        assert_eq!(page.next, None);
    }

    #[test]
    fn map_keeps_metadata() {
        let mapped = Paginated::new(vec![1, 2], 12, window(2)).map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.total, 12);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.prev, Some(1));
    }
}
