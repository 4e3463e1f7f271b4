use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PAGE, MAX_PAGE_SIZE, RECIPE_COUNT_PER_PAGE};

/// Page-number pagination: `page` starts from 1, `limit` overrides the page size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(RECIPE_COUNT_PER_PAGE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Never negative, even for hand-built requests outside the clamped range.
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .max(0)
            .saturating_mul(self.limit.max(0))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_rows(results: Vec<T>, count: i64, request: PageRequest) -> Self {
        let limit = request.limit.max(1);
        let last_page = (count / limit + i64::from(count % limit != 0)).max(1);

        let next = (request.page < last_page).then(|| request.page.saturating_add(1));
        let previous = (request.page > 1).then(|| (request.page - 1).min(last_page));

        Self {
            count,
            next,
            previous,
            results,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_and_clamps() {
        assert_eq!(
            PageRequest::new(None, None),
            PageRequest {
                page: 1,
                limit: RECIPE_COUNT_PER_PAGE
            }
        );
        assert_eq!(PageRequest::new(Some(0), Some(0)).limit, 1);
        assert_eq!(PageRequest::new(Some(-3), Some(1000)).page, 1);
        assert_eq!(PageRequest::new(None, Some(1000)).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let request = PageRequest::new(Some(i64::MAX), None);
        assert_eq!(request.page, MAX_PAGE);
        assert!(request.offset() >= 0);

        let raw = PageRequest {
            page: i64::MAX,
            limit: MAX_PAGE_SIZE,
        };
        assert_eq!(raw.offset(), i64::MAX);

        let page: Page<i32> = Page::from_rows(vec![], 3, raw);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(1));
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = Page::from_rows(vec![1, 2], 7, PageRequest::new(Some(2), Some(2)));
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));
    }

    #[test]
    fn last_and_only_pages() {
        let last = Page::from_rows(vec![7], 7, PageRequest::new(Some(4), Some(2)));
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(3));

        let empty: Page<i32> = Page::from_rows(vec![], 0, PageRequest::default());
        assert_eq!(empty.next, None);
        assert_eq!(empty.previous, None);
    }

    #[test]
    fn page_past_the_end_points_back_to_last() {
        let page: Page<i32> = Page::from_rows(vec![], 3, PageRequest::new(Some(9), Some(2)));
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }
}
