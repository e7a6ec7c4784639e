//! Fixed-size, 1-indexed paging over an ordered question list.

use std::ops::Range;

use thiserror::Error;

/// Questions shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("page size must be > 0")]
pub struct PageSizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    total: usize,
    page_size: usize,
}

impl Paging {
    /// # Errors
    ///
    /// Returns `PageSizeError` if `page_size` is zero.
    pub fn new(total: usize, page_size: usize) -> Result<Self, PageSizeError> {
        if page_size == 0 {
            return Err(PageSizeError);
        }
        Ok(Self { total, page_size })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(total / page_size)`; zero only for an empty list.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    #[must_use]
    pub fn is_last_page(&self, page: usize) -> bool {
        page >= self.total_pages()
    }

    /// Index range of the given 1-indexed page, clamped to the list length.
    ///
    /// Pages outside `1..=total_pages` yield an empty range.
    #[must_use]
    pub fn page_bounds(&self, page: usize) -> Range<usize> {
        if page == 0 || page > self.total_pages() {
            return self.total..self.total;
        }
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    #[must_use]
    pub fn page_len(&self, page: usize) -> usize {
        self.page_bounds(page).len()
    }

    /// 1-indexed page holding the zero-based `index`, if it is in range.
    #[must_use]
    pub fn page_of(&self, index: usize) -> Option<usize> {
        (index < self.total).then(|| index / self.page_size + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_rejected() {
        assert_eq!(Paging::new(10, 0).unwrap_err(), PageSizeError);
    }

    #[test]
    fn page_counts_follow_ceiling_division() {
        for total in 1..=45 {
            for size in 1..=12 {
                let paging = Paging::new(total, size).unwrap();
                let pages = paging.total_pages();
                assert_eq!(pages, (total + size - 1) / size);

                let last = paging.page_len(pages);
                assert_eq!(last, total - size * (pages - 1));
                assert!((1..=size).contains(&last));

                let covered: usize = (1..=pages).map(|p| paging.page_len(p)).sum();
                assert_eq!(covered, total);
            }
        }
    }

    #[test]
    fn twenty_questions_split_into_two_pages() {
        let paging = Paging::new(20, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(paging.total_pages(), 2);
        assert_eq!(paging.page_bounds(1), 0..10);
        assert_eq!(paging.page_bounds(2), 10..20);
        assert!(!paging.is_last_page(1));
        assert!(paging.is_last_page(2));
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let paging = Paging::new(5, 10).unwrap();
        assert!(paging.page_bounds(0).is_empty());
        assert!(paging.page_bounds(2).is_empty());
        assert_eq!(paging.page_of(4), Some(1));
        assert_eq!(paging.page_of(5), None);
    }
}
