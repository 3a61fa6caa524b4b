//! Stateless page-number pagination with clamping.
//!
//! Feeds slice an ordered result set into fixed-size pages. Out-of-range
//! input never errors: page 0, negative numbers, and garbage all resolve
//! to the first page, and a number past the end resolves to the last page.

pub const FEED_PAGE_SIZE: u32 = 10;

/// Requested page number as parsed from the `?page=` query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(i64);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    /// Parse a raw query value. Absent, empty, or non-numeric input
    /// resolves to the first page. A run of digits too large for `i64`
    /// is still a number past the end and clamps to the last page.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return PageNumber(1);
        };

        match value.parse::<i64>() {
            Ok(number) => PageNumber(number),
            Err(_) if value.bytes().all(|b| b.is_ascii_digit()) => PageNumber(i64::MAX),
            Err(_) => PageNumber(1),
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// A resolved slice position over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub page_size: u32,
    pub offset: u64,
}

impl PageWindow {
    /// Clamp `requested` into `[1, total_pages]` and compute the query
    /// offset. An empty result set still has one (empty) page.
    pub fn resolve(total_count: u64, page_size: u32, requested: PageNumber) -> Self {
        let size = u64::from(page_size.max(1));
        let total_pages = total_count.div_ceil(size).max(1);
        let number = if requested.get() < 1 {
            1
        } else {
            (requested.get() as u64).min(total_pages)
        };

        Self {
            number,
            total_pages,
            total_count,
            page_size: page_size.max(1),
            offset: (number - 1) * size,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// The largest number of items this window can hold.
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

/// One page of feed items plus the slicing facts templates need.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self { items, window }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_garbage_input_resolve_to_first_page() {
        assert_eq!(PageNumber::parse(None).get(), 1);
        assert_eq!(PageNumber::parse(Some("")).get(), 1);
        assert_eq!(PageNumber::parse(Some("abc")).get(), 1);
        assert_eq!(PageNumber::parse(Some("  7 ")).get(), 7);
    }

    #[test]
    fn zero_and_negative_pages_clamp_to_first() {
        let window = PageWindow::resolve(25, 10, PageNumber::parse(Some("0")));
        assert_eq!(window.number, 1);
        assert_eq!(window.offset, 0);

        let window = PageWindow::resolve(25, 10, PageNumber::parse(Some("-3")));
        assert_eq!(window.number, 1);
    }

    #[test]
    fn digit_run_too_large_for_i64_clamps_to_last_page() {
        let requested = PageNumber::parse(Some("99999999999999999999"));
        let window = PageWindow::resolve(25, 10, requested);
        assert_eq!(window.number, 3);

        // A sign makes the overflow non-numeric input, not a huge page.
        assert_eq!(
            PageNumber::parse(Some("-99999999999999999999")).get(),
            1
        );
    }

    #[test]
    fn page_beyond_last_clamps_to_last() {
        let window = PageWindow::resolve(25, 10, PageNumber::parse(Some("99")));
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.number, 3);
        assert_eq!(window.offset, 20);
        assert!(window.has_previous());
        assert!(!window.has_next());
    }

    #[test]
    fn second_page_exists_iff_total_exceeds_page_size() {
        let exactly_full = PageWindow::resolve(10, 10, PageNumber::FIRST);
        assert_eq!(exactly_full.total_pages, 1);
        assert!(!exactly_full.has_next());

        let one_over = PageWindow::resolve(11, 10, PageNumber::FIRST);
        assert_eq!(one_over.total_pages, 2);
        assert!(one_over.has_next());
    }

    #[test]
    fn empty_result_set_still_has_one_page() {
        let window = PageWindow::resolve(0, 10, PageNumber::parse(Some("5")));
        assert_eq!(window.number, 1);
        assert_eq!(window.total_pages, 1);
        assert!(!window.has_previous());
        assert!(!window.has_next());
    }
}
