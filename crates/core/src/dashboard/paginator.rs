//! Fixed-size pagination with clamped page numbers.

use serde::Serialize;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: u32,
    pub num_pages: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Splits a result set into pages of `page_size` items.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: u32,
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// An empty result still has one (empty) page.
    pub fn num_pages(&self, total_items: u64) -> u32 {
        let pages = total_items.div_ceil(u64::from(self.page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Map a requested page number onto a valid one.
    ///
    /// Missing means page 1, below 1 clamps to 1, past the end clamps to
    /// the last page.
    pub fn clamp(&self, requested: Option<i64>, total_items: u64) -> u32 {
        let last = i64::from(self.num_pages(total_items));
        let number = requested.unwrap_or(1).clamp(1, last);
        u32::try_from(number).unwrap_or(1)
    }

    /// Row offset of the first item on page `number`.
    pub fn offset(&self, number: u32) -> i64 {
        i64::from(number.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Wrap the items fetched for page `number`.
    pub fn page<T>(&self, items: Vec<T>, number: u32, total_items: u64) -> Page<T> {
        let num_pages = self.num_pages(total_items);
        Page {
            items,
            number,
            num_pages,
            page_size: self.page_size,
            total_items,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }
}

/// Parse a `page` query value. Anything unparsable counts as missing.
pub fn parse_page_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}
