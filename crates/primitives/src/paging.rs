/// Inclusive index range covered by one fixed-size page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// Page index
    pub index: u64,
    /// First item index
    pub start: u64,
    /// Last item index (inclusive)
    pub end: u64,
}

impl PageRange {
    /// Number of items in the page.
    pub const fn item_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Number of pages of `size` items needed to cover `total` items.
pub const fn page_count(total: u64, size: u64) -> u64 {
    total.div_ceil(size)
}

/// Range covered by page `index`, or `None` past the last page.
pub fn page_range(total: u64, size: u64, index: u64) -> Option<PageRange> {
    if index >= page_count(total, size) {
        return None;
    }
    let start = index * size;
    let end = (start + size).min(total) - 1;
    Some(PageRange { index, start, end })
}

/// Clamp a stored page index to the last valid page.
///
/// Returns `None` if there are no items at all.
pub fn clamp_page_index(stored: u64, total: u64, size: u64) -> Option<u64> {
    let pages = page_count(total, size);
    (pages > 0).then(|| stored.min(pages - 1))
}

/// Every page covering `total` items, in order.
pub fn pages(total: u64, size: u64) -> impl Iterator<Item = PageRange> {
    (0..page_count(total, size)).filter_map(move |index| page_range(total, size, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_inclusive() {
        assert_eq!(page_range(250, 100, 0), Some(PageRange { index: 0, start: 0, end: 99 }));
        assert_eq!(page_range(250, 100, 2), Some(PageRange { index: 2, start: 200, end: 249 }));
        assert_eq!(page_range(250, 100, 3), None);
        assert_eq!(page_range(0, 100, 0), None);
    }

    #[test]
    fn stored_index_past_the_end_clamps_to_last_page() {
        assert_eq!(clamp_page_index(0, 120, 50), Some(0));
        assert_eq!(clamp_page_index(2, 120, 50), Some(2));
        assert_eq!(clamp_page_index(3, 120, 50), Some(2));
        assert_eq!(clamp_page_index(u64::MAX, 120, 50), Some(2));
        assert_eq!(clamp_page_index(4, 0, 50), None);
    }

    #[test]
    fn pages_cover_every_item_once() {
        let covered: u64 = pages(1_234, 100).map(|p| p.item_count()).sum();
        assert_eq!(covered, 1_234);
        assert_eq!(pages(1_234, 100).count(), 13);
        assert_eq!(pages(0, 100).count(), 0);
    }
}
