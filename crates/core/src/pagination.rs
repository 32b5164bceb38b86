//! Pagination window and page cursor arithmetic.
//!
//! The window is a bounded list of page numbers with ellipsis markers for the
//! omitted ranges. Page 1 and the last page are always present.

use std::fmt;

/// Pages shown without compression.
const FULL_WINDOW_MAX: u32 = 6;

/// Leading pages shown while the cursor is near the start.
const LEADING_PAGES: u32 = 4;

/// One slot in a rendered page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{n}"),
            PageItem::Ellipsis => f.write_str("…"),
        }
    }
}

/// Compute the page window for `current` out of `total`.
///
/// `total` is raised to 1 and `current` clamped into `[1, total]`, so the
/// function is total over all inputs.
pub fn compute_window(current: u32, total: u32) -> Vec<PageItem> {
    let total = total.max(1);
    let current = current.clamp(1, total);

    if total <= FULL_WINDOW_MAX {
        return (1..=total).map(PageItem::Page).collect();
    }

    let pages: Vec<u32> = if current <= LEADING_PAGES {
        vec![1, 2, 3, 4, total - 2, total - 1, total]
    } else if current >= total - 3 {
        vec![1, total - 3, total - 2, total - 1, total]
    } else {
        vec![1, current - 1, current, current + 1, total - 1, total]
    };

    // Neighbouring pages get no ellipsis between them, so (1, 7) is 1..=7
    // rather than the fixed-template `1,2,3,4,…,5,6,7`.
    let mut window = Vec::with_capacity(pages.len() + 2);
    let mut last: Option<u32> = None;
    for page in pages {
        if let Some(prev) = last {
            if page <= prev {
                continue;
            }
            if page > prev + 1 {
                window.push(PageItem::Ellipsis);
            }
        }
        window.push(PageItem::Page(page));
        last = Some(page);
    }
    window
}

/// Page cursor clamped to `[1, total]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    current: u32,
    total: u32,
}

impl Pager {
    pub fn new(current: u32, total: u32) -> Self {
        let total = total.max(1);
        Self { current: current.clamp(1, total), total }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    /// Previous page, or the current page at the lower boundary.
    pub fn prev(&self) -> u32 {
        if self.has_prev() { self.current - 1 } else { self.current }
    }

    /// Next page, or the current page at the upper boundary.
    pub fn next(&self) -> u32 {
        if self.has_next() { self.current + 1 } else { self.current }
    }

    /// Clamp an arbitrary page request into range.
    pub fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total)
    }

    pub fn window(&self) -> Vec<PageItem> {
        compute_window(self.current, self.total)
    }
}
