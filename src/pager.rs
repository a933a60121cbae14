//! State for the numbered page controls.
//!
//! The pager shows a fixed window of ten contiguous page numbers. Moving past
//! either end of the window renumbers all ten controls so the window always
//! contains the current page; numbered clicks inside the window never shift
//! it.

use std::ops::RangeInclusive;

/// How many numbered page controls are visible at once.
pub const PAGE_WINDOW: u32 = 10;

/// The pager's position: the current page and the visible window of numbered
/// controls around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    current: u32,
    window_start: u32,
}

impl Pager {
    pub(crate) fn new() -> Pager {
        Pager {
            current: 1,
            window_start: 1,
        }
    }

    /// Returns the 1-based page currently displayed.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Returns the contiguous run of page numbers the pager shows.
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.window_start..=self.window_start + PAGE_WINDOW - 1
    }

    /// Returns true when a newer page exists. Page 1 is the floor, so the
    /// "Newer" control is disabled exactly there.
    pub fn newer_enabled(&self) -> bool {
        self.current > 1
    }

    /// Moves to `page` (1-based), renumbering the window when the move lands
    /// outside it.
    pub(crate) fn go_to(&mut self, page: u32) {
        self.current = page;
        self.window_start = (page - 1) / PAGE_WINDOW * PAGE_WINDOW + 1;
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}
