//! Pagination – splits a run of slots into pages.
//!
//! Handles:
//! - Leading blank pages when `skip` spans whole sheets
//! - A partially used first sheet (`skip % slots_per_page`)
//! - A partially filled last sheet

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One page of the document and the slots on it that get rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlan {
    pub page_index: usize,
    /// Intra-page slot indices, in rendering order. Empty for blank pages.
    pub slots: Range<usize>,
}

impl PagePlan {
    pub fn is_blank(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Plan the pages for `total` absolute slots of which the first `skip` stay
/// empty.
///
/// Pages before `skip / slots_per_page` are emitted blank so the physical
/// sheet stack lines up. The result always holds at least one page.
///
/// # Panics
/// If `slots_per_page` is zero; sheet layouts are validated to have at least
/// one slot.
pub fn plan(slots_per_page: usize, total: usize, skip: usize) -> Vec<PagePlan> {
    assert!(slots_per_page > 0, "a page needs at least one slot");

    let last_slot = total.max(skip);
    let page_count = last_slot.div_ceil(slots_per_page).max(1);

    (0..page_count)
        .map(|page_index| {
            let page_start = page_index * slots_per_page;
            let lo = page_start.max(skip);
            let hi = (page_start + slots_per_page).min(total);
            let slots = if lo < hi {
                (lo - page_start)..(hi - page_start)
            } else {
                0..0
            };
            PagePlan { page_index, slots }
        })
        .collect()
}

/// Number of slots that will actually be considered for rendering.
pub fn slots_to_render(total: usize, skip: usize) -> usize {
    total.saturating_sub(skip)
}
