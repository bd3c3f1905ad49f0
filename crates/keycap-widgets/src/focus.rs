//! Focus management for a form of several controls.

/// Tracks which of `len` slots has keyboard focus.
///
/// Slots can be marked as skipped (a frozen control, say) so that
/// [`focus_next`](FocusGroup::focus_next) and
/// [`focus_prev`](FocusGroup::focus_prev) step over them.
#[derive(Debug, Clone)]
pub struct FocusGroup {
    focused: usize,
    skip: Vec<bool>,
}

impl FocusGroup {
    /// Create a group of `len` slots with focus on the first one.
    pub fn new(len: usize) -> Self {
        Self {
            focused: 0,
            skip: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.skip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skip.is_empty()
    }

    /// Return the index of the currently focused slot.
    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Exclude or re-include a slot in traversal.
    pub fn set_skipped(&mut self, index: usize, skipped: bool) {
        if let Some(slot) = self.skip.get_mut(index) {
            *slot = skipped;
        }
    }

    /// Move focus to the next slot that is not skipped, wrapping around.
    pub fn focus_next(&mut self) {
        self.step(1);
    }

    /// Move focus to the previous slot that is not skipped, wrapping around.
    pub fn focus_prev(&mut self) {
        self.step(self.len().saturating_sub(1));
    }

    fn step(&mut self, by: usize) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let mut next = self.focused;
        for _ in 0..len {
            next = (next + by) % len;
            if !self.skip[next] {
                self.focused = next;
                return;
            }
        }
    }

    /// Set focus to the given slot index, clamped to the valid range.
    pub fn focus(&mut self, index: usize) {
        self.focused = index.min(self.len().saturating_sub(1));
    }

    /// Return whether the slot at the given index currently has focus.
    pub fn is_focused(&self, index: usize) -> bool {
        self.focused == index
    }
}
