//! Cursor and scroll window over a list whose rows live elsewhere.

#[derive(Debug, Default)]
pub struct ListCursor {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl ListCursor {
    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + n).min(len - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Keep the cursor inside `0..len` after the list shrinks.
    pub fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        if self.scroll_offset >= len {
            self.scroll_offset = 0;
        }
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected.saturating_sub(height - 1);
        }
    }

    /// Rows `scroll_offset..` that fit in `height`, as an index range.
    pub fn visible_range(&self, height: usize, len: usize) -> std::ops::Range<usize> {
        let start = self.scroll_offset.min(len);
        start..(start + height).min(len)
    }

    /// Click on `row` within the rendered area; true when it hit an item.
    pub fn handle_click(&mut self, row: usize, len: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < len {
            self.selected = target;
            return true;
        }
        false
    }
}
