use std::collections::BTreeSet;

/// How a row click combines with the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    Replace,
    Toggle,
    Range,
}

impl ClickMode {
    pub fn from_modifiers(modifiers: &eframe::egui::Modifiers) -> Self {
        if modifiers.shift {
            ClickMode::Range
        } else if modifiers.command {
            ClickMode::Toggle
        } else {
            ClickMode::Replace
        }
    }
}

/// Layer list selection state.
#[derive(Debug, Default)]
pub struct LayerListState {
    /// Multi-selection set (row positions).
    pub selections: BTreeSet<usize>,
    /// Anchor for shift-selection ranges.
    pub anchor: Option<usize>,
}

impl LayerListState {
    pub fn click(&mut self, row: usize, mode: ClickMode) {
        match mode {
            ClickMode::Replace => {
                self.selections.clear();
                self.selections.insert(row);
                self.anchor = Some(row);
            }
            ClickMode::Toggle => {
                if !self.selections.remove(&row) {
                    self.selections.insert(row);
                }
                self.anchor = Some(row);
            }
            ClickMode::Range => {
                let anchor = self.anchor.unwrap_or(row);
                let (start, end) = if anchor <= row { (anchor, row) } else { (row, anchor) };
                self.selections.clear();
                self.selections.extend(start..=end);
            }
        }
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.selections.contains(&row)
    }

    /// Selected rows in ascending order
    pub fn selected_rows(&self) -> Vec<usize> {
        self.selections.iter().copied().collect()
    }

    pub fn select_all(&mut self, total: usize) {
        self.selections.clear();
        self.selections.extend(0..total);
    }

    pub fn clear(&mut self) {
        self.selections.clear();
        self.anchor = None;
    }

    /// Drop rows that no longer exist after the list shrank
    pub fn retain_within(&mut self, total: usize) {
        self.selections.retain(|&row| row < total);
        if self.anchor.is_some_and(|row| row >= total) {
            self.anchor = None;
        }
    }

    /// Follow a row that moved from `from` to `to`, so the same layers stay
    /// selected
    pub fn row_moved(&mut self, from: usize, to: usize) {
        let follow = |row: usize| {
            if row == from {
                to
            } else if from < to && (from + 1..=to).contains(&row) {
                row - 1
            } else if to < from && (to..from).contains(&row) {
                row + 1
            } else {
                row
            }
        };
        self.selections = self.selections.iter().map(|&row| follow(row)).collect();
        self.anchor = self.anchor.map(follow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_modes_combine() {
        let mut state = LayerListState::default();
        state.click(1, ClickMode::Replace);
        state.click(3, ClickMode::Toggle);
        assert_eq!(state.selected_rows(), vec![1, 3]);

        state.click(1, ClickMode::Toggle);
        assert_eq!(state.selected_rows(), vec![3]);

        // toggling moves the anchor, as a plain click does
        state.click(0, ClickMode::Range);
        assert_eq!(state.selected_rows(), vec![0, 1]);

        state.click(3, ClickMode::Range);
        assert_eq!(state.selected_rows(), vec![1, 2, 3]);

        state.click(2, ClickMode::Replace);
        assert_eq!(state.selected_rows(), vec![2]);
    }

    #[test]
    fn shrinking_list_drops_stale_rows() {
        let mut state = LayerListState::default();
        state.select_all(5);
        state.click(4, ClickMode::Toggle);
        state.click(4, ClickMode::Toggle);
        state.retain_within(3);
        assert_eq!(state.selected_rows(), vec![0, 1, 2]);
        assert_eq!(state.anchor, None);
    }

    #[test]
    fn selection_follows_moved_rows() {
        let mut state = LayerListState::default();
        state.click(0, ClickMode::Replace);
        state.click(2, ClickMode::Toggle);

        // [a b c d] -> [b c a d]
        state.row_moved(0, 2);
        assert_eq!(state.selected_rows(), vec![1, 2]);
        assert_eq!(state.anchor, Some(1));

        // [b c a d] -> [d b c a]
        state.row_moved(3, 0);
        assert_eq!(state.selected_rows(), vec![2, 3]);
        assert_eq!(state.anchor, Some(2));
    }
}
