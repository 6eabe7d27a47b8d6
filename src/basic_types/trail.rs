use crate::marrow_assert_simple;

/// The undo log beneath every reversible structure.
///
/// Entries are grouped into nested levels, one per search decision. Closing levels hands the
/// entries back to the owner, newest first, so it can restore the state each one describes;
/// the trail itself never interprets its entries. Entries recorded before the first level
/// was opened belong to the root and are never handed back.
#[derive(Clone, Debug)]
pub(crate) struct Trail<Entry> {
    entries: Vec<Entry>,
    /// The entry count at the moment each currently open level was entered. The depth of
    /// this stack is the current level.
    level_marks: Vec<usize>,
}

impl<Entry> Default for Trail<Entry> {
    fn default() -> Self {
        Trail {
            entries: Vec::new(),
            level_marks: Vec::new(),
        }
    }
}

impl<Entry> Trail<Entry> {
    pub(crate) fn current_level(&self) -> usize {
        self.level_marks.len()
    }

    pub(crate) fn open_level(&mut self) {
        self.level_marks.push(self.entries.len());
    }

    pub(crate) fn record(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Closes every level above `target_level`, feeding the entries recorded in them to
    /// `undo`, newest first.
    pub(crate) fn close_levels_down_to(
        &mut self,
        target_level: usize,
        mut undo: impl FnMut(Entry),
    ) {
        marrow_assert_simple!(target_level < self.current_level());

        while self.level_marks.len() > target_level {
            let mark = self
                .level_marks
                .pop()
                .expect("the loop condition guarantees an open level");
            while self.entries.len() > mark {
                undo(self.entries.pop().expect("entries above the mark remain"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_entries_are_never_handed_back() {
        let mut trail = Trail::default();
        trail.record('a');

        trail.open_level();
        trail.record('b');

        let mut undone = Vec::new();
        trail.close_levels_down_to(0, |entry| undone.push(entry));

        assert_eq!(undone, vec!['b']);
        assert_eq!(trail.current_level(), 0);
    }

    #[test]
    fn entries_come_back_newest_first_across_levels() {
        let mut trail = Trail::default();
        trail.open_level();
        trail.record(1);
        trail.record(2);
        trail.open_level();
        trail.record(3);
        trail.open_level();
        trail.record(4);

        let mut undone = Vec::new();
        trail.close_levels_down_to(1, |entry| undone.push(entry));

        assert_eq!(undone, vec![4, 3]);
        assert_eq!(trail.current_level(), 1);

        trail.close_levels_down_to(0, |entry| undone.push(entry));
        assert_eq!(undone, vec![4, 3, 2, 1]);
    }

    #[test]
    fn a_level_without_entries_closes_cleanly() {
        let mut trail: Trail<u8> = Trail::default();
        trail.open_level();
        trail.open_level();
        assert_eq!(trail.current_level(), 2);

        trail.close_levels_down_to(0, |_| panic!("nothing was recorded"));
        assert_eq!(trail.current_level(), 0);
    }
}
