use crate::basic_types::Trail;

/// A handle to a reversible integer cell in [`TrailedValues`]. Propagators keep their
/// incremental state in these cells so that backtracking restores it for free.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrailedInt {
    index: u32,
}

impl Default for TrailedInt {
    fn default() -> Self {
        TrailedInt { index: u32::MAX }
    }
}

/// Reversible integer cells for propagator state.
///
/// Every cell carries the level at which it last logged an undo entry. The first write to a
/// cell within a level saves the previous value and stamp; later writes in the same level
/// overwrite in place, so restoring a level undoes at most one entry per cell however often
/// it was written. Writes at the root are permanent.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrailedValues {
    values: Vec<i64>,
    /// For each cell, the level at which it last logged an undo entry.
    stamps: Vec<usize>,
    trail: Trail<SavedCell>,
}

#[derive(Debug, Clone)]
struct SavedCell {
    index: u32,
    value: i64,
    stamp: usize,
}

impl TrailedValues {
    pub(crate) fn grow(&mut self, initial_value: i64) -> TrailedInt {
        let index = self.values.len() as u32;
        self.values.push(initial_value);
        self.stamps.push(self.trail.current_level());
        TrailedInt { index }
    }

    pub(crate) fn increase_decision_level(&mut self) {
        self.trail.open_level();
    }

    pub(crate) fn read(&self, cell: TrailedInt) -> i64 {
        self.values[cell.index as usize]
    }

    pub(crate) fn assign(&mut self, cell: TrailedInt, value: i64) {
        let index = cell.index as usize;
        if self.values[index] == value {
            return;
        }

        let level = self.trail.current_level();
        if self.stamps[index] != level {
            self.trail.record(SavedCell {
                index: cell.index,
                value: self.values[index],
                stamp: self.stamps[index],
            });
            self.stamps[index] = level;
        }
        self.values[index] = value;
    }

    pub(crate) fn add_assign(&mut self, cell: TrailedInt, addition: i64) {
        self.assign(cell, self.read(cell) + addition);
    }

    pub(crate) fn synchronise(&mut self, new_decision_level: usize) {
        let values = &mut self.values;
        let stamps = &mut self.stamps;
        self.trail.close_levels_down_to(new_decision_level, |saved| {
            values[saved.index as usize] = saved.value;
            stamps[saved.index as usize] = saved.stamp;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::TrailedValues;

    #[test]
    fn values_round_trip_across_levels() {
        let mut values = TrailedValues::default();
        let cell = values.grow(0);

        values.increase_decision_level();
        values.assign(cell, 7);
        values.increase_decision_level();
        values.add_assign(cell, 3);
        assert_eq!(values.read(cell), 10);

        values.synchronise(1);
        assert_eq!(values.read(cell), 7);

        values.synchronise(0);
        assert_eq!(values.read(cell), 0);
    }

    #[test]
    fn repeated_writes_within_a_level_restore_to_the_level_entry_value() {
        let mut values = TrailedValues::default();
        let cell = values.grow(5);

        values.increase_decision_level();
        values.assign(cell, 6);
        values.assign(cell, 7);
        values.add_assign(cell, 10);
        assert_eq!(values.read(cell), 17);

        values.synchronise(0);
        assert_eq!(values.read(cell), 5);
    }

    #[test]
    fn root_writes_are_permanent() {
        let mut values = TrailedValues::default();
        let cell = values.grow(1);
        values.assign(cell, 2);

        values.increase_decision_level();
        values.assign(cell, 3);
        values.synchronise(0);

        assert_eq!(values.read(cell), 2);
    }

    #[test]
    fn a_cell_relogged_after_backtracking_restores_correctly() {
        let mut values = TrailedValues::default();
        let cell = values.grow(0);

        values.increase_decision_level();
        values.increase_decision_level();
        values.assign(cell, 9);
        values.synchronise(1);
        assert_eq!(values.read(cell), 0);

        // The same level depth is reached again; the stale stamp must not suppress logging.
        values.increase_decision_level();
        values.assign(cell, 4);
        values.synchronise(0);
        assert_eq!(values.read(cell), 0);
    }
}
