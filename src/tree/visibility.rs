//! Which rows of a flattened tree are on screen
//!
//! A row is visible when it is a root, or when its parent row is visible and
//! the parent is expanded. Rows are indexed by id once and each row's
//! visibility is settled at most once, so filtering is linear in the number
//! of rows however deep the tree is.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::flatten::FlatRow;
use super::record::DeptId;

/// Id -> position lookup over a row slice
#[derive(Debug)]
pub struct RowIndex<'a> {
    rows: &'a [FlatRow],
    positions: HashMap<DeptId, usize>,
}

impl<'a> RowIndex<'a> {
    pub fn new(rows: &'a [FlatRow]) -> Self {
        let positions = rows
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.id(), pos))
            .collect();
        Self { rows, positions }
    }

    pub fn position(&self, id: DeptId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn get(&self, id: DeptId) -> Option<&'a FlatRow> {
        self.position(id).map(|pos| &self.rows[pos])
    }

    /// Position of the row's parent, `None` for roots and rows whose parent is absent
    fn parent_of(&self, pos: usize) -> Option<usize> {
        self.rows[pos].parent.and_then(|id| self.position(id))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unknown,
    Pending,
    Visible,
    Hidden,
}

/// Rows whose every ancestor is in `expanded`, in their original order
pub fn visible_rows<'a>(rows: &'a [FlatRow], expanded: &HashSet<DeptId>) -> Vec<&'a FlatRow> {
    let index = RowIndex::new(rows);
    let mut marks = vec![Mark::Unknown; rows.len()];
    let mut chain = Vec::new();

    for start in 0..rows.len() {
        // Climb until reaching a root or a row already settled.
        // `above` is (visible, id) of the parent of the topmost chain entry.
        let mut cur = start;
        let mut above = loop {
            match marks[cur] {
                Mark::Visible => break Some((true, rows[cur].id())),
                Mark::Hidden => break Some((false, rows[cur].id())),
                Mark::Pending => {
                    warn!(id = rows[cur].id(), "parent loop in department rows");
                    break Some((false, rows[cur].id()));
                }
                Mark::Unknown => {}
            }
            marks[cur] = Mark::Pending;
            chain.push(cur);
            match index.parent_of(cur) {
                Some(parent) => cur = parent,
                None => break None,
            }
        };

        for &pos in chain.iter().rev() {
            let visible = match above {
                None => true,
                Some((parent_visible, parent_id)) => parent_visible && expanded.contains(&parent_id),
            };
            marks[pos] = if visible { Mark::Visible } else { Mark::Hidden };
            above = Some((visible, rows[pos].id()));
        }
        chain.clear();
    }

    rows.iter()
        .zip(marks)
        .filter(|(_, mark)| *mark == Mark::Visible)
        .map(|(row, _)| row)
        .collect()
}

/// The set of expanded department ids
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<DeptId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row that owns children starts expanded
    pub fn fully_expanded(rows: &[FlatRow]) -> Self {
        let mut state = Self::new();
        state.expand_all(rows);
        state
    }

    pub fn is_expanded(&self, id: DeptId) -> bool {
        self.expanded.contains(&id)
    }

    /// Flip one node; returns whether it is now expanded
    pub fn toggle(&mut self, id: DeptId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn expand(&mut self, id: DeptId) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: DeptId) {
        self.expanded.remove(&id);
    }

    pub fn expand_all(&mut self, rows: &[FlatRow]) {
        self.expanded
            .extend(rows.iter().filter(|row| row.has_children).map(FlatRow::id));
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget ids that no longer name a row
    pub fn retain_existing(&mut self, rows: &[FlatRow]) {
        let index = RowIndex::new(rows);
        self.expanded.retain(|id| index.position(*id).is_some());
    }

    pub fn as_set(&self) -> &HashSet<DeptId> {
        &self.expanded
    }

    /// Expanded ids in ascending order
    pub fn ids(&self) -> Vec<DeptId> {
        let mut ids: Vec<DeptId> = self.expanded.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn visible<'a>(&self, rows: &'a [FlatRow]) -> Vec<&'a FlatRow> {
        visible_rows(rows, &self.expanded)
    }
}

impl FromIterator<DeptId> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = DeptId>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}
