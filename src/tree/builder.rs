//! Flat list -> forest
//!
//! Records are linked to their parents through an id -> slot index, so the
//! whole build is linear apart from the sibling sorts. Malformed input never
//! fails the build (unless duplicates are configured to be rejected): orphans,
//! cycle members and id-less records are promoted to roots and reported as
//! [`Diagnostic`]s.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn, Level};

use super::node::TreeNode;
use super::record::{DepartmentRecord, DeptId, RawDepartment, ROOT_PARENT};
use crate::error::TreeError;

/// What to do when two records share an id
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the last record seen for an id
    #[default]
    LastWins,
    /// Fail the build
    Reject,
}

/// Non-fatal problem found in the input
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// Declared parent is not in the input; the record became a root
    Orphan {
        id: DeptId,
        #[serde(rename = "parentId")]
        parent_id: DeptId,
    },
    /// Several records shared an id; only the last one was kept
    DuplicateId { id: DeptId, occurrences: usize },
    /// Parent chain loops back on itself; `ids[0]` was promoted to a root
    Cycle { ids: Vec<DeptId> },
    /// Record at `position` had no usable id; it became a root under a
    /// negative id nothing else can reference
    MissingId {
        position: usize,
        #[serde(rename = "assignedId")]
        assigned_id: DeptId,
    },
}

/// Result of a build: the roots plus what was wrong with the input
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Forest {
    pub roots: Vec<TreeNode>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Forest {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TreeBuilder {
    duplicate_policy: DuplicatePolicy,
    orphans_expected: bool,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Input is a filtered subset, so dangling parents are normal and
    /// orphans are only logged at debug level
    pub fn orphans_expected(mut self, expected: bool) -> Self {
        self.orphans_expected = expected;
        self
    }

    pub fn build(&self, records: Vec<DepartmentRecord>) -> Result<Forest, TreeError> {
        self.build_with(records, Vec::new())
    }

    /// Build from client-supplied records, giving id-less ones a root slot
    pub fn build_raw(&self, records: Vec<RawDepartment>) -> Result<Forest, TreeError> {
        let (records, diagnostics) = assign_missing_ids(records);
        self.build_with(records, diagnostics)
    }

    fn build_with(
        &self,
        records: Vec<DepartmentRecord>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Result<Forest, TreeError> {
        if self.duplicate_policy == DuplicatePolicy::Reject {
            if let Some(id) = first_duplicate(&records) {
                return Err(TreeError::DuplicateId(id));
            }
        }

        let (records, duplicates) = keep_last(records);
        diagnostics.extend(duplicates);
        let forest = assemble(records, diagnostics);

        for diagnostic in &forest.diagnostics {
            if diagnostic_level(diagnostic, self.orphans_expected) == Level::WARN {
                warn!(?diagnostic, "malformed department input");
            } else {
                debug!(?diagnostic, "department outside the filtered set");
            }
        }
        Ok(forest)
    }
}

/// Build a forest with the default policy; diagnostics are only logged
pub fn build_tree(records: Vec<DepartmentRecord>) -> Vec<TreeNode> {
    // last-wins never rejects
    TreeBuilder::new()
        .build(records)
        .map(|forest| forest.roots)
        .unwrap_or_default()
}

fn diagnostic_level(diagnostic: &Diagnostic, orphans_expected: bool) -> Level {
    match diagnostic {
        Diagnostic::Orphan { .. } if orphans_expected => Level::DEBUG,
        _ => Level::WARN,
    }
}

/// Give every id-less record a fresh negative id and make it a root
fn assign_missing_ids(records: Vec<RawDepartment>) -> (Vec<DepartmentRecord>, Vec<Diagnostic>) {
    let lowest = records
        .iter()
        .filter_map(|record| record.id)
        .min()
        .map_or(ROOT_PARENT, |id| id.min(ROOT_PARENT));

    let mut next = lowest;
    let mut diagnostics = Vec::new();
    let records = records
        .into_iter()
        .enumerate()
        .map(|(position, mut record)| match record.id {
            Some(id) => record.into_record(id),
            None => {
                next -= 1;
                diagnostics.push(Diagnostic::MissingId {
                    position,
                    assigned_id: next,
                });
                record.parent_id = ROOT_PARENT;
                record.into_record(next)
            }
        })
        .collect();
    (records, diagnostics)
}

fn first_duplicate(records: &[DepartmentRecord]) -> Option<DeptId> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .find(|record| !seen.insert(record.id))
        .map(|record| record.id)
}

fn keep_last(records: Vec<DepartmentRecord>) -> (Vec<DepartmentRecord>, Vec<Diagnostic>) {
    // id -> (position of last occurrence, occurrences)
    let mut seen: HashMap<DeptId, (usize, usize)> = HashMap::with_capacity(records.len());
    let mut first_seen_order = Vec::new();
    for (pos, record) in records.iter().enumerate() {
        let entry = seen.entry(record.id).or_insert_with(|| {
            first_seen_order.push(record.id);
            (pos, 0)
        });
        entry.0 = pos;
        entry.1 += 1;
    }

    let diagnostics: Vec<Diagnostic> = first_seen_order
        .into_iter()
        .filter_map(|id| {
            let (_, occurrences) = seen[&id];
            (occurrences > 1).then_some(Diagnostic::DuplicateId { id, occurrences })
        })
        .collect();

    if diagnostics.is_empty() {
        return (records, diagnostics);
    }

    let kept = records
        .into_iter()
        .enumerate()
        .filter(|(pos, record)| seen[&record.id].0 == *pos)
        .map(|(_, record)| record)
        .collect();
    (kept, diagnostics)
}

/// Link unique-id records into sorted subtrees
fn assemble(records: Vec<DepartmentRecord>, mut diagnostics: Vec<Diagnostic>) -> Forest {
    let len = records.len();
    let index: HashMap<DeptId, usize> = records
        .iter()
        .enumerate()
        .map(|(slot, record)| (record.id, slot))
        .collect();

    let mut parent: Vec<Option<usize>> = Vec::with_capacity(len);
    for record in &records {
        if record.declares_root() {
            parent.push(None);
            continue;
        }
        match index.get(&record.parent_id) {
            Some(&slot) => parent.push(Some(slot)),
            None => {
                diagnostics.push(Diagnostic::Orphan {
                    id: record.id,
                    parent_id: record.parent_id,
                });
                parent.push(None);
            }
        }
    }

    break_cycles(&records, &mut parent, &mut diagnostics);

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); len];
    for (slot, up) in parent.iter().enumerate() {
        match up {
            Some(p) => children[*p].push(slot),
            None => roots.push(slot),
        }
    }

    // Stable sorts keep input order for equal keys
    roots.sort_by_key(|&slot| records[slot].order);
    for list in &mut children {
        list.sort_by_key(|&slot| records[slot].order);
    }

    // Pre-order slot sequence; building in reverse puts children before parents
    let mut sequence = Vec::with_capacity(len);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(slot) = stack.pop() {
        sequence.push(slot);
        stack.extend(children[slot].iter().rev());
    }

    let mut records: Vec<Option<DepartmentRecord>> = records.into_iter().map(Some).collect();
    let mut built: Vec<Option<TreeNode>> = vec![None; len];
    for &slot in sequence.iter().rev() {
        let Some(record) = records[slot].take() else {
            continue;
        };
        let subtrees = children[slot]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[slot] = Some(TreeNode {
            record,
            children: subtrees,
        });
    }

    let roots: Vec<TreeNode> = roots
        .iter()
        .filter_map(|&slot| built[slot].take())
        .collect();

    debug!(
        nodes = len,
        roots = roots.len(),
        diagnostics = diagnostics.len(),
        "department tree built"
    );

    Forest { roots, diagnostics }
}

/// Detect parent loops and cut each one at the member earliest in input order
fn break_cycles(
    records: &[DepartmentRecord],
    parent: &mut [Option<usize>],
    diagnostics: &mut Vec<Diagnostic>,
) {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; records.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..records.len() {
        let mut cur = Some(start);
        while let Some(slot) = cur {
            match marks[slot] {
                Mark::Done => break,
                Mark::OnPath => {
                    // `slot` is on the current path, so the loop is path[at..]
                    let at = path.iter().position(|&s| s == slot).unwrap_or(0);
                    let members = &path[at..];
                    let Some(&cut) = members.iter().min() else {
                        break;
                    };
                    let offset = members.iter().position(|&s| s == cut).unwrap_or(0);
                    let ids: Vec<DeptId> = members[offset..]
                        .iter()
                        .chain(&members[..offset])
                        .map(|&s| records[s].id)
                        .collect();
                    parent[cut] = None;
                    diagnostics.push(Diagnostic::Cycle { ids });
                    break;
                }
                Mark::Unvisited => {
                    marks[slot] = Mark::OnPath;
                    path.push(slot);
                    cur = parent[slot];
                }
            }
        }
        for slot in path.drain(..) {
            marks[slot] = Mark::Done;
        }
    }
}
