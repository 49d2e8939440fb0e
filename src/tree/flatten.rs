//! Forest -> ordered rows with depth

use serde::Serialize;

use super::node::TreeNode;
use super::record::{DepartmentRecord, DeptId};

/// One row of the indented department table
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRow {
    #[serde(flatten)]
    pub record: DepartmentRecord,
    /// 0 for roots
    pub depth: usize,
    /// Parent in the built forest. `None` for every root, including orphans
    /// whose declared `parentId` points at a missing record.
    pub parent: Option<DeptId>,
    pub has_children: bool,
}

impl FlatRow {
    pub fn id(&self) -> DeptId {
        self.record.id
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Pre-order rows: every node before its descendants, each subtree contiguous
pub fn flatten(forest: &[TreeNode]) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&TreeNode, usize, Option<DeptId>)> =
        forest.iter().rev().map(|node| (node, 0, None)).collect();

    while let Some((node, depth, parent)) = stack.pop() {
        rows.push(FlatRow {
            record: node.record.clone(),
            depth,
            parent,
            has_children: node.has_children(),
        });
        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (child, depth + 1, Some(node.id()))),
        );
    }

    rows
}
