//! Name paths for the parent-department picker
//!
//! Forward: id -> names from the root down to the node. Reverse: a picked
//! option carries its id, and free text is matched on the whole path so two
//! departments sharing a leaf name are reported as ambiguous instead of one
//! being chosen at random.

use serde::Serialize;

use super::node::{walk, TreeNode};
use super::record::DeptId;

/// Names from the root ancestor down to and including `target`
pub fn resolve_path(target: DeptId, forest: &[TreeNode]) -> Option<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    let mut stack: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        names.truncate(depth);
        names.push(node.record.name.clone());
        if node.id() == target {
            return Some(names);
        }
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    None
}

/// `resolve_path` joined with `separator`
pub fn display_path(target: DeptId, forest: &[TreeNode], separator: &str) -> Option<String> {
    resolve_path(target, forest).map(|names| names.join(separator))
}

/// One entry of the parent picker
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathOption {
    pub id: DeptId,
    pub path: String,
    pub depth: usize,
}

/// Every department with its display path, in pre-order
pub fn path_options(forest: &[TreeNode], separator: &str) -> Vec<PathOption> {
    let mut options = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut stack: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        names.truncate(depth);
        names.push(node.name());
        options.push(PathOption {
            id: node.id(),
            path: names.join(separator),
            depth,
        });
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    options
}

/// Outcome of a reverse lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PathMatch {
    Found { id: DeptId },
    Ambiguous { ids: Vec<DeptId> },
    NotFound,
}

impl PathMatch {
    fn from_ids(ids: Vec<DeptId>) -> Self {
        match ids.as_slice() {
            [] => PathMatch::NotFound,
            [id] => PathMatch::Found { id: *id },
            _ => PathMatch::Ambiguous { ids },
        }
    }

    pub fn id(&self) -> Option<DeptId> {
        match self {
            PathMatch::Found { id } => Some(*id),
            _ => None,
        }
    }
}

/// Match a typed display path segment by segment from the roots down
pub fn resolve_display_path(path: &str, forest: &[TreeNode], separator: &str) -> PathMatch {
    // " / " and "/" should both split "HQ / Eng"
    let token = match separator.trim() {
        "" => separator,
        trimmed => trimmed,
    };
    if token.is_empty() {
        return PathMatch::NotFound;
    }

    let segments: Vec<&str> = path
        .split(token)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    let Some((first, rest)) = segments.split_first() else {
        return PathMatch::NotFound;
    };

    let mut candidates: Vec<&TreeNode> = forest.iter().filter(|node| node.name() == *first).collect();
    for segment in rest {
        candidates = candidates
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter(|child| child.name() == *segment)
            .collect();
    }

    PathMatch::from_ids(candidates.into_iter().map(TreeNode::id).collect())
}

/// Match on the leaf name alone
pub fn resolve_name(name: &str, forest: &[TreeNode]) -> PathMatch {
    let name = name.trim();
    PathMatch::from_ids(
        walk(forest)
            .filter(|node| node.name() == name)
            .map(TreeNode::id)
            .collect(),
    )
}
