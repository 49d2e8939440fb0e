//! Tree nodes and pre-order traversal

use serde::Serialize;

use super::record::{DepartmentRecord, DeptId};

/// A department together with the subtrees it owns
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub record: DepartmentRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> DeptId {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// This node and all its descendants, pre-order
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

/// Pre-order walk over a whole forest
pub fn walk(forest: &[TreeNode]) -> PreOrder<'_> {
    PreOrder {
        stack: forest.iter().rev().collect(),
    }
}

/// Find a node anywhere in the forest
pub fn find(forest: &[TreeNode], id: DeptId) -> Option<&TreeNode> {
    walk(forest).find(|node| node.id() == id)
}

/// Depth-first, parent-before-children iterator
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: DeptId, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            record: DepartmentRecord::new(id, 0, format!("d{}", id), 0),
            children,
        }
    }

    #[test]
    fn test_walk_is_pre_order() {
        let forest = vec![
            node(1, vec![node(2, vec![node(3, vec![])]), node(4, vec![])]),
            node(5, vec![]),
        ];
        let ids: Vec<DeptId> = walk(&forest).map(TreeNode::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(walk(&forest).count(), 5);
        assert_eq!(find(&forest, 4).map(TreeNode::name), Some("d4"));
        assert!(find(&forest, 9).is_none());
    }

    #[test]
    fn test_leaf_serializes_without_children() {
        let value = serde_json::to_value(node(1, vec![])).unwrap();
        assert!(value.get("children").is_none());

        let value = serde_json::to_value(node(1, vec![node(2, vec![])])).unwrap();
        assert_eq!(value["children"][0]["id"], 2);
    }
}
