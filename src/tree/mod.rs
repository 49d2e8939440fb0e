//! Department hierarchy
//!
//! Pure, synchronous transformations over a flat department list:
//!
//! - [`builder`]: flat records -> forest, siblings sorted by `order`
//! - [`flatten`]: forest -> pre-order rows annotated with depth
//! - [`visibility`]: rows + expansion set -> rows currently shown
//! - [`path`]: id <-> name path, for the parent-department picker
//!
//! Nothing here performs I/O or holds state between calls. The caller owns
//! the record list and the [`ExpansionState`] and passes them in.

pub mod builder;
pub mod flatten;
pub mod node;
pub mod path;
pub mod record;
pub mod visibility;

pub use builder::{build_tree, Diagnostic, DuplicatePolicy, Forest, TreeBuilder};
pub use flatten::{flatten, FlatRow};
pub use node::{find, walk, TreeNode};
pub use path::{
    display_path, path_options, resolve_display_path, resolve_name, resolve_path, PathMatch,
    PathOption,
};
pub use record::{DepartmentRecord, DeptId, RawDepartment, ROOT_PARENT};
pub use visibility::{visible_rows, ExpansionState, RowIndex};

/// Whether `candidate` is `ancestor` itself or lies somewhere beneath it
pub fn is_within(forest: &[TreeNode], ancestor: DeptId, candidate: DeptId) -> bool {
    find(forest, ancestor)
        .map(|node| node.iter().any(|n| n.id() == candidate))
        .unwrap_or(false)
}
