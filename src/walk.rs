//! Generic pre-order tree traversal.
//!
//! Descent follows child ownership only; parent and sibling links are never
//! read, so no node is visited twice and cycles are structurally impossible.

use crate::node::{NodeId, NodeKind, Tree};

/// Visit every node under `root` pre-order, passing the running depth
/// (0 at the root). `max_depth: Some(n)` skips nodes deeper than `n` along
/// with their subtrees; `None` means unlimited.
pub fn walk<F>(tree: &Tree, root: NodeId, max_depth: Option<u32>, visit: &mut F)
where
    F: FnMut(&Tree, NodeId, u32),
{
    descend(tree, root, 0, max_depth, visit);
}

fn descend<F>(tree: &Tree, id: NodeId, depth: u32, max_depth: Option<u32>, visit: &mut F)
where
    F: FnMut(&Tree, NodeId, u32),
{
    if let Some(limit) = max_depth {
        if depth > limit {
            return;
        }
    }
    visit(tree, id, depth);

    match &tree.node(id).kind {
        NodeKind::Object(children) | NodeKind::Array(children) | NodeKind::Elements(children) => {
            for &child in children {
                descend(tree, child, depth + 1, max_depth, visit);
            }
        }
        NodeKind::Member { value: Some(value), .. } => {
            descend(tree, *value, depth + 1, max_depth, visit);
        }
        _ => {}
    }
}
