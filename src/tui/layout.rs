//! Tidy tree layout over the visible subtree.
//!
//! Positions live in a fixed 900x900 world-unit canvas (the terminal
//! renderer scales them to cells). The vertical axis `x` spreads the visible
//! leaves evenly and centers parents over their children; the depth axis `y`
//! is proportional to depth. Shallow trees switch to fixed per-level spacing
//! so two or three levels do not stretch across the whole canvas.

use std::collections::HashMap;

use crate::tree::model::{NodePath, TreeNode};

pub const WIDTH: f64 = 900.0;
pub const HEIGHT: f64 = 900.0;

pub const MARGIN_TOP: f64 = 20.0;
pub const MARGIN_RIGHT: f64 = 90.0;
pub const MARGIN_BOTTOM: f64 = 30.0;
pub const MARGIN_LEFT: f64 = 90.0;

pub const INNER_WIDTH: f64 = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
pub const INNER_HEIGHT: f64 = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

/// Per-level depth spacing used when the tree is shallow.
pub const FIXED_DEPTH_SPACING: f64 = 180.0;

/// A visible node with its computed world position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub path: NodePath,
    /// Index of the parent in the same `Vec`; `None` for the root.
    pub parent: Option<usize>,
    /// Vertical position.
    pub x: f64,
    /// Depth-axis (horizontal) position.
    pub y: f64,
    pub depth: usize,
    pub label: String,
    pub score: f64,
    pub has_hidden: bool,
    pub is_leaf: bool,
}

/// Lay out every node reachable through visible children.
///
/// The depth axis normally spans the inner width; when the root's full-tree
/// height is below `WIDTH / FIXED_DEPTH_SPACING` levels, each level instead
/// sits at `depth * FIXED_DEPTH_SPACING`.
pub fn compute(root: &TreeNode) -> Vec<PlacedNode> {
    let mut placed = Vec::new();
    let mut index_by_path: HashMap<NodePath, usize> = HashMap::new();
    root.for_each_visible(&mut |node, path, depth| {
        let parent = match path.split_last() {
            None => None,
            Some((_, parent_path)) => index_by_path.get(parent_path).copied(),
        };
        index_by_path.insert(path.clone(), placed.len());
        placed.push(PlacedNode {
            path: path.clone(),
            parent,
            x: 0.0,
            y: 0.0,
            depth,
            label: node.label(),
            score: node.score(),
            has_hidden: node.is_collapsed(),
            is_leaf: node.is_leaf(),
        });
    });

    assign_vertical(root, &mut placed);

    let max_visible_depth = placed.iter().map(|p| p.depth).max().unwrap_or(0);
    let fixed_depth = (root.height() as f64) < WIDTH / FIXED_DEPTH_SPACING;
    for node in &mut placed {
        node.y = if fixed_depth {
            node.depth as f64 * FIXED_DEPTH_SPACING
        } else if max_visible_depth == 0 {
            0.0
        } else {
            node.depth as f64 / max_visible_depth as f64 * INNER_WIDTH
        };
    }

    placed
}

/// Leaves of the visible subtree get evenly spaced slots over the inner
/// height; every internal node is centered over its children.
fn assign_vertical(root: &TreeNode, placed: &mut [PlacedNode]) {
    let n_leaves = placed
        .iter()
        .filter(|p| p.is_leaf || p.has_hidden)
        .count()
        .max(1);
    let step = if n_leaves > 1 {
        INNER_HEIGHT / (n_leaves - 1) as f64
    } else {
        0.0
    };

    let mut next_slot = 0usize;
    assign_rec(root, placed, &mut 0, step, n_leaves, &mut next_slot);
}

fn assign_rec(
    node: &TreeNode,
    placed: &mut [PlacedNode],
    cursor: &mut usize,
    step: f64,
    n_leaves: usize,
    next_slot: &mut usize,
) -> f64 {
    let idx = *cursor;
    *cursor += 1;

    let children = node.visible_children();
    let x = if children.is_empty() {
        let slot = *next_slot;
        *next_slot += 1;
        if n_leaves == 1 {
            INNER_HEIGHT / 2.0
        } else {
            slot as f64 * step
        }
    } else {
        let mut lo = f64::MAX;
        let mut hi = f64::MIN;
        for child in children {
            let cx = assign_rec(child, placed, cursor, step, n_leaves, next_slot);
            lo = lo.min(cx);
            hi = hi.max(cx);
        }
        (lo + hi) / 2.0
    };

    placed[idx].x = x;
    x
}
