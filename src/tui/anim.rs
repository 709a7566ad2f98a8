//! Enter/update/exit animation for the tree canvas.
//!
//! Every redraw plans a transition from the last snapshot of positions to
//! the freshly computed layout. Elements new to the visible set grow out of
//! the toggled node's previous position; elements that left it shrink into
//! the toggled node's new position and are dropped once the transition
//! finishes. The plan is sampled each tick with an eased progress value.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::tree::model::NodePath;
use crate::tui::layout::PlacedNode;

/// World position, (vertical, depth-axis).
pub type Point = (f64, f64);

/// Edge geometry: source point, target point.
pub type EdgeGeom = (Point, Point);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Moving,
    Exiting,
}

#[derive(Debug, Clone)]
pub struct VisualNode {
    pub path: NodePath,
    pub from: Point,
    pub to: Point,
    pub phase: Phase,
    pub label: String,
    pub score: f64,
    pub has_hidden: bool,
    pub is_leaf: bool,
}

#[derive(Debug, Clone)]
pub struct VisualEdge {
    /// Path of the edge's target node; a node has one incoming edge.
    pub path: NodePath,
    pub from: EdgeGeom,
    pub to: EdgeGeom,
    pub phase: Phase,
    /// Source node score, drives the edge color.
    pub score: f64,
}

/// Last known position and drawing attributes of a visible node.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub pos: Point,
    pub label: String,
    pub score: f64,
    pub has_hidden: bool,
    pub is_leaf: bool,
}

#[derive(Debug, Clone)]
pub struct EdgeSnapshot {
    pub geom: EdgeGeom,
    pub score: f64,
}

/// Positions recorded after a plan, the `x0`/`y0` of the next transition.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    pub nodes: HashMap<NodePath, NodeSnapshot>,
    pub edges: HashMap<NodePath, EdgeSnapshot>,
}

#[derive(Debug, Clone)]
pub struct SampledNode {
    pub path: NodePath,
    pub pos: Point,
    /// 0.0 (invisible) to 1.0 (full size).
    pub radius_factor: f64,
    pub label_visible: bool,
    pub label: String,
    pub score: f64,
    pub has_hidden: bool,
    pub is_leaf: bool,
    pub exiting: bool,
}

#[derive(Debug, Clone)]
pub struct SampledEdge {
    pub geom: EdgeGeom,
    pub score: f64,
}

#[derive(Debug)]
pub struct AnimationPlan {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    started: Instant,
    duration: Duration,
}

/// Plan the transition from `prev` to `placed`.
///
/// `source_old` is the toggled node's position before this layout and
/// `source_new` its position in it. Returns the plan together with the
/// snapshot of the new layout targets for the next cycle.
pub fn plan(
    placed: &[PlacedNode],
    prev: &Snapshots,
    source_old: Point,
    source_new: Point,
    duration: Duration,
) -> (AnimationPlan, Snapshots) {
    let mut nodes = Vec::with_capacity(placed.len());
    let mut edges = Vec::new();
    let mut next = Snapshots::default();

    for node in placed {
        let to = (node.x, node.y);
        let (from, phase) = match prev.nodes.get(&node.path) {
            Some(snap) => (snap.pos, Phase::Moving),
            None => (source_old, Phase::Entering),
        };
        nodes.push(VisualNode {
            path: node.path.clone(),
            from,
            to,
            phase,
            label: node.label.clone(),
            score: node.score,
            has_hidden: node.has_hidden,
            is_leaf: node.is_leaf,
        });
        next.nodes.insert(
            node.path.clone(),
            NodeSnapshot {
                pos: to,
                label: node.label.clone(),
                score: node.score,
                has_hidden: node.has_hidden,
                is_leaf: node.is_leaf,
            },
        );

        if let Some(parent_idx) = node.parent {
            let parent = &placed[parent_idx];
            let geom_to = ((parent.x, parent.y), to);
            let (geom_from, phase) = match prev.edges.get(&node.path) {
                Some(snap) => (snap.geom, Phase::Moving),
                None => ((source_old, source_old), Phase::Entering),
            };
            edges.push(VisualEdge {
                path: node.path.clone(),
                from: geom_from,
                to: geom_to,
                phase,
                score: parent.score,
            });
            next.edges.insert(
                node.path.clone(),
                EdgeSnapshot {
                    geom: geom_to,
                    score: parent.score,
                },
            );
        }
    }

    for (path, snap) in &prev.nodes {
        if next.nodes.contains_key(path) {
            continue;
        }
        nodes.push(VisualNode {
            path: path.clone(),
            from: snap.pos,
            to: source_new,
            phase: Phase::Exiting,
            label: snap.label.clone(),
            score: snap.score,
            has_hidden: snap.has_hidden,
            is_leaf: snap.is_leaf,
        });
    }

    for (path, snap) in &prev.edges {
        if next.edges.contains_key(path) {
            continue;
        }
        // Collapse the edge onto its source node's current position.
        let parent_path = &path[..path.len() - 1];
        let sink = next
            .nodes
            .get(parent_path)
            .map(|s| s.pos)
            .unwrap_or(source_new);
        edges.push(VisualEdge {
            path: path.clone(),
            from: snap.geom,
            to: (sink, sink),
            phase: Phase::Exiting,
            score: snap.score,
        });
    }

    let plan = AnimationPlan {
        nodes,
        edges,
        started: Instant::now(),
        duration,
    };
    (plan, next)
}

impl AnimationPlan {
    /// Raw progress in [0, 1] at `now`.
    pub fn progress_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.progress_at(now) >= 1.0
    }

    /// Sample every element at raw progress `t`. Exiting elements are
    /// removed once the transition has completed.
    pub fn sample(&self, t: f64) -> (Vec<SampledNode>, Vec<SampledEdge>) {
        let t = t.clamp(0.0, 1.0);
        let e = ease_in_out_cubic(t);

        let nodes = self
            .nodes
            .iter()
            .filter(|n| !(n.phase == Phase::Exiting && t >= 1.0))
            .map(|n| {
                let radius_factor = match n.phase {
                    Phase::Entering => e,
                    Phase::Moving => 1.0,
                    Phase::Exiting => 1.0 - e,
                };
                let label_visible = match n.phase {
                    Phase::Entering => e >= 0.5,
                    Phase::Moving => true,
                    Phase::Exiting => e < 0.5,
                };
                SampledNode {
                    path: n.path.clone(),
                    pos: lerp_point(n.from, n.to, e),
                    radius_factor,
                    label_visible,
                    label: n.label.clone(),
                    score: n.score,
                    has_hidden: n.has_hidden,
                    is_leaf: n.is_leaf,
                    exiting: n.phase == Phase::Exiting,
                }
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .filter(|l| !(l.phase == Phase::Exiting && t >= 1.0))
            .map(|l| SampledEdge {
                geom: (
                    lerp_point(l.from.0, l.to.0, e),
                    lerp_point(l.from.1, l.to.1, e),
                ),
                score: l.score,
            })
            .collect();

        (nodes, edges)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    (lerp(a.0, b.0, t), lerp(a.1, b.1, t))
}

/// The charting library's default easing.
fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}
