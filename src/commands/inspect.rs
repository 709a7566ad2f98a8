//! `plyview inspect` — read-only queries over one ply document.

use std::path::PathBuf;

use anyhow::Result;

use crate::config;
use crate::store;
use crate::tree::loader;
use crate::tree::model::TreeNode;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

pub fn run_ranking(data_dir: Option<PathBuf>, ply: u32, top: usize) -> Result<()> {
    let root = load_tree(data_dir, ply)?;
    let lines = ranking_lines(&root, top);
    if lines.is_empty() {
        println!("  No recorded continuations at ply {}.", store::file_index(ply));
    } else {
        for line in lines {
            println!("  {}", line);
        }
    }
    Ok(())
}

pub fn run_pv(data_dir: Option<PathBuf>, ply: u32) -> Result<()> {
    let root = load_tree(data_dir, ply)?;
    for line in pv_lines(&root) {
        println!("  {}", line);
    }
    Ok(())
}

pub fn run_stats(data_dir: Option<PathBuf>, ply: u32) -> Result<()> {
    let root = load_tree(data_dir, ply)?;
    for line in stats_lines(&root) {
        println!("  {}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_tree(data_dir: Option<PathBuf>, ply: u32) -> Result<TreeNode> {
    let dir = store::resolve_data_dir(data_dir)?;
    let cfg = config::load(&store::config_path(&dir))?;
    Ok(loader::load_ply(&dir, ply, cfg.max_ply)?)
}

/// The root's continuations in score order, best first.
fn ranking_lines(root: &TreeNode, top: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (rank, child) in root.all_children().iter().take(top).enumerate() {
        lines.push(format!(
            "{:>3}  {:<12} score {:>5.2}  visits {:>6}",
            rank + 1,
            child.name,
            child.score(),
            child.visits,
        ));
    }
    lines
}

/// The best-scoring line from the root down to a leaf. Children are already
/// sorted at load time, so the best continuation is always the first.
fn pv_lines(root: &TreeNode) -> Vec<String> {
    let mut lines = Vec::new();
    let mut node = root;
    let mut depth = 0usize;
    while let Some(best) = node.all_children().first() {
        depth += 1;
        lines.push(format!(
            "{:>3}. {:<12} score {:>5.2}  visits {:>6}",
            depth,
            best.name,
            best.score(),
            best.visits,
        ));
        node = best;
    }
    if lines.is_empty() {
        lines.push("the root has no recorded continuations".to_string());
    }
    lines
}

fn stats_lines(root: &TreeNode) -> Vec<String> {
    vec![
        format!("nodes  : {}", root.count()),
        format!("leaves : {}", count_leaves(root)),
        format!("height : {}", root.height()),
        format!("visits : {}", root.visits),
    ]
}

fn count_leaves(node: &TreeNode) -> usize {
    if node.is_leaf() {
        return 1;
    }
    node.all_children().iter().map(count_leaves).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        let mut root = loader::parse_document(
            r#"{
                "name": "Root: Ply 0", "str": "start", "total": 5.0, "visits": 10,
                "children": [
                    {"name": "b", "str": "b", "total": 2.0, "visits": 10, "children": []},
                    {"name": "a", "str": "a", "total": 8.0, "visits": 10,
                     "children": [
                        {"name": "a1", "str": "a1", "total": 3.0, "visits": 4, "children": []}
                     ]}
                ]
            }"#,
        )
        .unwrap();
        loader::prepare(&mut root);
        root
    }

    #[test]
    fn ranking_is_best_first_and_capped() {
        let root = sample();
        let lines = ranking_lines(&root, 10);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("a"), "best move first: {}", lines[0]);
        assert!(lines[0].contains("0.80"));
        assert!(lines[1].contains("0.20"));

        assert_eq!(ranking_lines(&root, 1).len(), 1);
    }

    #[test]
    fn pv_follows_the_best_line_to_a_leaf() {
        let root = sample();
        let lines = pv_lines(&root);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("a "), "expected move a: {}", lines[0]);
        assert!(lines[1].contains("a1"));
    }

    #[test]
    fn pv_on_a_leaf_root_reports_no_continuations() {
        let root = loader::parse_document(
            r#"{"name": "Root", "str": "s", "total": 0.0, "visits": 0, "children": []}"#,
        )
        .unwrap();
        let lines = pv_lines(&root);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("no recorded continuations"));
    }

    #[test]
    fn stats_count_the_full_tree() {
        let root = sample();
        let lines = stats_lines(&root);
        assert_eq!(lines[0], "nodes  : 4");
        assert_eq!(lines[1], "leaves : 2");
        assert_eq!(lines[2], "height : 2");
    }
}
