//! Loading and preparing one tree document.
//!
//! Documents are the engine's JSON dumps: one object per node with `name`,
//! `str` (board text), `total`, `visits` and `children`, plus `id` and `ply`
//! fields the viewer accepts but does not require. After parsing, every
//! node's children are sorted by descending score and everything below the
//! root's direct children is hidden.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::store;
use crate::tree::model::{Children, TreeNode};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ply {ply} is out of range (0..={max_ply})")]
    PlyOutOfRange { ply: u32, max_ply: u32 },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tree document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A tree node as it appears on disk.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<u64>,
    name: String,
    #[serde(rename = "str")]
    board: String,
    total: f64,
    visits: f64,
    #[serde(default)]
    ply: Option<u32>,
    #[serde(default)]
    children: Vec<RawNode>,
}

impl From<RawNode> for TreeNode {
    fn from(raw: RawNode) -> Self {
        TreeNode {
            id: raw.id,
            name: raw.name,
            board: raw.board,
            total: raw.total,
            visits: raw.visits,
            ply: raw.ply,
            children: Children::Visible(raw.children.into_iter().map(TreeNode::from).collect()),
        }
    }
}

/// Parse a document from text. The result is fully expanded and unsorted;
/// callers wanting viewer semantics run [`prepare`] afterwards.
pub fn parse_document(text: &str) -> Result<TreeNode, serde_json::Error> {
    let raw: RawNode = serde_json::from_str(text)?;
    Ok(raw.into())
}

/// Apply the viewer's load-time shape: sort every node's children by
/// descending score (stable), then collapse each of the root's direct
/// children so only depth 0 and 1 remain visible.
pub fn prepare(root: &mut TreeNode) {
    root.sort_children_by_score();
    if let Children::Visible(children) = &mut root.children {
        for child in children {
            child.collapse_recursive();
        }
    }
}

/// Load the document for viewer turn `ply` from `data_dir`, ready for layout.
pub fn load_ply(data_dir: &Path, ply: u32, max_ply: u32) -> Result<TreeNode, LoadError> {
    if ply > max_ply {
        return Err(LoadError::PlyOutOfRange { ply, max_ply });
    }
    let path = store::tree_path(data_dir, ply);
    let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let mut root = parse_document(&text).map_err(|source| LoadError::Parse { path, source })?;
    prepare(&mut root);
    Ok(root)
}
