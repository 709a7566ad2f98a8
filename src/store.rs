//! Paths and discovery for the engine's tree-document data directory.
//!
//! The engine writes one JSON document per recorded ply into
//! `data/jsontree/`, named `jsontree_ply_<N>.json`. The engine only records
//! a tree on its own turns, so turn `t` of the viewer maps to file index
//! `2 * t`.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// File index of the document recorded for viewer turn `ply`.
pub fn file_index(ply: u32) -> u32 {
    ply * 2
}

/// Path of the tree document for viewer turn `ply` inside `data_dir`.
pub fn tree_path(data_dir: &Path, ply: u32) -> PathBuf {
    data_dir.join(format!("jsontree_ply_{}.json", file_index(ply)))
}

/// Path of the persisted viewer configuration inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("viewer.json")
}

/// Walk upward from `start` to find a directory containing `data/jsontree/`.
pub fn find_data_dir_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join("data").join("jsontree");
        if candidate.is_dir() {
            return Ok(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => bail!(
                "no data/jsontree directory found above {} — pass --data-dir",
                start.display()
            ),
        }
    }
}

/// Walk upward from the current working directory to find the data directory.
pub fn find_data_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    find_data_dir_from(&cwd)
}

/// Resolve the data directory from an explicit flag or by discovery.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("data directory {} does not exist", dir.display());
            }
            Ok(dir)
        }
        None => find_data_dir(),
    }
}
