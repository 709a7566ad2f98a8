use std::path::PathBuf;

use anyhow::Result;

use crate::tui::canvas;

pub fn run(demo: bool, data_dir: Option<PathBuf>, ply: Option<u32>) -> Result<()> {
    canvas::run(demo, data_dir, ply)
}
