//! `plyview board` — print the root board text of one ply document.

use std::path::PathBuf;

use anyhow::Result;

use crate::config;
use crate::store;
use crate::tree::loader;

pub fn run(data_dir: Option<PathBuf>, ply: u32) -> Result<()> {
    let dir = store::resolve_data_dir(data_dir)?;
    let cfg = config::load(&store::config_path(&dir))?;
    let root = loader::load_ply(&dir, ply, cfg.max_ply)?;
    println!("{}", root.board);
    Ok(())
}
