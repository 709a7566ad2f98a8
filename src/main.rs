mod commands;
mod config;
mod store;
mod tree;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "plyview",
    about = "Terminal viewer for the search trees of a Monte Carlo game engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive tree canvas
    View {
        /// Directory holding the jsontree_ply_*.json documents
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Viewer turn to open at
        #[arg(long)]
        ply: Option<u32>,
        /// Launch with a built-in sample tree (no data required)
        #[arg(long)]
        demo: bool,
    },
    /// Query one ply document without opening the canvas
    #[command(
        group(
            ArgGroup::new("inspect_query")
                .args(["ranking", "pv", "stats"])
                .multiple(false)
        )
    )]
    Inspect {
        /// Rank the root's continuations by score
        #[arg(long)]
        ranking: bool,
        /// Follow the best-scoring line down to a leaf
        #[arg(long)]
        pv: bool,
        /// Print tree shape statistics
        #[arg(long)]
        stats: bool,
        /// Directory holding the jsontree_ply_*.json documents
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Viewer turn to inspect
        #[arg(long, default_value_t = 0)]
        ply: u32,
        /// How many continuations to list with --ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Print the root board text of one ply document
    Board {
        /// Directory holding the jsontree_ply_*.json documents
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Viewer turn to print
        #[arg(long, default_value_t = 0)]
        ply: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::View {
            data_dir,
            ply,
            demo,
        } => commands::view::run(demo, data_dir, ply),
        Command::Inspect {
            ranking,
            pv,
            stats,
            data_dir,
            ply,
            top,
        } => {
            if ranking {
                commands::inspect::run_ranking(data_dir, ply, top)
            } else if pv {
                commands::inspect::run_pv(data_dir, ply)
            } else if stats {
                commands::inspect::run_stats(data_dir, ply)
            } else {
                eprintln!("Specify one of: --ranking, --pv, --stats");
                Ok(())
            }
        }
        Command::Board { data_dir, ply } => commands::board::run(data_dir, ply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn inspect_rejects_multiple_query_flags() {
        let parsed = Cli::try_parse_from(["plyview", "inspect", "--ranking", "--pv"]);
        assert!(
            parsed.is_err(),
            "inspect flags should be mutually exclusive"
        );
        let err = parsed.err().expect("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn inspect_accepts_single_query_flag() {
        let cli = Cli::try_parse_from(["plyview", "inspect", "--ranking", "--ply", "3"])
            .expect("single inspect flag should parse");
        match cli.command {
            Command::Inspect { ranking, ply, .. } => {
                assert!(ranking);
                assert_eq!(ply, 3);
            }
            _ => panic!("expected inspect command"),
        }
    }

    #[test]
    fn view_accepts_demo_mode() {
        let cli = Cli::try_parse_from(["plyview", "view", "--demo"]).expect("view should parse");
        match cli.command {
            Command::View { demo, data_dir, .. } => {
                assert!(demo);
                assert!(data_dir.is_none());
            }
            _ => panic!("expected view command"),
        }
    }
}
