use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::download::DEFAULT_BASE_URL;

#[derive(Parser, Debug)]
#[command(name = "padherder-cache")]
#[command(version, about = "Cache PADherder game data as fixed-layout record arrays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch datasets that are not cached yet and load everything
    Sync {
        /// Custom cache directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// API host serving /api/<dataset>/
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Only include these datasets (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Exclude these datasets (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Drop cached copies first so every selected dataset is fetched again
        #[arg(short, long)]
        force: bool,

        /// Show progress in a full-screen terminal UI
        #[arg(long)]
        tui: bool,
    },

    /// Browse the cached tables
    Show {
        /// Custom cache directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Print decoded rows of one cached table
    Inspect {
        /// Table name, e.g. monsters or leader_skills_sublist
        table: String,

        /// Custom cache directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Number of rows to print
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Print one JSON object per row
        #[arg(long)]
        json: bool,
    },

    /// List all tables and their fields
    ListDatasets,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from([
            "padherder-cache",
            "sync",
            "--include",
            "monsters,leader_skills",
            "--force",
        ])
        .unwrap();

        match cli.command {
            Commands::Sync {
                include,
                force,
                base_url,
                ..
            } => {
                assert_eq!(
                    include,
                    Some(vec!["monsters".to_string(), "leader_skills".to_string()])
                );
                assert!(force);
                assert_eq!(base_url, DEFAULT_BASE_URL);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["padherder-cache", "inspect", "monsters", "-n", "3"]).unwrap();
        match cli.command {
            Commands::Inspect { table, limit, json, .. } => {
                assert_eq!(table, "monsters");
                assert_eq!(limit, 3);
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
