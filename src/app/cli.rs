//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Macro Humanizer - Analyze and humanize recorded input macros
#[derive(Parser, Debug)]
#[command(name = "macro-humanizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mine frequent patterns across recordings
    Mine {
        /// Recording files (JSON command arrays), at least two
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Minimum subsequence length
        #[arg(long, default_value = "2")]
        min_length: usize,

        /// Minimum occurrence count for a pattern to persist
        #[arg(long, default_value = "2")]
        min_frequency: u64,

        /// Output file for the mined patterns (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a transition table from recordings
    Transitions {
        /// Recording files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file for the table (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Humanize a recording
    Humanize {
        /// Input recording file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Drop every mouse command
        #[arg(long)]
        strip_mouse: bool,
    },

    /// Synthesize a macro from classified UI elements
    Synthesize {
        /// JSON file of classified elements
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mine_requires_two_inputs() {
        let result = Cli::try_parse_from(["macro-humanizer", "mine", "one.json"]);
        assert!(result.is_err());

        let cli =
            Cli::try_parse_from(["macro-humanizer", "mine", "one.json", "two.json"]).unwrap();
        match cli.command {
            Commands::Mine {
                inputs,
                min_length,
                min_frequency,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(min_length, 2);
                assert_eq!(min_frequency, 2);
            }
            _ => panic!("expected mine command"),
        }
    }

    #[test]
    fn humanize_accepts_seed_and_strip_flag() {
        let cli = Cli::try_parse_from([
            "macro-humanizer",
            "humanize",
            "rec.json",
            "--seed",
            "7",
            "--strip-mouse",
        ])
        .unwrap();
        match cli.command {
            Commands::Humanize {
                seed, strip_mouse, ..
            } => {
                assert_eq!(seed, Some(7));
                assert!(strip_mouse);
            }
            _ => panic!("expected humanize command"),
        }
    }
}
