//! CLI definitions: argument parsing, subcommands, and help text.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  glasses-ai                          Listen: each stdin line is a speech transcript
  glasses-ai -p \"what is a stack\"     Answer one question on the display
  glasses-ai -p -                     Read the question from stdin
  glasses-ai format answer.md         Show how an answer is split into chunks
  glasses-ai format - --json          Chunk plan from stdin as JSON
  glasses-ai config                   Show resolved configuration
  glasses-ai completions bash         Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Voice assistant that paces answers onto a smart-glasses display",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Answer a single question then exit (instead of listening)
    #[arg(
        short = 'p',
        long,
        help = "Ask one question and present the answer (use '-' to read from stdin)"
    )]
    pub prompt: Option<String>,

    /// Override GLASSES_MAX_CHUNK_LENGTH
    #[arg(long, global = true, value_parser = clap::value_parser!(usize))]
    pub max_chunk_length: Option<usize>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the chunk plan for an answer without pacing
    Format {
        /// Answer file ('-' or omitted for stdin)
        file: Option<PathBuf>,
        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show resolved configuration (API key masked)
    Config,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }
}
