//! # glasses-ai
//!
//! Voice assistant front-end for a smart-glasses text display. Speech
//! transcripts come in (one per stdin line), answers come from a personal
//! knowledge base or a language model, and each answer is split into short
//! chunks that are paced onto the display.
//!
//! ## Modes
//! - Listen mode (default): read transcripts from stdin
//! - Single prompt mode with `-p` or `--prompt`
//! - `format`: show the chunk plan for an answer
//! - `config`, `completions`

mod cli;
mod core;
mod run;

use clap::Parser;
use dotenv::dotenv;

use cli::{Args, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let args = Args::parse();
    run::init_logger(&args);

    if let Some(Commands::Completions { shell }) = args.command {
        run::run_completions(shell);
        return Ok(());
    }

    // Exit with a Display message rather than the Debug form
    let mut config = core::config::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    if let Some(max) = args.max_chunk_length {
        if max == 0 {
            eprintln!("Error: --max-chunk-length must be greater than zero");
            std::process::exit(1);
        }
        config.max_chunk_length = max;
    }

    match &args.command {
        Some(Commands::Format { file, json }) => run::run_format(file.as_deref(), *json, &config),
        Some(Commands::Config) => {
            run::run_config(&config);
            Ok(())
        }
        Some(Commands::Completions { .. }) => Ok(()),
        None => match &args.prompt {
            Some(prompt) => run::run_single_prompt(prompt, &config).await,
            None => run::run_listen(&config).await,
        },
    }
}
