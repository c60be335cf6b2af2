//! Application run modes: logger init, listen loop, single prompt, chunk plan, config.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::CommandFactory;
use clap_complete::Shell;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cli::{self, Args};
use crate::core::app;
use crate::core::assistant::{Assistant, THINKING};
use crate::core::config::Config;
use crate::core::display::{Display, Schedule, TerminalDisplay, render_chunk};
use crate::core::format;
use crate::core::paths;
use crate::core::session::{PresentationHandle, Session, SessionOptions};

/// How often the listen loop checks for an idle display.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Initialize env_logger. Logs go to stderr; stdout is the display.
pub fn init_logger(args: &Args) {
    let log_level = args.log_level();
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));
    logger.target(env_logger::Target::Stderr);
    let _ = logger.try_init();
}

fn new_session(config: &Config) -> Arc<Session> {
    let display: Arc<dyn Display> = Arc::new(TerminalDisplay::new(config.line_width));
    Session::new(
        Uuid::new_v4().to_string(),
        display,
        SessionOptions::from_config(config),
    )
}

/// Log every display state change of `session` until it is dropped.
fn watch_transitions(session: &Session) {
    let mut transitions = session.subscribe();
    let id = session.id().to_string();
    tokio::spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(t) => log::info!("session {}: display {:?} -> {:?}", id, t.from, t.to),
                Err(RecvError::Lagged(n)) => log::debug!("session {}: {} transitions skipped", id, n),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Read `path`, or stdin when it is `None` or `-`.
fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Listen mode: every stdin line is a final speech transcript for one session.
pub async fn run_listen(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let assistant = Assistant::from_config(config);
    let session = new_session(config);
    log::info!(
        "{} {}: session {} listening on stdin",
        app::NAME,
        app::VERSION,
        session.id()
    );
    watch_transitions(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut idle_check = tokio::time::interval(IDLE_CHECK_INTERVAL);
    idle_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut current: Option<PresentationHandle> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Some(handle) = assistant.handle_transcript(&session, &line).await {
                        current = Some(handle);
                    }
                }
                None => break,
            },
            _ = idle_check.tick() => {
                session.check_idle();
            }
        }
    }

    // Input closed: let the last answer finish before ending the session.
    if let Some(handle) = current {
        handle.wait().await;
    }
    session.end();
    Ok(())
}

/// Single prompt mode: answer one question and present it paced.
pub async fn run_single_prompt(
    prompt_arg: &str,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = if prompt_arg == "-" {
        read_input(None)?
    } else {
        prompt_arg.to_string()
    };
    let question = prompt.trim();
    if question.is_empty() {
        eprintln!("Error: empty prompt");
        std::process::exit(1);
    }

    let assistant = Assistant::from_config(config);
    let session = new_session(config);
    session.show_status(THINKING);
    let answer = assistant.answer(question).await?;
    let outcome = session.present_answer(&answer).wait().await;
    log::debug!("presentation finished: {:?}", outcome);
    session.end();
    Ok(())
}

/// Run the `format` command: print the chunk plan without waiting.
pub fn run_format(
    file: Option<&Path>,
    json: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = read_input(file)?;
    let chunks = match format::prepare(&raw, config.max_chunk_length) {
        Ok(chunks) => chunks,
        Err(e) => {
            log::warn!("formatting failed ({}), showing raw answer", e);
            format::unprocessed(&raw)
        }
    };
    // Never polled: only its paced plan is printed.
    let schedule = Schedule::new(chunks, &config.pacing, CancellationToken::new());

    if json {
        let plan: Vec<_> = schedule.pending().collect();
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for chunk in schedule.pending() {
        println!(
            "--- chunk {}/{} ({} chars, {} ms{})",
            chunk.index + 1,
            chunk.total_count,
            chunk.text.chars().count(),
            chunk.duration_ms,
            if chunk.contains_code { ", code" } else { "" }
        );
        println!("{}", render_chunk(chunk));
    }
    println!(
        "--- {} chunk(s), total {:.1}s",
        schedule.remaining(),
        schedule.total_duration().as_secs_f64()
    );
    Ok(())
}

/// Run the `config` command: display paths and resolved settings.
pub fn run_config(config: &Config) {
    let config_dir = paths::config_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let knowledge = match &config.knowledge_path {
        Some(p) if p.exists() => p.display().to_string(),
        Some(p) => format!("{} (missing)", p.display()),
        None => "-".to_string(),
    };
    let api_key = if config.has_api_key() {
        config.masked_api_key.as_deref().unwrap_or("set")
    } else {
        "not set (demo answers)"
    };

    println!("Config:          {}", config_dir);
    println!("Knowledge base:  {}", knowledge);
    println!("API base:        {}", config.api_base);
    println!("Model:           {}", config.model_id);
    println!("API key:         {}", api_key);
    println!("Chunk length:    {}", config.max_chunk_length);
    println!(
        "Pacing:          {} ms + {} ms/char, max {} ms",
        config.pacing.base_ms, config.pacing.per_char_ms, config.pacing.cap_ms
    );
    println!("Idle timeout:    {}s", config.idle_timeout.as_secs());
    println!("Line width:      {}", config.line_width);
    println!(
        "Echo transcript: {}",
        if config.show_live_transcription { "on" } else { "off" }
    );
}

/// Run the `completions` command.
pub fn run_completions(shell: Shell) {
    cli::generate(shell, &mut Args::command(), app::NAME, &mut io::stdout());
}
