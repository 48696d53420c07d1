//! isim - inspect and replay recorded input sessions
//!
//! Replay goes through a tracing injector: every dispatched action is logged
//! instead of being sent to the OS.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inputsim::prelude::*;
use inputsim::recorder::codec;

const DEFAULT_CONFIG: &str = "inputsim.toml";

#[derive(Parser)]
#[command(name = "isim")]
#[command(about = "inputsim - inspect and replay recorded input sessions")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./inputsim.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Recordings directory, overrides recorder.output_dir
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,
    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved recordings
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show recording info
    Show {
        file: String,
        /// Print every event
        #[arg(long)]
        all: bool,
    },
    /// Replay a recording (dry run, actions are logged)
    Replay {
        file: String,
        /// Drive playback frame by frame instead of by timestamps
        #[arg(long)]
        frames: bool,
        /// Frame rate used with --frames
        #[arg(long, default_value = "60")]
        fps: u32,
    },
    /// Delete a recording
    Delete { file: String },
}

/// Injector that logs actions instead of performing them
struct TraceInjector;

impl InputInjector for TraceInjector {
    fn key(&self, key: &str, is_pressed: bool) -> inputsim::Result<()> {
        info!(key, is_pressed, "key");
        Ok(())
    }

    fn move_pointer(&self, x: i16, y: i16) -> inputsim::Result<()> {
        info!(x, y, "move");
        Ok(())
    }

    fn mouse_button(&self, button: &str, is_pressed: bool) -> inputsim::Result<()> {
        info!(button, is_pressed, "button");
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = load_config(cli.config.as_deref(), cli.dir).and_then(|config| match cli.command {
        Commands::List { filter } => list(&config, filter.as_deref()),
        Commands::Show { file, all } => show(&config, &file, all),
        Commands::Replay { file, frames, fps } => replay(&config, &file, frames, fps),
        Commands::Delete { file } => delete(&config, &file),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, dir: Option<PathBuf>) -> Result<InputSimConfig> {
    let mut config = match path {
        Some(path) => InputSimConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => InputSimConfig::load(DEFAULT_CONFIG)?,
        None => InputSimConfig::default(),
    };
    if let Some(dir) = dir {
        config.recorder.output_dir = Some(dir);
    }
    Ok(config)
}

fn storage(config: &InputSimConfig) -> Result<RecordingStorage> {
    Ok(RecordingStorage::with_dir(config.recorder.require_output_dir()?)?)
}

fn list(config: &InputSimConfig, filter: Option<&str>) -> Result<()> {
    let storage = storage(config)?;
    let files = storage.list(filter)?;
    if files.is_empty() {
        println!("No recordings in {}", storage.dir().display());
    } else {
        for f in files {
            println!("{}", f);
        }
    }
    Ok(())
}

fn show(config: &InputSimConfig, file: &str, all: bool) -> Result<()> {
    let storage = storage(config)?;
    let events = storage.load(file)?;
    let mode = codec::validate_log(&events)?;

    println!("File: {}", storage.path(file).display());
    println!("Events: {}", events.len());
    match mode {
        Some(RecordingMode::Continuous) => println!("Mode: continuous"),
        Some(RecordingMode::Frame) => println!("Mode: frame"),
        None => return Ok(()),
    }

    let (mut keys, mut moves, mut buttons) = (0, 0, 0);
    for e in &events {
        match e {
            InputEvent::Keyboard(_) => keys += 1,
            InputEvent::Mouse(m) if m.is_movement() => moves += 1,
            InputEvent::Mouse(_) => buttons += 1,
        }
    }
    println!("Summary: {} keys, {} moves, {} buttons", keys, moves, buttons);

    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        println!("Duration: {} ms", last.timestamp().saturating_sub(first.timestamp()));
        if let (Some(a), Some(b)) = (first.frame_id(), last.frame_id()) {
            println!("Frames: {}..={} ({} frames)", a, b, frame_span(a, b));
        }
    }

    if all {
        for (i, e) in events.iter().enumerate() {
            println!("{}: {}", i, codec::encode(e)?);
        }
    }
    Ok(())
}

/// Inclusive frame count, clamped at the i64 range
fn frame_span(first: i64, last: i64) -> i64 {
    last.saturating_sub(first).saturating_add(1)
}

fn replay(config: &InputSimConfig, file: &str, frames: bool, fps: u32) -> Result<()> {
    let path = storage(config)?.path(file);
    let player = InputPlayer::new(config.player.clone(), TraceInjector);
    let done = player.subscribe_stopped();
    let count = player.load_file(&path)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    println!("Replaying {} ({} events, Ctrl+C to stop)", path.display(), count);
    if frames {
        player.start_discontinuous_playback()?;
        let frame_time = Duration::from_secs(1) / fps.max(1);
        let mut frame = 0;
        while running.load(Ordering::SeqCst) && player.is_playing() {
            player.play_frame_inputs(frame);
            frame += 1;
            std::thread::sleep(frame_time);
        }
    } else {
        player.start_continuous_playback()?;
        while running.load(Ordering::SeqCst) && player.is_playing() {
            let _ = done.recv_timeout(Duration::from_millis(50));
        }
    }

    if player.is_playing() {
        player.stop();
    }
    let stats = player.stats();
    println!(
        "Done! {} keys, {} moves, {} buttons ({} failed)",
        stats.keys, stats.moves, stats.buttons, stats.failed
    );
    Ok(())
}

fn delete(config: &InputSimConfig, file: &str) -> Result<()> {
    storage(config)?.delete(file)?;
    println!("Deleted: {}", file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_span_clamps_extremes() {
        assert_eq!(frame_span(10, 12), 3);
        assert_eq!(frame_span(i64::MIN, i64::MAX), i64::MAX);
    }
}
