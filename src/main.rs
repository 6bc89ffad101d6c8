//! Loop Video Player
//!
//! Plays one video file forever on a V4L2 output device. Whenever the stream
//! ends, playback is restarted from the beginning with a flushing seek.

mod config;
mod graph;
mod playback;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use gstreamer as gst;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::PlayerConfig;
use playback::{LoopSession, RunLoop};

/// Loop a video forever on a V4L2 output device
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path or file:// URI of the video to loop
    location: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    gst::init().context("Failed to initialize GStreamer")?;

    let config = PlayerConfig::new(&args.location);
    info!("Loop player starting: {} -> {}", config.location, config.device);

    // Termination is honoured from here on, even while the graph is built
    let run_loop = RunLoop::new();
    let quit = run_loop.quit_handle();
    ctrlc::set_handler(move || {
        info!("Termination requested");
        quit.quit();
    })
    .context("Failed to install the termination handler")?;

    let mut session =
        LoopSession::build(&config, run_loop).context("Failed to build the playback graph")?;
    if session.quit_handle().is_requested() {
        session.shutdown();
        return Ok(());
    }

    info!("Now playing: {}", config.location);
    session
        .play()
        .with_context(|| format!("Failed to start playing '{}'", config.location))?;
    session.run();
    session.shutdown();

    Ok(())
}
