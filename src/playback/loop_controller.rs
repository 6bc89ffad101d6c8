//! Loop-forever controller
//!
//! Bus watch that turns end-of-stream into a flushing seek back to the start
//! of the timeline. Every other message is ignored. Nothing here blocks or
//! returns an error to the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gstreamer as gst;
use tracing::{debug, info, warn};

use crate::graph::{GraphError, GraphSeekHandle, SeekRequest};

/// The only distinction the controller cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    EndOfStream,
    Ignored,
}

impl From<&gst::Message> for LoopEvent {
    fn from(message: &gst::Message) -> Self {
        match message.view() {
            gst::MessageView::Eos(_) => LoopEvent::EndOfStream,
            _ => LoopEvent::Ignored,
        }
    }
}

/// Something that accepts seek commands
pub trait SeekTarget {
    fn seek(&self, request: &SeekRequest) -> Result<(), GraphError>;
}

impl SeekTarget for GraphSeekHandle {
    fn seek(&self, request: &SeekRequest) -> Result<(), GraphError> {
        GraphSeekHandle::seek(self, request)
    }
}

/// What one handled message led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopReaction {
    Restarted,
    RestartFailed,
    Ignored,
}

/// Counters shared between the controller and its session
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    restarts: Arc<AtomicU64>,
    failed_restarts: Arc<AtomicU64>,
}

impl LoopStats {
    /// Restart seeks issued, accepted or not
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    pub fn failed_restarts(&self) -> u64 {
        self.failed_restarts.load(Ordering::Relaxed)
    }

    /// Play-throughs that were restarted from the beginning
    pub fn loops(&self) -> u64 {
        self.restarts().saturating_sub(self.failed_restarts())
    }
}

/// Restarts playback from the beginning on every end-of-stream
pub struct PlaybackLoopController<S> {
    target: S,
    stats: LoopStats,
}

impl<S: SeekTarget> PlaybackLoopController<S> {
    pub fn new(target: S) -> Self {
        Self {
            target,
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats.clone()
    }

    /// Bus watch entry point
    pub fn handle_message(&mut self, message: &gst::Message) -> LoopReaction {
        match LoopEvent::from(message) {
            LoopEvent::EndOfStream => self.restart(),
            LoopEvent::Ignored => {
                debug!("Ignoring {:?} message", message.type_());
                LoopReaction::Ignored
            }
        }
    }

    fn restart(&mut self) -> LoopReaction {
        let attempt = self.stats.restarts.fetch_add(1, Ordering::Relaxed) + 1;
        match self.target.seek(&SeekRequest::flushing_to_start()) {
            Ok(()) => {
                info!("End of stream, restarting (loop {})", self.stats.loops());
                LoopReaction::Restarted
            }
            Err(e) => {
                // No retry: the last frame stays on screen
                self.stats.failed_restarts.fetch_add(1, Ordering::Relaxed);
                warn!("Seek failed! Restart {} after end of stream: {}", attempt, e);
                LoopReaction::RestartFailed
            }
        }
    }
}
