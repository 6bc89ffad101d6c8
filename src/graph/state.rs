//! Playback state
//!
//! The graph only knows two states. Looping back to the start is a seek and
//! never shows up here.

use std::fmt;

use gstreamer as gst;

/// Playback state of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No data flows, resources are released
    #[default]
    Stopped,
    /// Stages produce and consume data
    Playing,
}

impl PlaybackState {
    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<PlaybackState> for gst::State {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Stopped => gst::State::Null,
            PlaybackState::Playing => gst::State::Playing,
        }
    }
}
