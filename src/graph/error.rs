//! Graph error types
//!
//! Construction failures (`StageUnavailable`, `IncompatibleConnectors` on static
//! links) are fatal to startup. Runtime failures are reported and contained by
//! the callback that hit them.

use gstreamer as gst;
use thiserror::Error;

use super::state::PlaybackState;

/// Why two pads could not be linked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("stage '{stage}' has no pad named '{pad}'")]
    MissingPad { stage: String, pad: String },

    #[error("stage '{0}' was released")]
    StageReleased(String),

    #[error("pads refused to link: {0}")]
    Refused(#[from] gst::PadLinkError),

    #[error("{0}")]
    Stages(String),
}

/// Graph-level errors
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("could not create '{capability}' stage '{label}': {reason}")]
    StageUnavailable {
        capability: String,
        label: String,
        reason: String,
    },

    #[error("cannot link {src} to {sink}: {source}")]
    IncompatibleConnectors {
        src: String,
        sink: String,
        #[source]
        source: LinkError,
    },

    #[error("seek rejected: {0}")]
    SeekRejected(String),

    #[error("graph failed to change state to {target}: {source}")]
    StateChangeFailed {
        target: PlaybackState,
        #[source]
        source: gst::StateChangeError,
    },

    #[error("stage '{stage}' rejected property '{name}': {reason}")]
    Property {
        stage: String,
        name: String,
        reason: String,
    },

    #[error("a stage labelled '{0}' already exists in the graph")]
    DuplicateLabel(String),

    #[error("bus watch could not be installed: {0}")]
    Watch(String),
}
