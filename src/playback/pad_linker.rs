//! Dynamic pad linker
//!
//! Completes the graph once the demuxer knows what the container holds: each
//! announced output pad is offered to the decoder's input. The decoder input
//! is linked at most once; later announcements are ignored and incompatible
//! tracks stay unconnected.

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

use crate::graph::{pad_label, LinkError};

/// What happened to an announced pad
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The pad now feeds the decoder
    Linked,
    /// The decoder input was already taken; the pad was left alone
    AlreadyLinked,
    /// The pad cannot feed the decoder; the track stays unconnected
    Rejected(LinkError),
}

/// Links demuxer output pads to the decoder input
pub struct PadLinker {
    decoder: glib::WeakRef<gst::Element>,
    label: String,
    sink_pad: String,
}

impl PadLinker {
    /// Linker feeding the decoder's `sink` pad
    pub fn new(decoder: &gst::Element) -> Self {
        Self::with_sink_pad(decoder, "sink")
    }

    pub fn with_sink_pad(decoder: &gst::Element, sink_pad: impl Into<String>) -> Self {
        Self {
            decoder: decoder.downgrade(),
            label: decoder.name().to_string(),
            sink_pad: sink_pad.into(),
        }
    }

    /// Handle one pad announced by the demuxer
    ///
    /// Never fails: rejections are logged and reported through the outcome.
    pub fn on_pad_added(&self, pad: &gst::Pad) -> LinkOutcome {
        info!("Dynamic pad created, linking demuxer/decoder");

        let Some(decoder) = self.decoder.upgrade() else {
            let err = LinkError::StageReleased(self.label.clone());
            warn!("Cannot link {}: {}", pad_label(pad), err);
            return LinkOutcome::Rejected(err);
        };
        let Some(sink) = decoder.static_pad(&self.sink_pad) else {
            let err = LinkError::MissingPad {
                stage: self.label.clone(),
                pad: self.sink_pad.clone(),
            };
            warn!("Cannot link {}: {}", pad_label(pad), err);
            return LinkOutcome::Rejected(err);
        };

        if sink.is_linked() {
            debug!(
                "Ignoring {}: {} is already linked",
                pad_label(pad),
                pad_label(&sink)
            );
            return LinkOutcome::AlreadyLinked;
        }

        match pad.link(&sink) {
            Ok(_) => {
                info!("Linked {} -> {}", pad_label(pad), pad_label(&sink));
                LinkOutcome::Linked
            }
            Err(gst::PadLinkError::WasLinked) if sink.is_linked() => {
                debug!("{} was linked concurrently, ignoring {}", pad_label(&sink), pad_label(pad));
                LinkOutcome::AlreadyLinked
            }
            Err(e) => {
                warn!(
                    "Track {} ({}) left unconnected: {}",
                    pad_label(pad),
                    pad.query_caps(None),
                    e
                );
                LinkOutcome::Rejected(LinkError::Refused(e))
            }
        }
    }
}
