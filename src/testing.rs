//! Shared test helpers

use std::time::{Duration, Instant};

use gstreamer as gst;
use gstreamer::prelude::*;

use crate::config::{StageBlueprint, StageSpec};

pub fn init() {
    gst::init().expect("GStreamer failed to initialize");
}

/// Six stages that exist in every GStreamer install and never touch media
///
/// The "demuxer" is a plain identity, so tests announce its dynamic pads by
/// hand. The "decoder" only accepts H.264.
pub fn core_blueprint() -> StageBlueprint {
    StageBlueprint {
        source: StageSpec::new("fakesrc", "src").with_property("num-buffers", "0"),
        demuxer: StageSpec::new("identity", "dm"),
        decoder: StageSpec::new("capsfilter", "dec").with_property("caps", "video/x-h264"),
        converter: StageSpec::new("identity", "clr"),
        deinterlacer: StageSpec::new("identity", "dil"),
        sink: StageSpec::new("fakesink", "sink").with_property("sync", "false"),
    }
}

/// A free-standing output pad offering `caps`
pub fn announced_pad(name: &str, caps: &str) -> gst::Pad {
    let caps: gst::Caps = caps.parse().expect("valid caps");
    let template = gst::PadTemplate::new(
        "announced_%u",
        gst::PadDirection::Src,
        gst::PadPresence::Sometimes,
        &caps,
    )
    .expect("valid pad template");
    gst::Pad::builder_from_template(&template).name(name).build()
}

/// Poll `done` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    done()
}

/// Returns the next end-of-stream or error on `bus`
pub fn next_eos_or_error(bus: &gst::Bus, timeout: Duration) -> Option<gst::Message> {
    let timeout = gst::ClockTime::from_mseconds(timeout.as_millis() as u64);
    bus.timed_pop_filtered(timeout, &[gst::MessageType::Eos, gst::MessageType::Error])
}

pub fn is_eos(message: &gst::Message) -> bool {
    matches!(message.view(), gst::MessageView::Eos(_))
}

pub fn has_peer(pad: &gst::Pad, peer: &gst::Pad) -> bool {
    pad.peer().as_ref() == Some(peer)
}

/// The `index`-th stage of `blueprint`, upstream first
pub fn stage_spec_mut(blueprint: &mut StageBlueprint, index: usize) -> &mut StageSpec {
    match index {
        0 => &mut blueprint.source,
        1 => &mut blueprint.demuxer,
        2 => &mut blueprint.decoder,
        3 => &mut blueprint.converter,
        4 => &mut blueprint.deinterlacer,
        _ => &mut blueprint.sink,
    }
}
