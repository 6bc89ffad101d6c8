//! Seek requests

use gstreamer as gst;

/// A time-based seek, as handed to the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekRequest {
    pub rate: f64,
    pub flags: gst::SeekFlags,
    pub start: gst::ClockTime,
    /// `None` leaves the end of the segment open
    pub stop: Option<gst::ClockTime>,
}

impl SeekRequest {
    /// Flushing seek to the very start with an open end
    ///
    /// In-flight data is discarded, so playback resumes at once from zero.
    pub fn flushing_to_start() -> Self {
        Self {
            rate: 1.0,
            flags: gst::SeekFlags::FLUSH,
            start: gst::ClockTime::ZERO,
            stop: None,
        }
    }

    /// Stop type and position in the form the pipeline expects
    pub(crate) fn stop_bound(&self) -> (gst::SeekType, Option<gst::ClockTime>) {
        match self.stop {
            Some(stop) => (gst::SeekType::Set, Some(stop)),
            None => (gst::SeekType::None, gst::ClockTime::NONE),
        }
    }
}
