//! Processing graph
//!
//! Owns every stage and the bus of one GStreamer pipeline. Static links are
//! made eagerly at build time, dynamic ones through the demuxer's pad-added
//! signal while playing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::{GraphError, LinkError};
use super::seek::SeekRequest;
use super::state::PlaybackState;

/// `stage:pad` name used in diagnostics
pub fn pad_label(pad: &gst::Pad) -> String {
    match pad.parent_element() {
        Some(stage) => format!("{}:{}", stage.name(), pad.name()),
        None => pad.name().to_string(),
    }
}

/// Owning container of stages and their links
pub struct ProcessingGraph {
    pipeline: gst::Pipeline,
    state: Arc<Mutex<PlaybackState>>,
    released: AtomicBool,
}

impl ProcessingGraph {
    pub fn new(name: &str) -> Self {
        Self {
            pipeline: gst::Pipeline::with_name(name),
            state: Arc::new(Mutex::new(PlaybackState::Stopped)),
            released: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> String {
        self.pipeline.name().to_string()
    }

    pub fn bus(&self) -> Option<gst::Bus> {
        self.pipeline.bus()
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock()
    }

    pub fn stage_count(&self) -> usize {
        self.pipeline.children().len()
    }

    pub fn stage(&self, label: &str) -> Option<gst::Element> {
        self.pipeline.by_name(label)
    }

    /// Instantiate a stage by capability name and take ownership of it
    pub fn create_stage(&self, capability: &str, label: &str) -> Result<gst::Element, GraphError> {
        if self.stage(label).is_some() {
            return Err(GraphError::DuplicateLabel(label.to_string()));
        }

        let unavailable = |reason: String| GraphError::StageUnavailable {
            capability: capability.to_string(),
            label: label.to_string(),
            reason,
        };
        let stage = gst::ElementFactory::make(capability)
            .name(label)
            .build()
            .map_err(|e| unavailable(e.to_string()))?;
        self.pipeline
            .add(&stage)
            .map_err(|e| unavailable(e.to_string()))?;

        debug!("Created '{}' stage '{}'", capability, label);
        Ok(stage)
    }

    /// Set a property from its textual form, as `gst-launch` would
    pub fn configure_stage(
        &self,
        stage: &gst::Element,
        name: &str,
        value: &str,
    ) -> Result<(), GraphError> {
        let rejected = |reason: &str| GraphError::Property {
            stage: stage.name().to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let pspec = stage
            .find_property(name)
            .ok_or_else(|| rejected("no such property"))?;
        if !pspec.flags().contains(glib::ParamFlags::WRITABLE) {
            return Err(rejected("property is read-only"));
        }
        let parsed = glib::Value::deserialize_with_pspec(value, &pspec)
            .map_err(|e| rejected(&e.to_string()))?;

        stage.set_property_from_value(name, &parsed);
        debug!("{}.{} = {}", stage.name(), name, value);
        Ok(())
    }

    /// Link two specific pads
    pub fn link_static(&self, src: &gst::Pad, sink: &gst::Pad) -> Result<(), GraphError> {
        src.link(sink)
            .map_err(|e| GraphError::IncompatibleConnectors {
                src: pad_label(src),
                sink: pad_label(sink),
                source: LinkError::Refused(e),
            })?;
        debug!("Linked {} -> {}", pad_label(src), pad_label(sink));
        Ok(())
    }

    /// Link the first compatible pair of pads between two stages
    pub fn link_stages(
        &self,
        upstream: &gst::Element,
        downstream: &gst::Element,
    ) -> Result<(), GraphError> {
        upstream
            .link(downstream)
            .map_err(|e| GraphError::IncompatibleConnectors {
                src: upstream.name().to_string(),
                sink: downstream.name().to_string(),
                source: LinkError::Stages(e.to_string()),
            })?;
        debug!("Linked {} -> {}", upstream.name(), downstream.name());
        Ok(())
    }

    /// Link a chain of stages in order
    pub fn link_many(&self, chain: &[&gst::Element]) -> Result<(), GraphError> {
        for pair in chain.windows(2) {
            self.link_stages(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Move every stage to `target`
    ///
    /// A failed start puts the whole graph back to Stopped before returning.
    pub fn set_state(&self, target: PlaybackState) -> Result<(), GraphError> {
        match self.pipeline.set_state(target.into()) {
            Ok(success) => {
                *self.state.lock() = target;
                info!("Graph '{}' is now {} ({:?})", self.name(), target, success);
                Ok(())
            }
            Err(source) => {
                if target == PlaybackState::Playing {
                    if let Err(e) = self.pipeline.set_state(gst::State::Null) {
                        warn!("Rolling back '{}' failed: {}", self.name(), e);
                    }
                }
                *self.state.lock() = PlaybackState::Stopped;
                Err(GraphError::StateChangeFailed { target, source })
            }
        }
    }

    /// Handle for seeking from callbacks that must not own the graph
    pub fn seek_handle(&self) -> GraphSeekHandle {
        GraphSeekHandle {
            pipeline: self.pipeline.downgrade(),
            state: self.state.clone(),
        }
    }

    /// Stop every stage and release them; later calls do nothing
    pub fn teardown(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!("Stopping '{}' failed: {}", self.name(), e);
        }
        *self.state.lock() = PlaybackState::Stopped;

        for stage in self.pipeline.children() {
            if let Err(e) = self.pipeline.remove(&stage) {
                warn!("Releasing stage '{}' failed: {}", stage.name(), e);
            }
        }
        info!("Graph '{}' released", self.name());
    }
}

impl Drop for ProcessingGraph {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Weak seek entry point into a graph
#[derive(Clone)]
pub struct GraphSeekHandle {
    pipeline: glib::WeakRef<gst::Pipeline>,
    state: Arc<Mutex<PlaybackState>>,
}

impl GraphSeekHandle {
    pub fn seek(&self, request: &SeekRequest) -> Result<(), GraphError> {
        let Some(pipeline) = self.pipeline.upgrade() else {
            return Err(GraphError::SeekRejected("graph was released".to_string()));
        };
        let state = *self.state.lock();
        if state != PlaybackState::Playing {
            return Err(GraphError::SeekRejected(format!("graph is {}", state)));
        }

        let (stop_type, stop) = request.stop_bound();
        pipeline
            .seek(
                request.rate,
                request.flags,
                gst::SeekType::Set,
                request.start,
                stop_type,
                stop,
            )
            .map_err(|e| GraphError::SeekRejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn chain_graph() -> (ProcessingGraph, Vec<gst::Element>) {
        testing::init();
        let graph = ProcessingGraph::new("chain");
        let stages = vec![
            graph.create_stage("fakesrc", "src").unwrap(),
            graph.create_stage("identity", "mid").unwrap(),
            graph.create_stage("fakesink", "sink").unwrap(),
        ];
        (graph, stages)
    }

    #[test]
    fn test_link_many_and_lookup() {
        let (graph, stages) = chain_graph();
        graph.link_many(&[&stages[0], &stages[1], &stages[2]]).unwrap();

        assert_eq!(graph.stage_count(), 3);
        assert_eq!(graph.stage("mid").unwrap(), stages[1]);
        assert!(graph.stage("missing").is_none());
        let sink_pad = stages[2].static_pad("sink").unwrap();
        assert!(sink_pad.is_linked());
    }

    #[test]
    fn test_unknown_capability() {
        testing::init();
        let graph = ProcessingGraph::new("unknown");
        let err = graph.create_stage("loopvideo-no-such-stage", "x").unwrap_err();
        assert!(matches!(
            err,
            GraphError::StageUnavailable { ref capability, ref label, .. }
                if capability == "loopvideo-no-such-stage" && label == "x"
        ));
        assert_eq!(graph.stage_count(), 0);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let (graph, _stages) = chain_graph();
        let err = graph.create_stage("identity", "mid").unwrap_err();
        assert!(matches!(err, GraphError::DuplicateLabel(ref label) if label == "mid"));
        assert_eq!(graph.stage_count(), 3);
    }

    #[test]
    fn test_static_link_incompatible() {
        testing::init();
        let graph = ProcessingGraph::new("caps");
        let video = graph.create_stage("capsfilter", "video").unwrap();
        let audio = graph.create_stage("capsfilter", "audio").unwrap();
        graph.configure_stage(&video, "caps", "video/x-h264").unwrap();
        graph.configure_stage(&audio, "caps", "audio/mpeg").unwrap();

        let err = graph.link_stages(&video, &audio).unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleConnectors { .. }));
    }

    #[test]
    fn test_link_static_rejects_double_link() {
        let (graph, stages) = chain_graph();
        let other = graph.create_stage("fakesrc", "other").unwrap();
        let sink = stages[1].static_pad("sink").unwrap();

        graph
            .link_static(&stages[0].static_pad("src").unwrap(), &sink)
            .unwrap();
        let err = graph
            .link_static(&other.static_pad("src").unwrap(), &sink)
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::IncompatibleConnectors {
                source: LinkError::Refused(gst::PadLinkError::WasLinked),
                ..
            }
        ));
        assert_eq!(sink.peer().unwrap(), stages[0].static_pad("src").unwrap());
    }

    #[test]
    fn test_configure_stage() {
        let (graph, stages) = chain_graph();
        graph.configure_stage(&stages[0], "num-buffers", "3").unwrap();
        assert_eq!(stages[0].property::<i32>("num-buffers"), 3);

        let err = graph
            .configure_stage(&stages[0], "no-such-property", "1")
            .unwrap_err();
        assert!(matches!(err, GraphError::Property { ref name, .. } if name == "no-such-property"));
        assert!(graph.configure_stage(&stages[0], "num-buffers", "many").is_err());
    }

    #[test]
    fn test_failed_start_rolls_back() {
        testing::init();
        let graph = ProcessingGraph::new("missing-file");
        let src = graph.create_stage("filesrc", "src").unwrap();
        let sink = graph.create_stage("fakesink", "sink").unwrap();
        graph
            .configure_stage(&src, "location", "/nonexistent/loopvideo/clip.mp4")
            .unwrap();
        graph.link_stages(&src, &sink).unwrap();

        let err = graph.set_state(PlaybackState::Playing).unwrap_err();
        assert!(matches!(
            err,
            GraphError::StateChangeFailed { target: PlaybackState::Playing, .. }
        ));
        assert_eq!(graph.state(), PlaybackState::Stopped);
        assert_eq!(src.current_state(), gst::State::Null);
        assert_eq!(sink.current_state(), gst::State::Null);
    }

    #[test]
    fn test_seek_rejected_when_stopped() {
        let (graph, stages) = chain_graph();
        graph.link_many(&[&stages[0], &stages[1], &stages[2]]).unwrap();

        let err = graph
            .seek_handle()
            .seek(&SeekRequest::flushing_to_start())
            .unwrap_err();
        assert!(matches!(err, GraphError::SeekRejected(_)));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let (graph, stages) = chain_graph();
        graph.link_many(&[&stages[0], &stages[1], &stages[2]]).unwrap();
        graph.configure_stage(&stages[0], "num-buffers", "0").unwrap();
        graph.set_state(PlaybackState::Playing).unwrap();

        graph.teardown();
        assert_eq!(graph.stage_count(), 0);
        assert_eq!(graph.state(), PlaybackState::Stopped);
        assert_eq!(stages[1].current_state(), gst::State::Null);

        graph.teardown();
        assert_eq!(graph.stage_count(), 0);
    }

    #[test]
    fn test_teardown_never_started() {
        let (graph, _stages) = chain_graph();
        graph.teardown();
        assert_eq!(graph.stage_count(), 0);
        assert_eq!(graph.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_seek_handle_outlived_graph() {
        let (graph, _stages) = chain_graph();
        let handle = graph.seek_handle();
        drop(graph);

        let err = handle.seek(&SeekRequest::flushing_to_start()).unwrap_err();
        assert!(matches!(err, GraphError::SeekRejected(ref reason) if reason.contains("released")));
    }
}
