//! Playback session
//!
//! Owns the graph and the run loop for one playback, from construction to
//! teardown. Dropping a session always stops and releases the graph, so early
//! returns on fatal errors leave nothing running.

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use tracing::{debug, info};

use crate::config::{PlayerConfig, StageSpec};
use crate::graph::{pad_label, GraphError, PlaybackState, ProcessingGraph};

use super::loop_controller::{LoopStats, PlaybackLoopController};
use super::pad_linker::{LinkOutcome, PadLinker};
use super::run_loop::{self, QuitHandle, RunLoop};

/// A fully wired loop-forever graph and its dispatcher
pub struct LoopSession {
    graph: ProcessingGraph,
    run_loop: RunLoop,
    stats: LoopStats,
    bus_watch: Option<gst::bus::BusWatchGuard>,
    shut_down: bool,
}

impl LoopSession {
    /// Create, configure and link the six stages
    ///
    /// Both callbacks are registered before any link is made, and the graph
    /// is left Stopped. Any failure aborts construction; whatever was already
    /// created is torn down when the partial graph is dropped.
    pub fn build(config: &PlayerConfig, run_loop: RunLoop) -> Result<Self, GraphError> {
        let graph = ProcessingGraph::new("loop-player");
        let blueprint = &config.stages;

        let create = |spec: &StageSpec| graph.create_stage(&spec.capability, &spec.label);
        let source = create(&blueprint.source)?;
        let demuxer = create(&blueprint.demuxer)?;
        let decoder = create(&blueprint.decoder)?;
        let converter = create(&blueprint.converter)?;
        let deinterlacer = create(&blueprint.deinterlacer)?;
        let sink = create(&blueprint.sink)?;
        info!("Created {} stages", graph.stage_count());

        let stages = [&source, &demuxer, &decoder, &converter, &deinterlacer, &sink];
        for (spec, stage) in blueprint.iter().zip(stages) {
            for (name, value) in &spec.properties {
                graph.configure_stage(stage, name, value)?;
            }
        }

        let bus = graph
            .bus()
            .ok_or_else(|| GraphError::Watch("graph has no bus".to_string()))?;
        let mut controller = PlaybackLoopController::new(graph.seek_handle());
        let stats = controller.stats();
        let gate = run_loop.gate();
        let bus_watch = run_loop
            .attach(|| {
                bus.add_watch(move |_, message| {
                    let _turn = gate.enter();
                    run_loop::report(message);
                    controller.handle_message(message);
                    glib::ControlFlow::Continue
                })
            })
            .and_then(|watch| watch)
            .map_err(|e| GraphError::Watch(e.to_string()))?;

        let linker = PadLinker::new(&decoder);
        let gate = run_loop.gate();
        demuxer.connect_pad_added(move |_, pad| {
            let _turn = gate.enter();
            if let LinkOutcome::Rejected(reason) = linker.on_pad_added(pad) {
                debug!("{} stays unconnected ({})", pad_label(pad), reason);
            }
        });

        graph.link_stages(&source, &demuxer)?;
        graph.link_many(&[&decoder, &converter, &deinterlacer, &sink])?;

        Ok(Self {
            graph,
            run_loop,
            stats,
            bus_watch: Some(bus_watch),
            shut_down: false,
        })
    }

    #[cfg(test)]
    pub fn graph(&self) -> &ProcessingGraph {
        &self.graph
    }

    #[cfg(test)]
    pub fn run_loop(&self) -> &RunLoop {
        &self.run_loop
    }

    #[cfg(test)]
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn quit_handle(&self) -> QuitHandle {
        self.run_loop.quit_handle()
    }

    /// Start streaming; a second call does nothing
    pub fn play(&self) -> Result<(), GraphError> {
        if self.graph.state() == PlaybackState::Playing {
            return Ok(());
        }
        self.graph.set_state(PlaybackState::Playing)
    }

    /// Dispatch bus messages until a quit is requested
    pub fn run(&self) {
        info!("Running...");
        self.run_loop.run();
        info!("Returned, stopping playback");
    }

    /// Stop the graph and release every stage; later calls do nothing
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.graph.teardown();
        self.bus_watch.take();
        info!(
            "Playback stopped after {} loops ({} failed restarts)",
            self.stats.loops(),
            self.stats.failed_restarts()
        );
    }
}

impl Drop for LoopSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
