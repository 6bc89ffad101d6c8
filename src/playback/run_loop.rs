//! Run loop
//!
//! Cooperative dispatcher built on a GLib main loop with its own context.
//! Bus watches attached through [`RunLoop::attach`] are dispatched on the
//! thread that calls [`RunLoop::run`], one message at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// Requests the run loop to return; safe to use from any thread
///
/// A request made before the loop runs is remembered, and `run` then returns
/// at once.
#[derive(Clone)]
pub struct QuitHandle {
    context: glib::MainContext,
    main_loop: glib::MainLoop,
    requested: Arc<AtomicBool>,
}

impl QuitHandle {
    pub fn quit(&self) {
        self.requested.store(true, Ordering::SeqCst);
        let main_loop = self.main_loop.clone();
        self.context.invoke(move || main_loop.quit());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Serializes callbacks that run outside the dispatcher turn
///
/// Pad-added notifications arrive on a streaming thread; holding the gate
/// keeps them from running concurrently with a bus callback.
#[derive(Clone, Default)]
pub struct DispatchGate {
    turn: Arc<Mutex<()>>,
}

impl DispatchGate {
    pub fn enter(&self) -> MutexGuard<'_, ()> {
        self.turn.lock()
    }
}

/// Cooperative bus dispatcher
pub struct RunLoop {
    context: glib::MainContext,
    main_loop: glib::MainLoop,
    requested: Arc<AtomicBool>,
    gate: DispatchGate,
}

impl RunLoop {
    pub fn new() -> Self {
        let context = glib::MainContext::new();
        let main_loop = glib::MainLoop::new(Some(&context), false);
        Self {
            context,
            main_loop,
            requested: Arc::new(AtomicBool::new(false)),
            gate: DispatchGate::default(),
        }
    }

    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle {
            context: self.context.clone(),
            main_loop: self.main_loop.clone(),
            requested: self.requested.clone(),
        }
    }

    pub fn gate(&self) -> DispatchGate {
        self.gate.clone()
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.main_loop.is_running()
    }

    /// Run `attach` with this loop's context as the thread default
    ///
    /// Bus watches added inside are dispatched by this loop.
    pub fn attach<T>(&self, attach: impl FnOnce() -> T) -> Result<T, glib::BoolError> {
        self.context.with_thread_default(attach)
    }

    /// Dispatch until a quit is requested
    pub fn run(&self) {
        if self.requested.load(Ordering::SeqCst) {
            debug!("Quit requested before the run loop started");
            return;
        }
        debug!("Run loop started");
        self.main_loop.run();
        debug!("Run loop returned");
    }

    /// Dispatch whatever is ready right now without blocking
    #[cfg(test)]
    pub fn iterate(&self) -> usize {
        let mut dispatched = 0;
        while self.context.iteration(false) {
            dispatched += 1;
        }
        dispatched
    }
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Log errors and warnings posted by the stages
pub fn report(message: &gst::Message) {
    let source = message
        .src()
        .map(|src| src.path_string().to_string())
        .unwrap_or_else(|| "graph".to_string());

    match message.view() {
        gst::MessageView::Error(err) => {
            error!("Error from {}: {} ({:?})", source, err.error(), err.debug());
        }
        gst::MessageView::Warning(warning) => {
            warn!("Warning from {}: {} ({:?})", source, warning.error(), warning.debug());
        }
        _ => {}
    }
}
