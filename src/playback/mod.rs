//! Playback module
//!
//! The loop-forever orchestration: the dynamic pad linker, the end-of-stream
//! controller, the cooperative run loop and the session that owns them.

mod loop_controller;
mod pad_linker;
mod run_loop;
mod session;

pub use run_loop::RunLoop;
pub use session::LoopSession;
