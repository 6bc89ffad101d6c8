//! Stage graph module
//!
//! A thin owning layer over a GStreamer pipeline: named stage creation,
//! static links, a two-state lifecycle and seeks issued through a weak handle.
//!
//! # Usage
//!
//! ```rust,ignore
//! let graph = ProcessingGraph::new("pipeline");
//! let src = graph.create_stage("filesrc", "src")?;
//! let demux = graph.create_stage("qtdemux", "dm")?;
//! graph.link_stages(&src, &demux)?;
//! graph.set_state(PlaybackState::Playing)?;
//! ```

mod error;
mod pipeline;
mod seek;
mod state;

pub use error::{GraphError, LinkError};
pub use pipeline::{pad_label, GraphSeekHandle, ProcessingGraph};
pub use seek::SeekRequest;
pub use state::PlaybackState;
