//! Player configuration
//!
//! Everything the session needs to build the graph. The output device and the
//! stage layout are deployment-time constants; only the location comes from
//! the command line.

/// Video output device the sink writes to
pub const DEFAULT_OUTPUT_DEVICE: &str = "/dev/video1";

/// Capability names of the stages the player is built from
pub mod capability {
    pub const FILE_SOURCE: &str = "filesrc";
    pub const DEMUXER: &str = "qtdemux";
    pub const H264_DECODER: &str = "avdec_h264";
    pub const CONVERTER: &str = "videoconvert";
    pub const DEINTERLACER: &str = "deinterlace";
    pub const V4L2_SINK: &str = "v4l2sink";
}

/// Capability name, instance label and properties of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub capability: String,
    pub label: String,
    /// Applied in order, in their textual form
    pub properties: Vec<(String, String)>,
}

impl StageSpec {
    pub fn new(capability: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            label: label.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }
}

/// The six stages of the loop player, upstream to downstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageBlueprint {
    pub source: StageSpec,
    pub demuxer: StageSpec,
    pub decoder: StageSpec,
    pub converter: StageSpec,
    pub deinterlacer: StageSpec,
    pub sink: StageSpec,
}

impl StageBlueprint {
    /// Stages in graph order
    pub fn iter(&self) -> impl Iterator<Item = &StageSpec> {
        [
            &self.source,
            &self.demuxer,
            &self.decoder,
            &self.converter,
            &self.deinterlacer,
            &self.sink,
        ]
        .into_iter()
    }
}

impl Default for StageBlueprint {
    fn default() -> Self {
        Self {
            source: StageSpec::new(capability::FILE_SOURCE, "src"),
            demuxer: StageSpec::new(capability::DEMUXER, "dm"),
            decoder: StageSpec::new(capability::H264_DECODER, "dec"),
            converter: StageSpec::new(capability::CONVERTER, "clr"),
            deinterlacer: StageSpec::new(capability::DEINTERLACER, "dil"),
            sink: StageSpec::new(capability::V4L2_SINK, "sink"),
        }
    }
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Local path of the video to loop
    pub location: String,
    /// Output device node
    pub device: String,
    pub stages: StageBlueprint,
}

impl PlayerConfig {
    pub fn new(location: &str) -> Self {
        let location = normalize_location(location);
        let device = DEFAULT_OUTPUT_DEVICE.to_string();

        let mut stages = StageBlueprint::default();
        stages.source = stages.source.with_property("location", location.as_str());
        stages.sink = stages.sink.with_property("device", device.as_str());

        Self {
            location,
            device,
            stages,
        }
    }
}

/// Reduce `file://` URIs to a plain path; anything else is kept as given
pub fn normalize_location(location: &str) -> String {
    let location = location.trim();
    match location.strip_prefix("file://") {
        Some(rest) => {
            let path = rest.strip_prefix("localhost").unwrap_or(rest);
            if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            }
        }
        None => location.to_string(),
    }
}
