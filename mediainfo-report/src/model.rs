use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A single pre-formatted `(name, value)` pair. Values are human strings
/// (`"48.0 kHz"`, `"9 515 kb/s"`); canonicalization happens once, at the
/// point a field is appended, never in a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Canonical stream kinds. Declaration order is rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    General,
    Video,
    Audio,
    Text,
    Image,
    Menu,
}

impl StreamKind {
    /// Rank used for the stable multi-key sort over a Report's streams.
    pub fn rank(self) -> u8 {
        match self {
            StreamKind::General => 0,
            StreamKind::Video => 1,
            StreamKind::Audio => 2,
            StreamKind::Text => 3,
            StreamKind::Image => 4,
            StreamKind::Menu => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateMode {
    Constant,
    Variable,
}

impl BitrateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BitrateMode::Constant => "Constant",
            BitrateMode::Variable => "Variable",
        }
    }
}

/// One elementary or general stream. `fields` carries the human-readable
/// report; `json`/`json_raw` carry machine quantities that have no natural
/// human-string form (sampling counts, frame-rate numerator/denominator,
/// HDR metadata) and override or augment the default field-to-JSON lowering.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    pub kind_slot: Option<StreamKind>,
    pub fields: Vec<Field>,
    pub json: BTreeMap<String, String>,
    pub json_raw: BTreeMap<String, JsonValue>,
    pub json_skip_stream_order: bool,
    pub json_skip_computed: bool,
}

impl Stream {
    pub fn new(kind: StreamKind) -> Self {
        Stream {
            kind_slot: Some(kind),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind_slot.expect("Stream must carry a StreamKind")
    }

    /// Appends `field` unless a field with the same name is already present.
    /// O(n) per insert; at the scale of a few dozen fields per stream this
    /// is fine and is not worth optimizing (matches the reference
    /// implementation's `appendFieldUnique`).
    pub fn append_field_unique(&mut self, field: Field) {
        if self.fields.iter().any(|f| f.name == field.name) {
            return;
        }
        if field.value.is_empty() {
            return;
        }
        self.fields.push(field);
    }

    pub fn find_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Container-level summary shared by every `*_parse` entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerInfo {
    pub duration_seconds: f64,
    pub bitrate_mode: Option<BitrateMode>,
    pub overall_bitrate_min: f64,
    pub overall_bitrate_max: f64,
    pub stream_overhead_bytes: i64,
}

impl ContainerInfo {
    pub fn has_duration(&self) -> bool {
        self.duration_seconds > 0.0
    }
}

/// The immutable output of one `analyze(path)` call.
#[derive(Debug, Clone)]
pub struct Report {
    pub path: String,
    pub general: Stream,
    pub streams: Vec<Stream>,
}
