//! The cross-cutting report model (§3 of the specification this crate
//! implements): `Field`, `StreamKind`, `Stream`, `ContainerInfo`, `Report`,
//! plus the numeric-formatting and field-ordering rules every container and
//! codec parser hands its output through before it reaches a renderer.

mod format;
mod language;
mod model;
mod order;

pub use format::{
    format_aspect_ratio, format_bitrate, format_bitrate_kbps, format_bits_per_pixel_frame,
    format_bytes, format_channels, format_duration, format_frame_rate,
    format_frame_rate_ratio, format_sample_rate, format_stream_size, infer_bitrate_mode,
};
pub use language::{format_language, normalize_language_code};
pub use model::{BitrateMode, ContainerInfo, Field, Report, Stream, StreamKind};
pub use order::{sort_fields, sort_streams};
