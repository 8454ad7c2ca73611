//! §4.3 container parsers: one module per format, each consuming a
//! seekable byte source plus total size and returning a `ContainerOutput`
//! (`ContainerInfo` + `Stream` list + general fields + an `ok` flag, per
//! spec.md's format-mismatch recovery semantics in §7). [`detect`] is the
//! §4.3.j format detector that `mediainfo-core` dispatches on.

pub mod common;
pub mod detect;
pub mod dvd_video_ts;
pub mod flac;
pub mod iso_bmff;
pub mod matroska;
pub mod mpeg_audio;
pub mod mpeg_ps;
pub mod mpeg_ts;
pub mod ogg;
pub mod wave;

pub use common::ContainerOutput;
pub use detect::{detect_format, Format};
