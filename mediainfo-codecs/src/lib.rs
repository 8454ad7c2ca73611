//! Stateless bit-stream header parsers, one module per codec family
//! (§4.2 of the specification this crate implements). Each parser is a
//! pure function from a byte slice of a header or access unit to a typed
//! struct plus a success flag; container parsers invoke these and merge
//! the fields into the report model via `Stream::append_field_unique`.

pub mod aac;
pub mod ac3;
pub mod captions;
pub mod dts;
pub mod h264;
pub mod hevc;
pub mod image;
pub mod mp3_frame;
pub mod mpeg2_video;
pub mod mpeg4_visual;
pub mod opus_vorbis;
pub mod pcm;
