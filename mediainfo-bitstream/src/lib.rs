//! Bit-level primitives shared by every codec and container parser:
//! a fixed-width MSB-first bit reader, an Exp-Golomb reader built on top
//! of it, EBML VINT decoding, and NAL emulation-prevention unescaping.
//!
//! None of these allocate beyond the single `Vec` returned by
//! [`unescape_rbsp`]; everything else borrows its input for the call's
//! duration.

mod bitreader;
mod ebml;
mod expgolomb;
mod nal;

pub use bitreader::BitReader;
pub use ebml::{read_vint_id, read_vint_size, VInt};
pub use expgolomb::ExpGolombReader;
pub use nal::unescape_rbsp;
