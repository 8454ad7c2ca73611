//! MPEG-2 video sequence/GOP/picture headers: the byte-budget accounting
//! the transport-stream container uses for `stream_overhead_bytes`, plus
//! the frame-rate and scan-type facts a reporter needs. Start codes are
//! `0x00 0x00 0x01 <id>`; this module only decodes the fixed-size payload
//! that follows a known start code, it does not scan for one.

use mediainfo_bitstream::BitReader;

pub const SEQUENCE_HEADER_CODE: u8 = 0xB3;
pub const SEQUENCE_EXTENSION_CODE: u8 = 0xB5;
pub const GOP_HEADER_CODE: u8 = 0xB8;
pub const PICTURE_HEADER_CODE: u8 = 0x00;

/// Byte budget (payload length, excluding the 4-byte start code) of each
/// header kind, used by `mediainfo-containers::mpeg_ts` to accumulate
/// `ContainerInfo.stream_overhead_bytes` without re-parsing every field.
pub const SEQUENCE_HEADER_BYTES: usize = 12;
pub const SEQUENCE_EXTENSION_BYTES: usize = 4;
pub const GOP_HEADER_BYTES: usize = 8;
pub const PICTURE_HEADER_BYTES: usize = 6;

const FRAME_RATE_TABLE: [(u32, u32); 9] = [
    (0, 1),
    (24000, 1001),
    (24, 1),
    (25, 1),
    (30000, 1001),
    (30, 1),
    (50, 1),
    (60000, 1001),
    (60, 1),
];

#[derive(Debug, Clone, Default)]
pub struct SequenceHeaderInfo {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio_code: u8,
    pub frame_rate_num: u32,
    pub frame_rate_den: u32,
    pub bitrate_bps: i64,
}

/// Decodes the 12-byte sequence header payload (width/height, aspect-ratio
/// code, frame-rate code, bitrate value in 400-bps units).
pub fn parse_sequence_header(payload: &[u8]) -> Option<SequenceHeaderInfo> {
    if payload.len() < SEQUENCE_HEADER_BYTES {
        return None;
    }
    let mut bits = BitReader::new(payload);
    let width = bits.read(12) as u32;
    let height = bits.read(12) as u32;
    let aspect_ratio_code = bits.read(4) as u8;
    let frame_rate_code = bits.read(4) as usize;
    let bitrate_units = bits.read(18) as i64;
    bits.read(1); // marker_bit
    bits.read(10); // vbv_buffer_size_value
    if !bits.ok() {
        return None;
    }
    let (num, den) = FRAME_RATE_TABLE.get(frame_rate_code).copied().unwrap_or((0, 1));
    Some(SequenceHeaderInfo {
        width,
        height,
        aspect_ratio_code,
        frame_rate_num: num,
        frame_rate_den: den,
        bitrate_bps: bitrate_units * 400,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceExtensionInfo {
    pub progressive_sequence: bool,
    pub chroma_format: u8,
}

/// Decodes the 4-byte sequence extension payload that immediately follows
/// a sequence header in a main/high-profile stream.
pub fn parse_sequence_extension(payload: &[u8]) -> Option<SequenceExtensionInfo> {
    if payload.len() < SEQUENCE_EXTENSION_BYTES {
        return None;
    }
    let mut bits = BitReader::new(payload);
    bits.read(4); // extension_start_code_identifier
    bits.read(8); // profile_and_level_indication
    let progressive_sequence = bits.read_bool();
    let chroma_format = bits.read(2) as u8;
    if !bits.ok() {
        return None;
    }
    Some(SequenceExtensionInfo {
        progressive_sequence,
        chroma_format,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GopCadence {
    Fixed { m: u32, n: u32 },
    Variable,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GopHeaderInfo {
    pub closed_gop: bool,
    pub broken_link: bool,
}

/// Decodes the 8-byte GOP header payload (BCD time code plus closed/broken
/// flags). GOP cadence itself is derived by the container from successive
/// picture types, not from this header.
pub fn parse_gop_header(payload: &[u8]) -> Option<GopHeaderInfo> {
    if payload.len() < GOP_HEADER_BYTES {
        return None;
    }
    let mut bits = BitReader::new(payload);
    bits.read(25); // time_code
    let closed_gop = bits.read_bool();
    let broken_link = bits.read_bool();
    if !bits.ok() {
        return None;
    }
    Some(GopHeaderInfo {
        closed_gop,
        broken_link,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureType {
    I,
    P,
    B,
    D,
    Reserved,
}

#[derive(Debug, Clone, Copy)]
pub struct PictureHeaderInfo {
    pub temporal_reference: u16,
    pub picture_type: PictureType,
}

/// Decodes the 6-byte picture header payload: temporal reference and
/// picture-coding type, which the container accumulates into GOP cadence
/// (`M` = distance between anchor frames, `N` = GOP length) or falls back
/// to `GopCadence::Variable` when the I/P spacing is not constant.
pub fn parse_picture_header(payload: &[u8]) -> Option<PictureHeaderInfo> {
    if payload.len() < PICTURE_HEADER_BYTES {
        return None;
    }
    let mut bits = BitReader::new(payload);
    let temporal_reference = bits.read(10) as u16;
    let picture_type = match bits.read(3) {
        1 => PictureType::I,
        2 => PictureType::P,
        3 => PictureType::B,
        4 => PictureType::D,
        _ => PictureType::Reserved,
    };
    if !bits.ok() {
        return None;
    }
    Some(PictureHeaderInfo {
        temporal_reference,
        picture_type,
    })
}

/// Derives GOP cadence from a sequence of picture types as they are
/// observed in decode order, tracking the anchor-frame distance `M` and
/// restarting a fresh GOP on every `I` frame; returns `Variable` the
/// moment two observed GOP lengths disagree.
#[derive(Debug, Default)]
pub struct GopCadenceTracker {
    since_anchor: u32,
    current_gop_len: u32,
    seen_n: Option<u32>,
    seen_m: Option<u32>,
    variable: bool,
}

impl GopCadenceTracker {
    pub fn observe(&mut self, picture_type: PictureType) {
        if self.variable {
            return;
        }
        self.current_gop_len += 1;
        match picture_type {
            PictureType::I => {
                if self.current_gop_len > 1 {
                    self.record_n(self.current_gop_len - 1);
                }
                self.current_gop_len = 1;
                self.since_anchor = 0;
            }
            PictureType::P => {
                self.since_anchor += 1;
                self.record_m(self.since_anchor);
                self.since_anchor = 0;
            }
            PictureType::B => {
                self.since_anchor += 1;
            }
            _ => {}
        }
    }

    fn record_m(&mut self, m: u32) {
        match self.seen_m {
            None => self.seen_m = Some(m),
            Some(existing) if existing != m => self.variable = true,
            _ => {}
        }
    }

    fn record_n(&mut self, n: u32) {
        match self.seen_n {
            None => self.seen_n = Some(n),
            Some(existing) if existing != n => self.variable = true,
            _ => {}
        }
    }

    pub fn cadence(&self) -> GopCadence {
        if self.variable {
            return GopCadence::Variable;
        }
        match (self.seen_m, self.seen_n) {
            (Some(m), Some(n)) => GopCadence::Fixed { m, n },
            _ => GopCadence::Variable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_bits(bits: &mut Vec<u8>, value: u64, n: u32) {
        for i in (0..n).rev() {
            bits.push(((value >> i) & 1) as u8);
        }
    }

    fn pack(bits: Vec<u8>) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(bits.len() / 8 + 1);
        for chunk in bits.chunks(8) {
            let mut byte = 0u8;
            for (i, &b) in chunk.iter().enumerate() {
                byte |= b << (7 - i);
            }
            bytes.push(byte);
        }
        bytes
    }

    #[test]
    fn sequence_header_roundtrip() {
        let mut bits = Vec::new();
        push_bits(&mut bits, 1920, 12);
        push_bits(&mut bits, 1080, 12);
        push_bits(&mut bits, 1, 4); // aspect ratio
        push_bits(&mut bits, 3, 4); // 25 fps
        push_bits(&mut bits, 100, 18); // bitrate units
        push_bits(&mut bits, 1, 1);
        push_bits(&mut bits, 0, 10);
        let data = pack(bits);
        let info = parse_sequence_header(&data).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.frame_rate_num, 25);
        assert_eq!(info.bitrate_bps, 40000);
    }

    #[test]
    fn gop_cadence_tracks_fixed_pattern() {
        let mut tracker = GopCadenceTracker::default();
        let pattern = [
            PictureType::I,
            PictureType::B,
            PictureType::B,
            PictureType::P,
            PictureType::B,
            PictureType::B,
            PictureType::P,
            PictureType::I,
            PictureType::B,
            PictureType::B,
            PictureType::P,
        ];
        for p in pattern {
            tracker.observe(p);
        }
        assert_eq!(tracker.cadence(), GopCadence::Fixed { m: 3, n: 7 });
    }

    #[test]
    fn gop_cadence_detects_variable() {
        let mut tracker = GopCadenceTracker::default();
        for p in [PictureType::I, PictureType::P, PictureType::I, PictureType::B, PictureType::P] {
            tracker.observe(p);
        }
        assert_eq!(tracker.cadence(), GopCadence::Variable);
    }
}
