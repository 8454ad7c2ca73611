//! MPEG Audio (MP3) frame header: version/layer/bitrate/sample-rate
//! tables, channel mode and mode-extension, and the frame-length formula
//! used both by the standalone MPEG Audio container and by PES payloads
//! inside MPEG-TS/PS.

#[derive(Debug, Clone, PartialEq)]
pub struct Mp3FrameHeader {
    pub version_id: u8,
    pub layer_id: u8,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub channel_mode: u8,
    pub mode_extension: Option<&'static str>,
    pub padding: bool,
    pub frame_length: u32,
}

/// Decodes a 4-byte MP3 frame header. Returns `None` on sync mismatch or a
/// reserved bitrate/sample-rate index.
pub fn parse_header(header: &[u8]) -> Option<Mp3FrameHeader> {
    if header.len() < 4 {
        return None;
    }
    if header[0] != 0xFF || (header[1] & 0xE0) != 0xE0 {
        return None;
    }
    let version_id = (header[1] >> 3) & 0x03;
    let layer_id = (header[1] >> 1) & 0x03;
    if version_id == 0x01 || layer_id == 0x00 {
        return None;
    }
    let bitrate_index = (header[2] >> 4) & 0x0F;
    let sample_rate_index = (header[2] >> 2) & 0x03;
    if bitrate_index == 0x00 || bitrate_index == 0x0F || sample_rate_index == 0x03 {
        return None;
    }
    let padding = (header[2] >> 1) & 0x01 == 1;
    let bitrate_kbps = bitrate(version_id, layer_id, bitrate_index)?;
    let sample_rate = sample_rate(version_id, sample_rate_index)?;

    let channel_mode = (header[3] >> 6) & 0x03;
    let channels = if channel_mode == 0x03 { 1 } else { 2 };
    let mode_extension = if channel_mode == 0x01 {
        mode_extension_label(layer_id, (header[3] >> 4) & 0x03)
    } else {
        None
    };

    let frame_length = if version_id == 0x03 {
        (144000 * bitrate_kbps) / sample_rate + padding as u32
    } else {
        (72000 * bitrate_kbps) / sample_rate + padding as u32
    };

    Some(Mp3FrameHeader {
        version_id,
        layer_id,
        bitrate_kbps,
        sample_rate,
        channels,
        channel_mode,
        mode_extension,
        padding,
        frame_length,
    })
}

/// Layer III mode-extension: bit 1 toggles MS stereo, bit 0 toggles
/// intensity stereo, independent of each other.
fn mode_extension_label(layer_id: u8, value: u8) -> Option<&'static str> {
    if layer_id != 0x01 {
        return None;
    }
    Some(match value {
        0 => "",
        1 => "Intensity Stereo",
        2 => "MS Stereo",
        3 => "Intensity Stereo and MS Stereo",
        _ => unreachable!(),
    })
    .filter(|s| !s.is_empty())
}

fn bitrate(version_id: u8, layer_id: u8, index: u8) -> Option<u32> {
    if layer_id != 0x01 {
        // Only Layer III tables are required by the callers in this repo;
        // Layer I/II streams are out of scope for the distilled parsers.
        return None;
    }
    const MPEG1_LAYER3: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
    const MPEG2_LAYER3: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];
    let table = if version_id == 0x03 { &MPEG1_LAYER3 } else { &MPEG2_LAYER3 };
    table.get(index as usize).copied().filter(|&v| v > 0)
}

fn sample_rate(version_id: u8, index: u8) -> Option<u32> {
    let table: [u32; 3] = match version_id {
        0x03 => [44100, 48000, 32000],
        0x02 => [22050, 24000, 16000],
        0x00 => [11025, 12000, 8000],
        _ => return None,
    };
    table.get(index as usize).copied()
}

/// `side_info` byte length preceding the Xing/Info/VBR tag, which depends
/// on MPEG version and channel count.
pub fn side_info_len(version_id: u8, channels: u8) -> usize {
    match (version_id == 0x03, channels) {
        (true, 1) => 17,
        (true, _) => 32,
        (false, 1) => 9,
        (false, _) => 17,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version_id: u8, bitrate_index: u8, sample_rate_index: u8, mode: u8, mode_ext: u8) -> [u8; 4] {
        [
            0xFF,
            0xE0 | (version_id << 3) | (0x01 << 1), // layer III
            (bitrate_index << 4) | (sample_rate_index << 2),
            (mode << 6) | (mode_ext << 4),
        ]
    }

    #[test]
    fn mode_extension_ms_stereo() {
        // MPEG-1 Layer III, 96 kb/s, 44.1 kHz, joint stereo, mode_extension=2
        let header = header_bytes(0x03, 7, 0, 0x01, 2);
        let info = parse_header(&header).unwrap();
        assert_eq!(info.bitrate_kbps, 96);
        assert_eq!(info.mode_extension, Some("MS Stereo"));
    }

    #[test]
    fn frame_length_formula_mpeg1() {
        let header = header_bytes(0x03, 9, 0, 0x00, 0);
        let info = parse_header(&header).unwrap();
        assert_eq!(info.frame_length, (144000 * 128) / 44100);
    }

    #[test]
    fn rejects_bad_sync() {
        assert!(parse_header(&[0x00, 0x00, 0x00, 0x00]).is_none());
    }
}
