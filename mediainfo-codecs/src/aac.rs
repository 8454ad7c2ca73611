//! AAC: ADTS frame header and raw `AudioSpecificConfig` (the two-byte
//! `esds`/`mp4a` decoder-specific-info payload). Both paths resolve to the
//! same `AacInfo`: MPEG version, channel configuration, sample rate and a
//! profile string (Main/LC/SSR/LTP/HE for SBR-extended streams).

use mediainfo_bitstream::BitReader;

#[derive(Debug, Clone, PartialEq)]
pub struct AacInfo {
    pub mpeg_version: u8,
    pub object_type: u8,
    pub profile: &'static str,
    pub sample_rate: f64,
    pub channels: u64,
    pub sbr: bool,
}

const SAMPLE_RATES: [f64; 13] = [
    96000.0, 88200.0, 64000.0, 48000.0, 44100.0, 32000.0, 24000.0, 22050.0, 16000.0, 12000.0,
    11025.0, 8000.0, 7350.0,
];

/// Parses a 7-byte (no CRC) or 9-byte (CRC) ADTS frame header.
pub fn parse_adts_header(data: &[u8]) -> Option<AacInfo> {
    if data.len() < 7 {
        return None;
    }
    if data[0] != 0xFF || (data[1] & 0xF0) != 0xF0 {
        return None;
    }
    let mut bits = BitReader::new(&data[1..]);
    bits.read(4); // syncword tail
    let mpeg_version = if bits.read_bool() { 2 } else { 4 };
    bits.read(2); // layer, always 00
    bits.read_bool(); // protection_absent
    let object_type = bits.read(2) as u8 + 1; // profile field is object_type - 1
    let freq_idx = bits.read(4) as usize;
    bits.read_bool(); // private_bit
    let channel_config = bits.read(3) as u64;
    if !bits.ok() {
        return None;
    }
    let sample_rate = *SAMPLE_RATES.get(freq_idx)?;
    Some(AacInfo {
        mpeg_version,
        object_type,
        profile: profile_name(object_type, false),
        sample_rate,
        channels: channel_config,
        sbr: false,
    })
}

/// Parses a raw 2-byte `AudioSpecificConfig` (MPEG-4 `esds`/`mp4a`):
/// 5-bit object type, 4-bit sample-rate index (or 24-bit explicit rate if
/// the index is `0xF`), 4-bit channel configuration. A trailing SBR
/// extension (`object_type == 5`) is not decoded here; callers that find
/// one should set `sbr` from the extension object type separately.
pub fn parse_audio_specific_config(data: &[u8]) -> Option<AacInfo> {
    if data.len() < 2 {
        return None;
    }
    let mut bits = BitReader::new(data);
    let object_type = bits.read(5) as u8;
    let freq_idx = bits.read(4) as usize;
    let sample_rate = if freq_idx == 0xF {
        bits.read(24) as f64
    } else {
        *SAMPLE_RATES.get(freq_idx)?
    };
    let channel_config = bits.read(4) as u64;
    if !bits.ok() {
        return None;
    }
    Some(AacInfo {
        mpeg_version: 4,
        object_type,
        profile: profile_name(object_type, false),
        sample_rate,
        channels: channel_config,
        sbr: object_type == 5,
    })
}

fn profile_name(object_type: u8, sbr: bool) -> &'static str {
    if sbr {
        return "HE";
    }
    match object_type {
        1 => "Main",
        2 => "LC",
        3 => "SSR",
        4 => "LTP",
        5 => "HE",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adts_bytes(mpeg_version_bit: u8, object_type_field: u8, freq_idx: u8, channel_config: u8) -> [u8; 7] {
        [
            0xFF,
            0xF0 | (mpeg_version_bit << 3) | (0 << 1) | 1, // protection_absent=1
            (object_type_field << 6) | (freq_idx << 2) | ((channel_config >> 2) & 0x01),
            ((channel_config & 0x03) << 6),
            0,
            0,
            0,
        ]
    }

    #[test]
    fn adts_48khz_stereo_lc() {
        let data = adts_bytes(0, 1, 3, 2); // object_type field 1 -> AAC LC (object_type=2)
        let info = parse_adts_header(&data).unwrap();
        assert_eq!(info.sample_rate, 48000.0);
        assert_eq!(info.channels, 2);
        assert_eq!(info.profile, "LC");
        assert_eq!(info.mpeg_version, 4);
    }

    #[test]
    fn rejects_bad_sync() {
        assert!(parse_adts_header(&[0, 0, 0, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn audio_specific_config_mono() {
        // object_type=2 (LC), freq_idx=4 (44100), channels=1
        let data = [0b00010_100, 0b1_0000000];
        let info = parse_audio_specific_config(&data).unwrap();
        assert_eq!(info.sample_rate, 44100.0);
        assert_eq!(info.channels, 1);
        assert_eq!(info.profile, "LC");
    }
}
