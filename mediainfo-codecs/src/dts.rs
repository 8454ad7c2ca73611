//! DTS core frame header plus the DTS-HD extension-substream sync that
//! flips a stream from Constant to Variable bitrate.

use mediainfo_bitstream::BitReader;

pub const CORE_SYNC: [u8; 4] = [0x7F, 0xFE, 0x80, 0x01];
pub const EXTENSION_SYNC: [u8; 4] = [0x64, 0x58, 0x20, 0x25];

#[derive(Debug, Clone, PartialEq)]
pub struct DtsCoreInfo {
    pub sample_rate: u32,
    pub samples_per_frame: u32,
    pub channels: u8,
    pub bitrate_kbps: Option<u32>,
    pub variable_bitrate: bool,
}

/// Decodes the fixed core header starting at a `7FFE8001` sync. MediaInfoLib's
/// `DTS_Channels` table adds the LFE channel to the AMODE-derived count
/// (`AMODE=7` -> 4 channels, `+LFE` -> 5), which this mirrors.
pub fn parse_core_frame(payload: &[u8]) -> Option<DtsCoreInfo> {
    if payload.len() < 4 || payload[0..4] != CORE_SYNC {
        return None;
    }
    let mut br = BitReader::new(&payload[4..]);
    br.skip(1); // frame type
    br.skip(5); // deficit sample count
    br.skip(1); // CRC present
    let nblks = br.read(7) as u32;
    br.skip(14); // primary frame bytes - 1
    let amode = br.read(6) as u8;
    let sfcode = br.read(4) as u8;
    let br_code = br.read(5) as u8;
    br.skip(1); // downmix
    br.skip(1); // dynamic range
    br.skip(1); // timestamp
    br.skip(1); // aux data
    br.skip(1); // HDCD
    br.skip(3); // extension audio descriptor
    br.skip(1); // extended coding
    br.skip(1); // sync word insertion
    let lfe = br.read(2) as u8;
    if !br.ok() {
        return None;
    }

    let sample_rate = sample_rate_for(sfcode);
    let samples_per_frame = (nblks + 1) * 32;
    let base_channels = channel_count_for(amode);
    let channels = base_channels + if lfe != 0 { 1 } else { 0 };
    let bitrate_kbps = bitrate_kbps_for(br_code);

    Some(DtsCoreInfo {
        sample_rate,
        samples_per_frame,
        channels,
        bitrate_kbps,
        variable_bitrate: bitrate_kbps.is_none(),
    })
}

/// Returns `true` once a DTS-HD extension substream sync (`6458 2025`) is
/// found in `payload`; the caller should then treat the stream as
/// Variable-bitrate DTS-HD rather than constant-bitrate DTS core.
pub fn has_extension_sync(payload: &[u8]) -> bool {
    payload.windows(4).any(|w| w == EXTENSION_SYNC)
}

fn sample_rate_for(code: u8) -> u32 {
    match code {
        1 => 8000,
        2 => 16000,
        3 => 32000,
        6 => 11025,
        7 => 22050,
        8 => 44100,
        11 => 12000,
        12 => 24000,
        13 => 48000,
        14 => 96000,
        15 => 192000,
        _ => 0,
    }
}

const BITRATES_KBPS: [u32; 29] = [
    32, 56, 64, 96, 112, 128, 192, 224, 256, 320, 384, 448, 512, 576, 640, 768, 896, 1024, 1152,
    1280, 1344, 1408, 1411, 1472, 1536, 1920, 2048, 3072, 3840,
];

fn bitrate_kbps_for(code: u8) -> Option<u32> {
    BITRATES_KBPS.get(code as usize).copied()
}

fn channel_count_for(amode: u8) -> u8 {
    match amode {
        0 => 1,
        1 | 2 | 3 | 4 => 2,
        5 | 6 => 3,
        7 | 8 => 4,
        9 => 5,
        10 | 11 => 6,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_bits(dst: &mut [u8], pos: &mut usize, value: u32, n: u32) {
        for i in (0..n).rev() {
            let bit = (value >> i) & 1;
            let byte_pos = *pos >> 3;
            let shift = 7 - (*pos & 7);
            if bit == 1 {
                dst[byte_pos] |= 1 << shift;
            }
            *pos += 1;
        }
    }

    fn build_core_frame(amode: u32, lfe: u32, br_code: u32) -> Vec<u8> {
        let mut out = vec![0u8; 24];
        out[0..4].copy_from_slice(&CORE_SYNC);
        let mut pos = 32;
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 5);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 15, 7);
        write_bits(&mut out, &mut pos, 95, 14);
        write_bits(&mut out, &mut pos, amode, 6);
        write_bits(&mut out, &mut pos, 13, 4);
        write_bits(&mut out, &mut pos, br_code, 5);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 3);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, 0, 1);
        write_bits(&mut out, &mut pos, lfe, 2);
        out
    }

    #[test]
    fn amode7_lfe1_yields_five_channels_at_48k_768kbps() {
        let frame = build_core_frame(7, 1, 15);
        let info = parse_core_frame(&frame).unwrap();
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.samples_per_frame, 512);
        assert_eq!(info.channels, 5);
        assert_eq!(info.bitrate_kbps, Some(768));
        assert!(!info.variable_bitrate);
    }

    #[test]
    fn extension_sync_detected() {
        assert!(has_extension_sync(&[0x00, 0x64, 0x58, 0x20, 0x25, 0x00]));
        assert!(!has_extension_sync(&[0x00, 0x01, 0x02, 0x03]));
    }
}
