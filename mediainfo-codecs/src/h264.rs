//! H.264/AVC SPS/PPS parsing: `avcC` configuration record dispatch plus
//! the SPS bit-level walk (profile/level, high-profile chroma/bit-depth
//! scaling-list branch, POC-type branches, ref-frames, frame_mbs_only,
//! cropping window) and the PPS CABAC flag.

use mediainfo_bitstream::{unescape_rbsp, BitReader, ExpGolombReader};
use mediainfo_report::Field;

#[derive(Debug, Clone, Default)]
pub struct SpsInfo {
    pub chroma_format: String,
    pub bit_depth: u8,
    pub ref_frames: u32,
    pub progressive: bool,
    pub has_scan_type: bool,
}

/// Parses an `avcC`-style AVCDecoderConfigurationRecord and returns the
/// profile string plus the derived report fields (chroma, bit depth, scan
/// type, reference frames, CABAC/format-settings summary).
pub fn parse_avc_config(payload: &[u8]) -> Option<(String, Vec<Field>)> {
    if payload.len() < 7 {
        return None;
    }
    let profile_id = payload[1];
    let level_id = payload[3];
    let profile = map_avc_profile(profile_id);
    let level = format_avc_level(level_id);
    let mut fields = Vec::new();
    if !profile.is_empty() {
        if !level.is_empty() {
            fields.push(Field::new("Format profile", format!("{profile}@{level}")));
        } else {
            fields.push(Field::new("Format profile", profile.clone()));
        }
    }

    let sps_count = (payload[5] & 0x1F) as usize;
    let mut offset = 6usize;
    let mut sps_info = SpsInfo::default();
    let mut cabac: Option<bool> = None;

    if sps_count > 0 && offset + 2 <= payload.len() {
        let sps_len = ((payload[offset] as usize) << 8) | payload[offset + 1] as usize;
        offset += 2;
        if sps_len > 0 && offset + sps_len <= payload.len() {
            sps_info = parse_sps(&payload[offset..offset + sps_len]);
        }
        offset += sps_len;
    }

    if offset < payload.len() {
        let pps_count = payload[offset];
        offset += 1;
        if pps_count > 0 && offset + 2 <= payload.len() {
            let pps_len = ((payload[offset] as usize) << 8) | payload[offset + 1] as usize;
            offset += 2;
            if pps_len > 0 && offset + pps_len <= payload.len() {
                cabac = parse_pps_cabac(&payload[offset..offset + pps_len]);
            }
        }
    }

    if !sps_info.chroma_format.is_empty() {
        fields.push(Field::new("Chroma subsampling", sps_info.chroma_format.clone()));
    }
    if sps_info.bit_depth > 0 {
        fields.push(Field::new("Bit depth", format!("{} bits", sps_info.bit_depth)));
    }
    if sps_info.has_scan_type {
        fields.push(Field::new(
            "Scan type",
            if sps_info.progressive { "Progressive" } else { "Interlaced" },
        ));
    }
    if sps_info.ref_frames > 0 {
        fields.push(Field::new(
            "Format settings, Reference frames",
            format!("{} frames", sps_info.ref_frames),
        ));
    }
    if let Some(cabac) = cabac {
        fields.push(Field::new("Format settings, CABAC", if cabac { "Yes" } else { "No" }));
        if sps_info.ref_frames > 0 {
            fields.push(Field::new(
                "Format settings",
                format!("CABAC / {} Ref Frames", sps_info.ref_frames),
            ));
        } else {
            fields.push(Field::new("Format settings", "CABAC"));
        }
    }

    Some((profile, fields))
}

fn parse_sps(nal: &[u8]) -> SpsInfo {
    if nal.is_empty() {
        return SpsInfo::default();
    }
    let rbsp = unescape_rbsp(&nal[1..]);
    let mut bits = BitReader::new(&rbsp);
    let profile_id = bits.read(8);
    bits.skip(8); // constraint flags + reserved
    bits.skip(8); // level_idc
    let mut eg = ExpGolombReader::new(&mut bits);
    eg.read_ue(); // seq_parameter_set_id

    let mut chroma_format_idc = 1u32;
    let mut bit_depth = 8u8;

    if is_high_profile(profile_id as u8) {
        chroma_format_idc = eg.read_ue();
        if chroma_format_idc == 3 {
            eg.read(1);
        }
        let bit_depth_luma = eg.read_ue() + 8;
        eg.read_ue(); // bit_depth_chroma_minus8
        eg.read(1); // qpprime_y_zero_transform_bypass_flag
        bit_depth = bit_depth_luma as u8;
        if eg.read_bool() {
            for _ in 0..8 {
                if eg.read_bool() {
                    skip_scaling_list(&mut eg, 16);
                }
            }
        }
    }

    eg.read_ue(); // log2_max_frame_num_minus4
    let poc_type = eg.read_ue();
    if poc_type == 0 {
        eg.read_ue();
    } else if poc_type == 1 {
        eg.read(1);
        eg.read_se();
        eg.read_se();
        let num_ref = eg.read_ue();
        for _ in 0..num_ref {
            eg.read_se();
        }
    }

    let ref_frames = eg.read_ue();
    eg.read(1); // gaps_in_frame_num_value_allowed_flag
    eg.read_ue(); // pic_width_in_mbs_minus1
    eg.read_ue(); // pic_height_in_map_units_minus1
    let frame_mbs_only = eg.read(1);
    let progressive = frame_mbs_only == 1;
    if frame_mbs_only == 0 {
        eg.read(1); // mb_adaptive_frame_field_flag
    }
    eg.read(1); // direct_8x8_inference_flag
    let crop_flag = eg.read_bool();
    if crop_flag {
        eg.read_ue();
        eg.read_ue();
        eg.read_ue();
        eg.read_ue();
    }

    SpsInfo {
        chroma_format: chroma_format_string(chroma_format_idc),
        bit_depth,
        ref_frames,
        progressive,
        has_scan_type: true,
    }
}

fn parse_pps_cabac(nal: &[u8]) -> Option<bool> {
    if nal.is_empty() {
        return None;
    }
    let rbsp = unescape_rbsp(&nal[1..]);
    let mut bits = BitReader::new(&rbsp);
    let mut eg = ExpGolombReader::new(&mut bits);
    eg.read_ue(); // pic_parameter_set_id
    eg.read_ue(); // seq_parameter_set_id
    let flag = eg.read_bool();
    if !eg.ok() {
        return None;
    }
    Some(flag)
}

fn skip_scaling_list(eg: &mut ExpGolombReader<'_, '_>, size: usize) {
    let mut last = 8i32;
    let mut next = 8i32;
    for _ in 0..size {
        if next != 0 {
            let delta = eg.read_se();
            next = (last + delta + 256) % 256;
        }
        if next != 0 {
            last = next;
        }
    }
}

fn is_high_profile(profile_id: u8) -> bool {
    matches!(
        profile_id,
        100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134
    )
}

fn chroma_format_string(id: u32) -> String {
    match id {
        0 => "4:0:0",
        1 => "4:2:0",
        2 => "4:2:2",
        3 => "4:4:4",
        _ => "",
    }
    .to_string()
}

fn map_avc_profile(id: u8) -> String {
    match id {
        66 => "Baseline",
        77 => "Main",
        88 => "Extended",
        100 => "High",
        110 => "High 10",
        122 => "High 4:2:2",
        244 => "High 4:4:4 Predictive",
        _ => "",
    }
    .to_string()
}

fn format_avc_level(level_id: u8) -> String {
    if level_id == 0 {
        return String::new();
    }
    format!("L{}.{}", level_id / 10, level_id % 10)
}

/// Extracts the x264 writing-library and encoding-settings strings from an
/// SEI user-data payload, matching the reference implementation's
/// `findX264Info`: look for the literal `"x264 - core"` marker, split the
/// leading `"x264 - <version> - ..."` header, and re-join the `options:`
/// tail's tokens with `" / "`.
pub fn x264_info(data: &[u8]) -> Option<(String, String)> {
    let text = String::from_utf8_lossy(data);
    let idx = text.find("x264 - core")?;
    let mut s = &text[idx..];
    if let Some(end) = s.find('\0') {
        s = &s[..end];
    }

    let mut writing_lib = String::new();
    if let Some(rest) = s.strip_prefix("x264 - ") {
        if let Some((first, _)) = rest.split_once(" - ") {
            writing_lib = format!("x264 {}", first.trim());
        } else {
            writing_lib = format!("x264 {}", rest.trim());
        }
    }

    let mut encoding = String::new();
    if let Some(idx) = s.find("options:") {
        let opts = s[idx + "options:".len()..].trim();
        if !opts.is_empty() {
            encoding = opts.split_whitespace().collect::<Vec<_>>().join(" / ");
        }
    }

    Some((writing_lib, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_profile_id_detection() {
        assert!(is_high_profile(100));
        assert!(!is_high_profile(66));
    }

    #[test]
    fn avc_level_formats_as_major_dot_minor() {
        assert_eq!(format_avc_level(31), "L3.1");
        assert_eq!(format_avc_level(40), "L4.0");
    }

    #[test]
    fn x264_info_splits_version_and_options() {
        let data = b"junk x264 - core 164 - H.264/MPEG-4 AVC codec - options: cabac=1 ref=3\0trailer";
        let (lib, opts) = x264_info(data).unwrap();
        assert_eq!(lib, "x264 core 164");
        assert_eq!(opts, "cabac=1 / ref=3");
    }
}
