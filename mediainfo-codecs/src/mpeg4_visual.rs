//! MPEG-4 Visual (DivX/Xvid) VOL header parsing: chroma, interlacing,
//! quarter-pel, GMC, custom quantization matrix, and profile/level from the
//! visual-object-sequence start code.

use mediainfo_bitstream::BitReader;

#[derive(Debug, Clone, Default)]
pub struct Mpeg4VisualInfo {
    pub profile: String,
    pub b_vop: bool,
    pub qpel: bool,
    pub gmc: String,
    pub matrix: String,
    pub color_space: String,
    pub chroma_subsampling: String,
    pub bit_depth: String,
    pub scan_type: String,
    pub writing_library: String,
}

struct StartCode {
    pos: usize,
    code: u8,
}

fn find_start_codes(data: &[u8]) -> Vec<StartCode> {
    let mut codes = Vec::new();
    let mut i = 0;
    while i + 3 < data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            codes.push(StartCode { pos: i, code: data[i + 3] });
        }
        i += 1;
    }
    codes
}

pub fn parse_mpeg4_visual(data: &[u8]) -> Mpeg4VisualInfo {
    let mut info = Mpeg4VisualInfo::default();
    let codes = find_start_codes(data);
    for (i, sc) in codes.iter().enumerate() {
        if sc.code == 0xB0 && sc.pos + 4 < data.len() {
            let profile = map_profile(data[sc.pos + 4]);
            if !profile.is_empty() {
                info.profile = profile;
            }
        }
        if sc.code == 0xB2 {
            let end = codes.get(i + 1).map(|n| n.pos).unwrap_or(data.len());
            if sc.pos + 4 < end {
                let value = String::from_utf8_lossy(&data[sc.pos + 4..end]);
                let trimmed = value.trim_matches(|c| c == '\0' || c == '\r' || c == '\n' || c == '\t' || c == ' ');
                if !trimmed.is_empty() {
                    info.writing_library = trimmed.to_string();
                }
            }
        }
        if (0x20..=0x2F).contains(&sc.code) && sc.pos + 4 < data.len() {
            let vol = parse_vol(&data[sc.pos + 4..]);
            if !vol.chroma_subsampling.is_empty() {
                info.chroma_subsampling = vol.chroma_subsampling;
                info.color_space = "YUV".to_string();
            }
            if !vol.bit_depth.is_empty() {
                info.bit_depth = vol.bit_depth;
            }
            if !vol.scan_type.is_empty() {
                info.scan_type = vol.scan_type;
            }
            if !vol.matrix.is_empty() {
                info.matrix = vol.matrix;
            }
            info.qpel = vol.qpel;
            info.gmc = vol.gmc;
        }
        if sc.code == 0xB6 && sc.pos + 4 < data.len() {
            let vop_type = (data[sc.pos + 4] >> 6) & 0x03;
            if vop_type == 2 {
                info.b_vop = true;
            }
        }
    }
    if info.gmc.is_empty() {
        info.gmc = "No warppoints".to_string();
    }
    if info.matrix.is_empty() {
        info.matrix = "Default (H.263)".to_string();
    }
    if info.chroma_subsampling.is_empty() {
        info.chroma_subsampling = "4:2:0".to_string();
        info.color_space = "YUV".to_string();
    }
    if info.bit_depth.is_empty() {
        info.bit_depth = "8 bits".to_string();
    }
    if info.scan_type.is_empty() {
        info.scan_type = "Progressive".to_string();
    }
    info
}

#[derive(Default)]
struct VolInfo {
    chroma_subsampling: String,
    bit_depth: String,
    scan_type: String,
    qpel: bool,
    gmc: String,
    matrix: String,
}

fn parse_vol(data: &[u8]) -> VolInfo {
    let mut br = BitReader::new(data);
    br.skip(1); // random_accessible_vol
    br.skip(8); // video_object_type_indication
    if br.read_bool() {
        br.skip(4);
        br.skip(3);
    }
    let aspect_ratio_info = br.read(4);
    if aspect_ratio_info == 15 {
        br.skip(16);
    }
    let mut chroma_format = 1u64;
    if br.read_bool() {
        chroma_format = br.read(2);
        br.skip(1);
        if br.read_bool() {
            br.skip(15);
            br.skip(1);
            br.skip(15);
            br.skip(1);
            br.skip(15);
            br.skip(1);
            br.skip(3);
            br.skip(11);
            br.skip(1);
            br.skip(15);
            br.skip(1);
        }
    }
    br.skip(2); // video_object_layer_shape
    br.skip(1); // marker
    let vop_time_increment_resolution = br.read(16);
    br.skip(1); // marker
    if br.read_bool() {
        let bits = bit_length(vop_time_increment_resolution.saturating_sub(1));
        br.skip(bits as u32);
    }
    br.skip(1); // marker
    br.skip(13); // width
    br.skip(1);
    br.skip(13); // height
    br.skip(1);
    let interlaced = br.read_bool();
    br.skip(1); // obmc_disable
    let sprite_enable = br.read(1);
    let quant_type = br.read(1);
    if quant_type == 1 {
        if br.read_bool() {
            skip_quant_matrix(&mut br);
        }
        if br.read_bool() {
            skip_quant_matrix(&mut br);
        }
    }
    let quarter_sample = br.read(1);

    VolInfo {
        chroma_subsampling: map_chroma(chroma_format),
        bit_depth: "8 bits".to_string(),
        scan_type: if interlaced { "Interlaced" } else { "Progressive" }.to_string(),
        qpel: quarter_sample == 1,
        gmc: if sprite_enable == 0 { "No warppoints" } else { "1 warppoint" }.to_string(),
        matrix: if quant_type == 0 { "Default (H.263)" } else { "Custom" }.to_string(),
    }
}

fn bit_length(mut value: u64) -> u32 {
    let mut bits = 0;
    while value > 0 {
        bits += 1;
        value >>= 1;
    }
    bits.max(1)
}

fn skip_quant_matrix(br: &mut BitReader) {
    let mut last = 8i32;
    for _ in 0..64 {
        if last == 0 {
            return;
        }
        last = br.read(8) as i32;
    }
}

fn map_chroma(value: u64) -> String {
    match value {
        1 => "4:2:0",
        2 => "4:2:2",
        3 => "4:4:4",
        _ => "",
    }
    .to_string()
}

fn map_profile(value: u8) -> String {
    match value {
        0x01 => "Simple@L1",
        0x02 => "Simple@L2",
        0x03 => "Simple@L3",
        0x04 => "Simple@L4",
        0x05 => "Simple@L5",
        0xF1 => "Advanced Simple@L0",
        0xF2 => "Advanced Simple@L1",
        0xF3 => "Advanced Simple@L2",
        0xF4 => "Advanced Simple@L3",
        0xF5 => "Advanced Simple@L4",
        0xF6 => "Advanced Simple@L5",
        0xF7 => "Advanced Simple@L3b",
        _ => "",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_table_lookup() {
        assert_eq!(map_profile(0xF2), "Advanced Simple@L1");
        assert_eq!(map_profile(0x01), "Simple@L1");
    }

    #[test]
    fn defaults_applied_when_no_vol_found() {
        let info = parse_mpeg4_visual(&[0, 0, 0]);
        assert_eq!(info.chroma_subsampling, "4:2:0");
        assert_eq!(info.scan_type, "Progressive");
        assert_eq!(info.matrix, "Default (H.263)");
    }
}
