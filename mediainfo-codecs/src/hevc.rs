//! HEVC SPS/VPS parsing: profile-tier-level, chroma format, bit depth,
//! conformance-window cropping, short-term RPS walk, scaling-list
//! skipping, and VUI (colour description + `time_scale`/`num_units_in_tick`
//! frame-rate derivation — note HEVC's convention differs from AVC's,
//! which divides by an extra factor of 2 for field-based counting).

use mediainfo_bitstream::{unescape_rbsp, BitReader, ExpGolombReader};

#[derive(Debug, Clone, Default)]
pub struct HevcSpsInfo {
    pub profile_idc: u8,
    pub tier_flag: bool,
    pub level_idc: u8,
    pub chroma_format: String,
    pub bit_depth_luma: u8,
    pub bit_depth_chroma: u8,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub colour_primaries: Option<u8>,
    pub transfer_characteristics: Option<u8>,
    pub matrix_coefficients: Option<u8>,
    pub full_range: bool,
}

pub fn parse_sps(nal: &[u8]) -> Option<HevcSpsInfo> {
    if nal.len() < 3 {
        return None;
    }
    // 2-byte NAL header precedes the RBSP for Annex-B/hvcC-extracted NALs.
    let rbsp = unescape_rbsp(&nal[2..]);
    let mut bits = BitReader::new(&rbsp);

    bits.skip(4); // sps_video_parameter_set_id
    let max_sub_layers_minus1 = bits.read(3) as u32;
    bits.skip(1); // sps_temporal_id_nesting_flag

    let (profile_idc, tier_flag, level_idc) = parse_profile_tier_level(&mut bits, max_sub_layers_minus1);

    let mut eg = ExpGolombReader::new(&mut bits);
    eg.read_ue(); // sps_seq_parameter_set_id
    let chroma_format_idc = eg.read_ue();
    if chroma_format_idc == 3 {
        eg.read(1); // separate_colour_plane_flag
    }
    let mut width = eg.read_ue();
    let mut height = eg.read_ue();
    if eg.read_bool() {
        // conformance_window_flag
        let sub_width_c = if chroma_format_idc == 1 || chroma_format_idc == 2 { 2 } else { 1 };
        let sub_height_c = if chroma_format_idc == 1 { 2 } else { 1 };
        let left = eg.read_ue();
        let right = eg.read_ue();
        let top = eg.read_ue();
        let bottom = eg.read_ue();
        width = width.saturating_sub(sub_width_c * (left + right));
        height = height.saturating_sub(sub_height_c * (top + bottom));
    }
    let bit_depth_luma = eg.read_ue() as u8 + 8;
    let bit_depth_chroma = eg.read_ue() as u8 + 8;
    let log2_max_poc_lsb = eg.read_ue() + 4;
    let sub_layer_ordering_info_present = eg.read_bool();
    let start = if sub_layer_ordering_info_present { 0 } else { max_sub_layers_minus1 };
    for _ in start..=max_sub_layers_minus1 {
        eg.read_ue(); // sps_max_dec_pic_buffering_minus1
        eg.read_ue(); // sps_max_num_reorder_pics
        eg.read_ue(); // sps_max_latency_increase_plus1
    }
    eg.read_ue(); // log2_min_luma_coding_block_size_minus3
    eg.read_ue(); // log2_diff_max_min_luma_coding_block_size
    eg.read_ue(); // log2_min_luma_transform_block_size_minus2
    eg.read_ue(); // log2_diff_max_min_luma_transform_block_size
    eg.read_ue(); // max_transform_hierarchy_depth_inter
    eg.read_ue(); // max_transform_hierarchy_depth_intra
    if eg.read_bool() {
        // scaling_list_enabled_flag
        if eg.read_bool() {
            // sps_scaling_list_data_present_flag
            skip_scaling_list_data(&mut eg);
        }
    }
    eg.read(1); // amp_enabled_flag
    eg.read(1); // sample_adaptive_offset_enabled_flag
    if eg.read_bool() {
        // pcm_enabled_flag
        eg.read(4);
        eg.read(4);
        eg.read_ue();
        eg.read_ue();
        eg.read(1);
    }

    let num_short_term_ref_pic_sets = eg.read_ue();
    let mut num_delta_pocs = Vec::with_capacity(num_short_term_ref_pic_sets as usize);
    for idx in 0..num_short_term_ref_pic_sets {
        let count = parse_short_term_ref_pic_set(&mut eg, idx, num_short_term_ref_pic_sets, &num_delta_pocs);
        num_delta_pocs.push(count);
        if !eg.ok() {
            break;
        }
    }

    if eg.read_bool() {
        // long_term_ref_pics_present_flag
        let num_long_term = eg.read_ue();
        for _ in 0..num_long_term {
            eg.read(log2_max_poc_lsb);
            eg.read(1);
        }
    }
    eg.read(1); // sps_temporal_mvp_enabled_flag
    eg.read(1); // strong_intra_smoothing_enabled_flag

    let mut info = HevcSpsInfo {
        profile_idc,
        tier_flag,
        level_idc,
        chroma_format: chroma_format_string(chroma_format_idc),
        bit_depth_luma,
        bit_depth_chroma,
        width,
        height,
        ..Default::default()
    };

    if eg.read_bool() {
        // vui_parameters_present_flag
        parse_vui(&mut eg, &mut info);
    }

    if !eg.ok() {
        return None;
    }
    Some(info)
}

fn parse_profile_tier_level(bits: &mut BitReader, max_sub_layers_minus1: u32) -> (u8, bool, u8) {
    bits.skip(2); // general_profile_space
    let tier_flag = bits.read(1) == 1;
    let profile_idc = bits.read(5) as u8;
    bits.skip(32); // general_profile_compatibility_flag[32]
    bits.skip(1); // general_progressive_source_flag
    bits.skip(1); // general_interlaced_source_flag
    bits.skip(1); // general_non_packed_constraint_flag
    bits.skip(1); // general_frame_only_constraint_flag
    bits.skip(44); // reserved / constraint flags
    let level_idc = bits.read(8) as u8;

    let mut sub_layer_profile_present = Vec::with_capacity(max_sub_layers_minus1 as usize);
    let mut sub_layer_level_present = Vec::with_capacity(max_sub_layers_minus1 as usize);
    for _ in 0..max_sub_layers_minus1 {
        sub_layer_profile_present.push(bits.read(1) == 1);
        sub_layer_level_present.push(bits.read(1) == 1);
    }
    if max_sub_layers_minus1 > 0 {
        for _ in max_sub_layers_minus1..8 {
            bits.skip(2); // reserved_zero_2bits
        }
    }
    for i in 0..max_sub_layers_minus1 as usize {
        if sub_layer_profile_present[i] {
            bits.skip(2 + 1 + 5 + 32 + 4 * 11);
        }
        if sub_layer_level_present[i] {
            bits.skip(8);
        }
    }
    (profile_idc, tier_flag, level_idc)
}

fn skip_scaling_list_data(eg: &mut ExpGolombReader<'_, '_>) {
    for size_id in 0..4 {
        let step = if size_id == 3 { 3 } else { 1 };
        let mut matrix_id = 0;
        while matrix_id < 6 {
            if !eg.read_bool() {
                // scaling_list_pred_mode_flag == 0
                eg.read_ue(); // scaling_list_pred_matrix_id_delta
            } else {
                let coef_num = 64usize.min(1usize << (4 + (size_id << 1)));
                if size_id > 1 {
                    eg.read_se(); // scaling_list_dc_coef_minus8
                }
                for _ in 0..coef_num {
                    eg.read_se(); // scaling_list_delta_coef
                }
            }
            matrix_id += step;
        }
    }
}

fn parse_short_term_ref_pic_set(
    eg: &mut ExpGolombReader<'_, '_>,
    idx: u32,
    num_sets: u32,
    num_delta_pocs: &[u32],
) -> u32 {
    let inter_pred = if idx != 0 { eg.read_bool() } else { false };
    if inter_pred {
        if idx == num_sets {
            eg.read_ue(); // delta_idx_minus1
        }
        eg.read(1); // delta_rps_sign
        eg.read_ue(); // abs_delta_rps_minus1
        let ref_count = num_delta_pocs.last().copied().unwrap_or(0);
        let mut count = 0u32;
        for _ in 0..=ref_count {
            let used = eg.read_bool();
            if !used {
                eg.read(1); // use_delta_flag
            }
            count += 1;
        }
        count
    } else {
        let num_negative = eg.read_ue();
        let num_positive = eg.read_ue();
        for _ in 0..num_negative {
            eg.read_ue();
            eg.read(1);
        }
        for _ in 0..num_positive {
            eg.read_ue();
            eg.read(1);
        }
        num_negative + num_positive
    }
}

fn parse_vui(eg: &mut ExpGolombReader<'_, '_>, info: &mut HevcSpsInfo) {
    if eg.read_bool() {
        // aspect_ratio_info_present_flag
        let idc = eg.read(8);
        if idc == 255 {
            eg.read(16);
            eg.read(16);
        }
    }
    if eg.read_bool() {
        eg.read(1); // overscan_appropriate_flag
    }
    if eg.read_bool() {
        // video_signal_type_present_flag
        eg.read(3); // video_format
        info.full_range = eg.read_bool();
        if eg.read_bool() {
            // colour_description_present_flag
            info.colour_primaries = Some(eg.read(8) as u8);
            info.transfer_characteristics = Some(eg.read(8) as u8);
            info.matrix_coefficients = Some(eg.read(8) as u8);
        }
    }
    if eg.read_bool() {
        // chroma_loc_info_present_flag
        eg.read_ue();
        eg.read_ue();
    }
    eg.read(1); // neutral_chroma_indication_flag
    eg.read(1); // field_seq_flag
    eg.read(1); // frame_field_info_present_flag
    if eg.read_bool() {
        // default_display_window_flag
        eg.read_ue();
        eg.read_ue();
        eg.read_ue();
        eg.read_ue();
    }
    if eg.read_bool() {
        // vui_timing_info_present_flag
        let num_units_in_tick = eg.read(32);
        let time_scale = eg.read(32);
        // HEVC's VUI frame rate is time_scale / num_units_in_tick directly,
        // unlike AVC's convention of dividing by an extra factor of 2.
        if num_units_in_tick > 0 {
            info.frame_rate = time_scale as f64 / num_units_in_tick as f64;
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_string_table() {
        assert_eq!(chroma_format_string(1), "4:2:0");
        assert_eq!(chroma_format_string(3), "4:4:4");
    }
}
