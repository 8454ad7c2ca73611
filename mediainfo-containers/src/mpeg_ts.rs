//! §4.3.c MPEG Transport Stream. Fixed 188-byte packets, optionally
//! prefixed with a 4-byte BDAV timestamp (auto-detected the same way as
//! [`crate::detect`]). Demultiplexes PAT/PMT to discover elementary
//! streams, accumulates PES-level PTS per PID, and hands each PID's first
//! captured payload to the matching codec-header parser.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use mediainfo_bitstream::unescape_rbsp;
use mediainfo_codecs::{aac, ac3, captions, dts, h264, hevc, mp3_frame, mpeg2_video};
use mediainfo_report::{
    format_bitrate, format_bitrate_kbps, format_channels, format_duration, format_sample_rate,
    BitrateMode, ContainerInfo, Field, Stream, StreamKind,
};

use crate::common::{estimate_frame_rate, ContainerOutput, PtsPolicy, PtsTracker};

const PACKET_LEN: usize = 188;
const SYNC_BYTE: u8 = 0x47;

struct TsLayout {
    prefix: usize,
    stride: usize,
}

fn detect_layout(data: &[u8]) -> Option<TsLayout> {
    for prefix in [0usize, 4usize] {
        let stride = prefix + PACKET_LEN;
        let needed = prefix + PACKET_LEN * 3;
        if data.len() >= needed
            && data[prefix] == SYNC_BYTE
            && data[prefix + PACKET_LEN] == SYNC_BYTE
            && data[prefix + PACKET_LEN * 2] == SYNC_BYTE
        {
            return Some(TsLayout { prefix, stride });
        }
    }
    None
}

struct TsPacket<'a> {
    pid: u16,
    pusi: bool,
    payload: &'a [u8],
}

fn parse_packet(raw: &[u8]) -> Option<TsPacket<'_>> {
    if raw.len() < PACKET_LEN || raw[0] != SYNC_BYTE {
        return None;
    }
    let header = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let pusi = (header & 0x0040_0000) != 0;
    let pid = ((header >> 8) & 0x1FFF) as u16;
    let adaptation_field_control = (raw[3] >> 4) & 0x03;
    let mut pos = 4usize;
    if adaptation_field_control == 2 {
        return Some(TsPacket { pid, pusi, payload: &[] });
    }
    if adaptation_field_control == 3 {
        if pos >= raw.len() {
            return None;
        }
        let af_len = raw[pos] as usize;
        pos += 1 + af_len;
    }
    if pos > raw.len() {
        return None;
    }
    Some(TsPacket { pid, pusi, payload: &raw[pos..] })
}

#[derive(Default)]
struct PmtEntry {
    pid: u16,
    stream_type: u8,
    language: Option<String>,
    dvb_subtitle: bool,
    subtitling_type: u8,
}

/// Parses a single PAT or PMT section assumed to fit in one TS packet's
/// payload (the common case for broadcast/remux PSI tables).
fn parse_pat(payload: &[u8]) -> Option<u16> {
    let pointer = *payload.first()? as usize;
    let data = payload.get(1 + pointer..)?;
    if data.len() < 8 || data[0] != 0x00 {
        return None;
    }
    let section_length = (((data[1] & 0x0F) as usize) << 8) | data[2] as usize;
    let body = data.get(8..3 + section_length.saturating_sub(4))?;
    let mut pos = 0usize;
    while pos + 4 <= body.len() {
        let program_number = u16::from_be_bytes([body[pos], body[pos + 1]]);
        let pid = u16::from_be_bytes([body[pos + 2], body[pos + 3]]) & 0x1FFF;
        pos += 4;
        if program_number != 0 {
            return Some(pid);
        }
    }
    None
}

fn parse_pmt(payload: &[u8]) -> Option<Vec<PmtEntry>> {
    let pointer = *payload.first()? as usize;
    let data = payload.get(1 + pointer..)?;
    if data.len() < 12 || data[0] != 0x02 {
        return None;
    }
    let section_length = (((data[1] & 0x0F) as usize) << 8) | data[2] as usize;
    let program_info_length = (((data[10] & 0x0F) as usize) << 8) | data[11] as usize;
    let mut pos = 12 + program_info_length;
    let end = (3 + section_length).saturating_sub(4).min(data.len());
    let mut entries = Vec::new();
    while pos + 5 <= end {
        let stream_type = data[pos];
        let pid = u16::from_be_bytes([data[pos + 1], data[pos + 2]]) & 0x1FFF;
        let es_info_length = (((data[pos + 3] & 0x0F) as usize) << 8) | data[pos + 4] as usize;
        let descriptors = data.get(pos + 5..pos + 5 + es_info_length).unwrap_or(&[]);
        let mut entry = PmtEntry {
            pid,
            stream_type,
            ..Default::default()
        };
        parse_descriptors(descriptors, &mut entry);
        entries.push(entry);
        pos += 5 + es_info_length;
    }
    Some(entries)
}

fn parse_descriptors(data: &[u8], entry: &mut PmtEntry) {
    let mut pos = 0usize;
    while pos + 2 <= data.len() {
        let tag = data[pos];
        let len = data[pos + 1] as usize;
        let body = data.get(pos + 2..pos + 2 + len).unwrap_or(&[]);
        if tag == 0x59 && body.len() >= 4 {
            entry.language = Some(String::from_utf8_lossy(&body[0..3]).to_string());
            entry.subtitling_type = body[3];
            entry.dvb_subtitle = true;
        }
        pos += 2 + len;
    }
}

fn stream_type_format(stream_type: u8) -> Option<(&'static str, StreamKind)> {
    match stream_type {
        0x02 => Some(("MPEG Video", StreamKind::Video)),
        0x1B => Some(("AVC", StreamKind::Video)),
        0x24 => Some(("HEVC", StreamKind::Video)),
        0x10 => Some(("MPEG-4 Visual", StreamKind::Video)),
        0x03 | 0x04 => Some(("MPEG Audio", StreamKind::Audio)),
        0x0F => Some(("AAC", StreamKind::Audio)),
        0x81 => Some(("AC-3", StreamKind::Audio)),
        0x82 => Some(("DTS", StreamKind::Audio)),
        0x86 => Some(("SCTE-35", StreamKind::Text)),
        0x06 => Some(("DVB Subtitle", StreamKind::Text)),
        _ => None,
    }
}

struct PidState {
    stream_type: u8,
    kind: StreamKind,
    language: Option<String>,
    dvb_subtitle: bool,
    subtitling_type: u8,
    pts: PtsTracker,
    byte_count: i64,
    captured_payload: Option<Vec<u8>>,
    pending_pes: Vec<u8>,
    frame_count: u64,
    gop: mpeg2_video::GopCadenceTracker,
    xds: captions::Eia608XdsDecoder,
    header_overhead_bytes: i64,
}

impl PidState {
    fn new(stream_type: u8, kind: StreamKind, language: Option<String>, dvb_subtitle: bool, subtitling_type: u8) -> Self {
        PidState {
            stream_type,
            kind,
            language,
            dvb_subtitle,
            subtitling_type,
            pts: PtsTracker::new(PtsPolicy::Segmented {
                reset_threshold_ticks: 90_000 * 5,
            }),
            byte_count: 0,
            captured_payload: None,
            pending_pes: Vec::new(),
            frame_count: 0,
            gop: mpeg2_video::GopCadenceTracker::default(),
            xds: captions::Eia608XdsDecoder::new(),
            header_overhead_bytes: 0,
        }
    }
}

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let mut data = Vec::with_capacity(size as usize);
    if reader.read_to_end(&mut data).is_err() {
        return ContainerOutput::mismatch();
    }
    let Some(layout) = detect_layout(&data) else {
        return ContainerOutput::mismatch();
    };

    let mut pmt_pid: Option<u16> = None;
    let mut pid_states: HashMap<u16, PidState> = HashMap::new();
    let mut pending_entries: Option<Vec<PmtEntry>> = None;

    let mut offset = layout.prefix;
    while offset + PACKET_LEN <= data.len() {
        let raw = &data[offset..offset + PACKET_LEN];
        offset += layout.stride;
        let Some(packet) = parse_packet(raw) else { continue };

        if packet.pid == 0x0000 && packet.pusi {
            if let Some(pid) = parse_pat(packet.payload) {
                pmt_pid = Some(pid);
            }
            continue;
        }
        if Some(packet.pid) == pmt_pid && packet.pusi {
            if let Some(entries) = parse_pmt(packet.payload) {
                pending_entries = Some(entries);
            }
            continue;
        }

        if let Some(entries) = pending_entries.take() {
            for entry in entries {
                let (default_name, kind) = stream_type_format(entry.stream_type)
                    .unwrap_or(("", StreamKind::Text));
                let kind = if entry.dvb_subtitle { StreamKind::Text } else { kind };
                if default_name.is_empty() && !entry.dvb_subtitle {
                    continue;
                }
                pid_states.entry(entry.pid).or_insert_with(|| {
                    PidState::new(entry.stream_type, kind, entry.language.clone(), entry.dvb_subtitle, entry.subtitling_type)
                });
            }
        }

        let Some(state) = pid_states.get_mut(&packet.pid) else { continue };
        state.byte_count += packet.payload.len() as i64;

        if packet.pusi {
            if let Some(pts) = extract_pts(&state.pending_pes) {
                state.pts.observe(pts);
            }
            if state.captured_payload.is_none() {
                if let Some(payload) = pes_payload(&state.pending_pes) {
                    state.captured_payload = Some(payload.to_vec());
                }
            }
            state.pending_pes.clear();
        }
        state.pending_pes.extend_from_slice(packet.payload);

        if state.kind == StreamKind::Video && state.stream_type == 0x02 {
            accumulate_mpeg2(state, packet.payload);
        }
    }
    // flush the last in-flight PES for the final PID touched
    for state in pid_states.values_mut() {
        if let Some(pts) = extract_pts(&state.pending_pes) {
            state.pts.observe(pts);
        }
        if state.captured_payload.is_none() {
            if let Some(payload) = pes_payload(&state.pending_pes) {
                state.captured_payload = Some(payload.to_vec());
            }
        }
    }

    let mut streams = Vec::new();
    let mut longest_duration = 0.0f64;
    for (pid, state) in pid_states.into_iter() {
        let d = state.pts.duration_total_seconds();
        if d > longest_duration {
            longest_duration = d;
        }
        streams.push(build_stream(pid, &state));
    }

    let mut info = ContainerInfo::default();
    info.duration_seconds = longest_duration;

    let mut general_fields = vec![Field::new("Format", "MPEG-TS")];
    if info.has_duration() {
        general_fields.push(Field::new("Duration", format_duration(info.duration_seconds)));
    }

    ContainerOutput {
        info,
        streams,
        general_fields,
        ok: true,
    }
}

/// Looks for a PES start code `00 00 01` followed by a stream id at the
/// front of a reassembled payload and, if `PES_header_flags` (byte offset
/// 7, bit 7 of the flags byte) marks a PTS, decodes the 5-byte 90 kHz PTS
/// field.
fn extract_pts(pes: &[u8]) -> Option<u64> {
    if pes.len() < 14 || pes[0..3] != [0x00, 0x00, 0x01] {
        return None;
    }
    let flags = pes[7];
    if flags & 0x80 == 0 {
        return None;
    }
    let b = &pes[9..14];
    let pts = (((b[0] >> 1) & 0x07) as u64) << 30
        | (b[1] as u64) << 22
        | (((b[2] >> 1) & 0x7F) as u64) << 15
        | (b[3] as u64) << 7
        | ((b[4] >> 1) as u64);
    Some(pts)
}

fn pes_payload(pes: &[u8]) -> Option<&[u8]> {
    if pes.len() < 9 || pes[0..3] != [0x00, 0x00, 0x01] {
        return None;
    }
    let header_data_len = *pes.get(8)? as usize;
    let start = 9 + header_data_len;
    pes.get(start..)
}

const USER_DATA_START_CODE: u8 = 0xB2;

fn accumulate_mpeg2(state: &mut PidState, payload: &[u8]) {
    let mut i = 0usize;
    while i + 4 <= payload.len() {
        if payload[i] == 0 && payload[i + 1] == 0 && payload[i + 2] == 1 {
            let code = payload[i + 3];
            let body = &payload[i + 4..];
            match code {
                mpeg2_video::SEQUENCE_HEADER_CODE => {
                    state.header_overhead_bytes += mpeg2_video::SEQUENCE_HEADER_BYTES as i64;
                }
                mpeg2_video::SEQUENCE_EXTENSION_CODE => {
                    state.header_overhead_bytes += mpeg2_video::SEQUENCE_EXTENSION_BYTES as i64;
                }
                mpeg2_video::GOP_HEADER_CODE => {
                    state.header_overhead_bytes += mpeg2_video::GOP_HEADER_BYTES as i64;
                }
                0x00 => {
                    if let Some(header) = mpeg2_video::parse_picture_header(body) {
                        state.gop.observe(header.picture_type);
                        state.frame_count += 1;
                    }
                }
                USER_DATA_START_CODE => feed_atsc_user_data(state, body),
                _ => {}
            }
        }
        i += 1;
    }
}

/// ATSC A/53 Part 4 `user_data()`: `"GA94"` identifier, `user_data_type_code
/// == 0x03` (`cc_data()`), then `cc_count` 3-byte triplets of `cc_valid` +
/// `cc_type` + two EIA-608 byte pairs. Only NTSC field-1/2 triplets
/// (`cc_type` 0 or 1) carry line-21 data; DTVCC (`cc_type` 2/3) is left to
/// `captions::dtvcc_service_numbers` at the caller when needed.
fn feed_atsc_user_data(state: &mut PidState, body: &[u8]) {
    if body.len() < 6 || &body[0..4] != b"GA94" || body[4] != 0x03 {
        return;
    }
    let cc_count = (body[5] & 0x1F) as usize;
    let triplets = body.get(7..).unwrap_or(&[]);
    for chunk in triplets.chunks(3).take(cc_count) {
        if chunk.len() < 3 {
            break;
        }
        let cc_valid = (chunk[0] & 0x04) != 0;
        let cc_type = chunk[0] & 0x03;
        if cc_valid && (cc_type == 0 || cc_type == 1) {
            state.xds.feed(chunk[1], chunk[2]);
        }
    }
}

/// ETSI EN 300 468 Table 28 subtitling descriptor `subtitling_type` ranges:
/// `0x10-0x13` plain, `0x20-0x23` 4:3, `0x30-0x33` hearing impaired.
fn dvb_subtitling_type_name(subtitling_type: u8) -> Option<&'static str> {
    match subtitling_type {
        0x10..=0x13 => Some("Subtitling"),
        0x20..=0x23 => Some("Subtitling (4:3)"),
        0x30..=0x33 => Some("Hearing impaired"),
        _ => None,
    }
}

fn build_stream(pid: u16, state: &PidState) -> Stream {
    let mut stream = Stream::new(state.kind);
    stream.append_field_unique(Field::new("ID", pid.to_string()));
    if let Some((name, _)) = stream_type_format(state.stream_type) {
        stream.append_field_unique(Field::new("Format", name));
    }
    if state.dvb_subtitle {
        stream.append_field_unique(Field::new("Format", "DVB Subtitle"));
        if let Some(kind) = dvb_subtitling_type_name(state.subtitling_type) {
            stream.append_field_unique(Field::new("Type", kind));
        }
    }
    if let Some(lang) = &state.language {
        stream.append_field_unique(Field::new("Language", lang.clone()));
    }
    if let Some(title) = &state.xds.program_title {
        stream.append_field_unique(Field::new("Title", title.clone()));
    }
    if let Some(advisory) = &state.xds.content_advisory {
        stream.append_field_unique(Field::new("Content advisory", advisory.clone()));
    }

    if let Some(payload) = &state.captured_payload {
        apply_codec_header(&mut stream, state.stream_type, payload);
    }

    let duration = state.pts.duration_total_seconds();
    if duration > 0.0 {
        stream.append_field_unique(Field::new("Duration", format_duration(duration)));
        if state.byte_count > 0 {
            let bitrate = (state.byte_count as f64 * 8.0) / duration;
            stream.append_field_unique(Field::new("Bit rate", format_bitrate(bitrate)));
            stream.json.insert(
                "BitRateMode".to_string(),
                BitrateMode::Variable.as_str().to_string(),
            );
        }
        stream
            .json
            .insert("Duration".to_string(), format!("{:.3}", duration));
    }
    if state.kind == StreamKind::Video && state.frame_count > 0 && duration > 0.0 {
        let fps = estimate_frame_rate(state.frame_count, duration);
        if fps > 0.0 {
            stream.json.insert("FrameRate".to_string(), format!("{:.3}", fps));
        }
    }
    stream
}

fn apply_codec_header(stream: &mut Stream, stream_type: u8, payload: &[u8]) {
    match stream_type {
        0x02 => {
            if let Some(info) = find_mpeg2_sequence_header(payload) {
                stream.append_field_unique(Field::new("Width", format!("{} pixels", info.width)));
                stream.append_field_unique(Field::new("Height", format!("{} pixels", info.height)));
            }
        }
        0x1B => {
            if let Some(nal) = find_annexb_nal(payload, 7) {
                if let Some(avcc) = build_avcc_from_annexb(&nal, find_annexb_nal(payload, 8).as_deref()) {
                    if let Some((_, fields)) = h264::parse_avc_config(&avcc) {
                        for f in fields {
                            stream.append_field_unique(f);
                        }
                    }
                }
            }
            if let Some((lib, settings)) = h264::x264_info(payload) {
                if !lib.is_empty() {
                    stream.append_field_unique(Field::new("Writing library", lib));
                }
                if !settings.is_empty() {
                    stream.append_field_unique(Field::new("Encoding settings", settings));
                }
            }
        }
        0x24 => {
            if let Some(nal) = find_hevc_nal(payload, 33) {
                if let Some(info) = hevc::parse_sps(&nal) {
                    stream.append_field_unique(Field::new("Width", format!("{} pixels", info.width)));
                    stream.append_field_unique(Field::new("Height", format!("{} pixels", info.height)));
                    stream.append_field_unique(Field::new("Chroma subsampling", info.chroma_format));
                }
            }
        }
        0x81 => {
            if let Some(info) = ac3::parse_ac3_header(payload) {
                stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels)));
                stream.append_field_unique(Field::new("Channel layout", info.layout));
                stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate)));
                stream.append_field_unique(Field::new("Bit rate", format_bitrate_kbps(info.bitrate_kbps)));
            }
        }
        0x82 => {
            if let Some(info) = dts::parse_core_frame(payload) {
                stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels as u64)));
                stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate as f64)));
                if dts::has_extension_sync(payload) {
                    stream.append_field_unique(Field::new("Format", "DTS-HD"));
                    stream.json.insert("BitRateMode".to_string(), BitrateMode::Variable.as_str().to_string());
                } else if let Some(kbps) = info.bitrate_kbps {
                    stream.append_field_unique(Field::new("Bit rate", format_bitrate_kbps(kbps as i64)));
                }
            }
        }
        0x0F => {
            if let Some(info) = aac::parse_adts_header(payload) {
                stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels)));
                stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate)));
                stream.append_field_unique(Field::new("Format profile", info.profile.to_string()));
            }
        }
        0x03 | 0x04 => {
            if let Some(idx) = payload.windows(2).position(|w| w[0] == 0xFF && (w[1] & 0xE0) == 0xE0) {
                if let Some(info) = mp3_frame::parse_header(&payload[idx..]) {
                    stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels as u64)));
                    stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate as f64)));
                    stream.append_field_unique(Field::new("Bit rate", format_bitrate_kbps(info.bitrate_kbps as i64)));
                }
            }
        }
        _ => {}
    }
}

fn find_mpeg2_sequence_header(payload: &[u8]) -> Option<mpeg2_video::SequenceHeaderInfo> {
    let mut i = 0usize;
    while i + 4 <= payload.len() {
        if payload[i..i + 3] == [0, 0, 1] && payload[i + 3] == mpeg2_video::SEQUENCE_HEADER_CODE {
            return mpeg2_video::parse_sequence_header(&payload[i + 4..]);
        }
        i += 1;
    }
    None
}

fn find_annexb_nal(payload: &[u8], nal_type: u8) -> Option<Vec<u8>> {
    let mut i = 0usize;
    while i + 4 <= payload.len() {
        if payload[i..i + 3] == [0, 0, 1] {
            let header = payload.get(i + 3)?;
            if header & 0x1F == nal_type {
                let end = find_next_start_code(payload, i + 4).unwrap_or(payload.len());
                return Some(payload[i + 3..end].to_vec());
            }
        }
        i += 1;
    }
    None
}

fn find_hevc_nal(payload: &[u8], nal_type: u8) -> Option<Vec<u8>> {
    let mut i = 0usize;
    while i + 5 <= payload.len() {
        if payload[i..i + 3] == [0, 0, 1] {
            let header0 = payload[i + 3];
            let this_type = (header0 >> 1) & 0x3F;
            if this_type == nal_type {
                let end = find_next_start_code(payload, i + 4).unwrap_or(payload.len());
                return Some(payload[i + 3..end].to_vec());
            }
        }
        i += 1;
    }
    None
}

fn find_next_start_code(payload: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 3 <= payload.len() {
        if payload[i..i + 3] == [0, 0, 1] {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Synthesizes a minimal single-SPS/single-PPS `avcC` AVCDecoderConfigurationRecord
/// from Annex-B NALs so the shared `h264::parse_avc_config` parser (which
/// is `avcC`-shaped) can be reused for transport-stream AVC, which carries
/// Annex-B rather than length-prefixed NALs.
fn build_avcc_from_annexb(sps_nal: &[u8], pps_nal: Option<&Vec<u8>>) -> Option<Vec<u8>> {
    if sps_nal.len() < 4 {
        return None;
    }
    let rbsp = unescape_rbsp(&sps_nal[1..]);
    if rbsp.len() < 3 {
        return None;
    }
    let mut out = vec![1u8, rbsp[0], rbsp[1], rbsp[2], 0xFF];
    out.push(0xE0 | 1);
    out.extend_from_slice(&(sps_nal.len() as u16).to_be_bytes());
    out.extend_from_slice(sps_nal);
    let pps = pps_nal.cloned().unwrap_or_default();
    out.push(if pps.is_empty() { 0 } else { 1 });
    if !pps.is_empty() {
        out.extend_from_slice(&(pps.len() as u16).to_be_bytes());
        out.extend_from_slice(&pps);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ts_packet(pid: u16, pusi: bool, payload: &[u8]) -> Vec<u8> {
        let mut pkt = vec![0u8; PACKET_LEN];
        pkt[0] = SYNC_BYTE;
        let mut header = ((pid & 0x1FFF) as u32) | 0x1000; // adaptation_field_control=01 (payload only)
        if pusi {
            header |= 0x0040_0000;
        }
        pkt[1] = (header >> 16) as u8;
        pkt[2] = (header >> 8) as u8;
        pkt[3] = header as u8;
        let n = payload.len().min(PACKET_LEN - 4);
        pkt[4..4 + n].copy_from_slice(&payload[..n]);
        pkt
    }

    #[test]
    fn detects_plain_188_byte_stride() {
        let mut data = Vec::new();
        data.extend(ts_packet(0, false, &[]));
        data.extend(ts_packet(0, false, &[]));
        data.extend(ts_packet(0, false, &[]));
        assert!(detect_layout(&data).is_some());
    }

    #[test]
    fn pat_then_pmt_discovers_stream() {
        // PAT: pointer=0, table_id=0, section_length covers one program
        let mut pat_section = vec![0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00];
        pat_section.extend_from_slice(&[0x00, 0x01, 0xE1, 0x00]); // program 1 -> PMT pid 0x100
        pat_section.extend_from_slice(&[0, 0, 0, 0]); // CRC placeholder
        let mut pat_payload = vec![0x00]; // pointer_field
        pat_payload.extend_from_slice(&pat_section);

        let mut pmt_section = vec![0x02, 0xB0, 0x12, 0x00, 0x01, 0xC1, 0x00, 0x00, 0xE1, 0x01, 0xF0, 0x00];
        pmt_section.extend_from_slice(&[0x0F, 0xE1, 0x01, 0xF0, 0x00]); // AAC on pid 0x101
        pmt_section.extend_from_slice(&[0, 0, 0, 0]);
        let mut pmt_payload = vec![0x00];
        pmt_payload.extend_from_slice(&pmt_section);

        let mut data = Vec::new();
        data.extend(ts_packet(0x0000, true, &pat_payload));
        data.extend(ts_packet(0x0100, true, &pmt_payload));
        data.extend(ts_packet(0x0101, true, &[0, 0, 1, 0xC0, 0, 0, 0x80, 0x00, 0x00]));

        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        assert!(out.streams.iter().any(|s| s.kind() == StreamKind::Audio));
    }

    #[test]
    fn non_ts_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 512]);
        let out = parse(&mut cursor, 512);
        assert!(!out.ok);
    }

    #[test]
    fn dvb_subtitle_descriptor_matches_boundary_scenario() {
        // PAT -> PMT pid 0x100; PMT: stream_type=0x06 on pid 0x101 with a
        // subtitling descriptor (tag 0x59) for language "eng", type 0x10.
        let mut pat_section = vec![0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00];
        pat_section.extend_from_slice(&[0x00, 0x01, 0xE1, 0x00]);
        pat_section.extend_from_slice(&[0, 0, 0, 0]);
        let mut pat_payload = vec![0x00];
        pat_payload.extend_from_slice(&pat_section);

        // es_info: descriptor tag=0x59, len=8, "eng" + subtitling_type=0x10 + composition/ancillary page ids
        let descriptor = [0x59, 0x08, b'e', b'n', b'g', 0x10, 0x00, 0x01, 0x00, 0x01];
        let mut pmt_section = vec![0x02, 0xB0, 0x1C, 0x00, 0x01, 0xC1, 0x00, 0x00, 0xE1, 0x01, 0xF0, 0x00];
        pmt_section.push(0x06); // stream_type
        pmt_section.extend_from_slice(&[0xE1, 0x01]); // pid 0x101
        pmt_section.extend_from_slice(&[0xF0, descriptor.len() as u8]);
        pmt_section.extend_from_slice(&descriptor);
        pmt_section.extend_from_slice(&[0, 0, 0, 0]);
        let mut pmt_payload = vec![0x00];
        pmt_payload.extend_from_slice(&pmt_section);

        let mut data = Vec::new();
        data.extend(ts_packet(0x0000, true, &pat_payload));
        data.extend(ts_packet(0x0100, true, &pmt_payload));
        data.extend(ts_packet(0x0101, true, &[0, 0, 1, 0xBD, 0, 0, 0x80, 0x00, 0x00]));

        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        let text = out
            .streams
            .iter()
            .find(|s| s.kind() == StreamKind::Text)
            .expect("DVB subtitle stream");
        assert!(text.fields.iter().any(|f| f.name == "Format" && f.value == "DVB Subtitle"));
        assert!(text.fields.iter().any(|f| f.name == "Language" && f.value == "eng"));
    }

    #[test]
    fn pts_extraction_decodes_33_bit_value() {
        let mut pes = vec![0x00, 0x00, 0x01, 0xE0, 0, 0, 0x80, 0x80, 0x05];
        // PTS only, marker bits per spec: 0010 PTS[32..30] 1 PTS[29..15] 1 PTS[14..0] 1
        pes.extend_from_slice(&[0x21, 0x00, 0x01, 0x00, 0x01]);
        assert!(extract_pts(&pes).is_some());
    }
}
