//! §4.3.d MPEG Program Stream. No PID demux: elementary streams are
//! addressed directly by `stream_id` inside each PES packet's start code
//! `00 00 01 <stream_id>`. Scanned through a [`MPEG_PS_WINDOW_CAP`]
//! sliding window (the last 16 bytes of one chunk are retained so a start
//! code straddling a chunk boundary is not missed).

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use mediainfo_codecs::{ac3, dts, h264, hevc, mp3_frame, mpeg2_video};
use mediainfo_report::{
    format_bitrate, format_bitrate_kbps, format_channels, format_duration, format_sample_rate,
    ContainerInfo, Field, Stream, StreamKind,
};

use crate::common::{ContainerOutput, PtsPolicy, PtsTracker, MPEG_PS_WINDOW_CAP};

const CARRY_OVER: usize = 16;

struct StreamState {
    stream_id: u8,
    kind: StreamKind,
    pts: PtsTracker,
    byte_count: i64,
    captured_payload: Option<Vec<u8>>,
}

impl StreamState {
    fn new(stream_id: u8, kind: StreamKind) -> Self {
        StreamState {
            stream_id,
            kind,
            pts: PtsTracker::new(PtsPolicy::Cumulative),
            byte_count: 0,
            captured_payload: None,
        }
    }
}

fn classify_stream_id(stream_id: u8) -> Option<StreamKind> {
    match stream_id {
        0xE0..=0xEF => Some(StreamKind::Video),
        0xC0..=0xDF => Some(StreamKind::Audio),
        0xBD => Some(StreamKind::Audio),
        _ => None,
    }
}

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();

    let mut states: HashMap<u8, StreamState> = HashMap::new();
    let mut carry: Vec<u8> = Vec::new();
    let mut saw_pack_header = false;
    let mut total_read = 0u64;

    loop {
        let chunk = match crate::common::read_capped(reader, MPEG_PS_WINDOW_CAP) {
            Ok(c) => c,
            Err(_) => break,
        };
        if chunk.is_empty() {
            break;
        }
        total_read += chunk.len() as u64;
        let mut buf = std::mem::take(&mut carry);
        buf.extend_from_slice(&chunk);

        let mut pos = 0usize;
        while pos + 4 <= buf.len() {
            if buf[pos] == 0 && buf[pos + 1] == 0 && buf[pos + 2] == 1 {
                let code = buf[pos + 3];
                if code == 0xBA {
                    saw_pack_header = true;
                }
                if let Some(kind) = classify_stream_id(code) {
                    if let Some(end) = find_packet_end(&buf, pos + 4) {
                        process_pes(&mut states, code, kind, &buf[pos..end]);
                        pos = end;
                        continue;
                    } else {
                        break;
                    }
                }
            }
            pos += 1;
        }
        if buf.len() > CARRY_OVER {
            carry = buf[buf.len() - CARRY_OVER..].to_vec();
        } else {
            carry = buf;
        }
        if total_read >= size {
            break;
        }
    }

    if !saw_pack_header || states.is_empty() {
        return ContainerOutput::mismatch();
    }

    let mut streams = Vec::new();
    let mut longest_duration = 0.0f64;
    for state in states.into_values() {
        let d = state.pts.duration_seconds();
        if d > longest_duration {
            longest_duration = d;
        }
        streams.push(build_stream(&state));
    }

    let mut info = ContainerInfo::default();
    info.duration_seconds = longest_duration;

    let mut general_fields = vec![Field::new("Format", "MPEG-PS")];
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

/// A PES packet has no fixed length when `PES_packet_length == 0` (allowed
/// for video); here packets are instead bounded by the next start code, so
/// `find_packet_end` looks ahead for the next `00 00 01` marker (or the end
/// of the buffer if none is found in this window).
fn find_packet_end(buf: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 3 <= buf.len() {
        if buf[i] == 0 && buf[i + 1] == 0 && buf[i + 2] == 1 {
            return Some(i);
        }
        i += 1;
    }
    if buf.len() >= from + CARRY_OVER {
        Some(buf.len())
    } else {
        None
    }
}

fn process_pes(states: &mut HashMap<u8, StreamState>, stream_id: u8, kind: StreamKind, pes: &[u8]) {
    let state = states
        .entry(stream_id)
        .or_insert_with(|| StreamState::new(stream_id, kind));
    state.byte_count += pes.len() as i64;
    if let Some(pts) = extract_pts(pes) {
        state.pts.observe(pts);
    }
    if state.captured_payload.is_none() {
        if let Some(payload) = pes_payload(pes) {
            state.captured_payload = Some(payload.to_vec());
        }
    }
}

fn extract_pts(pes: &[u8]) -> Option<u64> {
    if pes.len() < 14 || pes[0..3] != [0x00, 0x00, 0x01] {
        return None;
    }
    let flags = *pes.get(7)?;
    if flags & 0x80 == 0 {
        return None;
    }
    let b = pes.get(9..14)?;
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

fn build_stream(state: &StreamState) -> Stream {
    let mut stream = Stream::new(state.kind);
    stream.append_field_unique(Field::new("ID", state.stream_id.to_string()));

    if let Some(payload) = &state.captured_payload {
        apply_codec_header(&mut stream, state.kind, state.stream_id, payload);
    }

    let duration = state.pts.duration_seconds();
    if duration > 0.0 {
        stream.append_field_unique(Field::new("Duration", format_duration(duration)));
        if state.byte_count > 0 {
            let bitrate = (state.byte_count as f64 * 8.0) / duration;
            stream.append_field_unique(Field::new("Bit rate", format_bitrate(bitrate)));
        }
    }
    stream
}

fn apply_codec_header(stream: &mut Stream, kind: StreamKind, stream_id: u8, payload: &[u8]) {
    if kind == StreamKind::Video {
        if let Some(info) = find_mpeg2_sequence_header(payload) {
            stream.append_field_unique(Field::new("Format", "MPEG Video"));
            stream.append_field_unique(Field::new("Width", format!("{} pixels", info.width)));
            stream.append_field_unique(Field::new("Height", format!("{} pixels", info.height)));
            return;
        }
        if let Some(nal) = find_annexb_nal(payload, 7) {
            if let Some((_, fields)) = h264::parse_avc_config(&synth_avcc(&nal)) {
                stream.append_field_unique(Field::new("Format", "AVC"));
                for f in fields {
                    stream.append_field_unique(f);
                }
                return;
            }
        }
        if let Some(nal) = find_hevc_nal(payload, 33) {
            if let Some(info) = hevc::parse_sps(&nal) {
                stream.append_field_unique(Field::new("Format", "HEVC"));
                stream.append_field_unique(Field::new("Width", format!("{} pixels", info.width)));
                stream.append_field_unique(Field::new("Height", format!("{} pixels", info.height)));
                return;
            }
        }
        return;
    }

    if stream_id == 0xBD {
        // Private stream: AC-3/DTS substream headers are nested a few bytes
        // into the PES payload behind a private-stream sub-stream id byte.
        if let Some(info) = ac3::parse_ac3_header(payload) {
            stream.append_field_unique(Field::new("Format", "AC-3"));
            stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels)));
            stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate)));
            stream.append_field_unique(Field::new("Bit rate", format_bitrate_kbps(info.bitrate_kbps)));
            return;
        }
        if let Some(info) = dts::parse_core_frame(payload) {
            stream.append_field_unique(Field::new("Format", "DTS"));
            stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels as u64)));
            stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate as f64)));
            return;
        }
        return;
    }

    if let Some(idx) = payload.windows(2).position(|w| w[0] == 0xFF && (w[1] & 0xE0) == 0xE0) {
        if let Some(info) = mp3_frame::parse_header(&payload[idx..]) {
            stream.append_field_unique(Field::new("Format", "MPEG Audio"));
            stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels as u64)));
            stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(info.sample_rate as f64)));
            stream.append_field_unique(Field::new("Bit rate", format_bitrate_kbps(info.bitrate_kbps as i64)));
        }
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
            let header = *payload.get(i + 3)?;
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
            let this_type = (payload[i + 3] >> 1) & 0x3F;
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

fn synth_avcc(sps_nal: &[u8]) -> Vec<u8> {
    let rbsp = mediainfo_bitstream::unescape_rbsp(&sps_nal[1.min(sps_nal.len())..]);
    let mut out = vec![1u8];
    out.extend_from_slice(&[
        rbsp.first().copied().unwrap_or(0),
        rbsp.get(1).copied().unwrap_or(0),
        rbsp.get(2).copied().unwrap_or(0),
    ]);
    out.push(0xFF);
    out.push(0xE0 | 1);
    out.extend_from_slice(&(sps_nal.len() as u16).to_be_bytes());
    out.extend_from_slice(sps_nal);
    out.push(0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pack_header() -> Vec<u8> {
        vec![0x00, 0x00, 0x01, 0xBA, 0x44, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    }

    fn pes(stream_id: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![0x00, 0x00, 0x01, stream_id];
        out.extend_from_slice(&[0, 0]); // packet_length placeholder (unused by the scanner)
        out.extend_from_slice(&[0x80, 0x00, 0x00]); // flags, header_data_length=0
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn finds_audio_and_video_stream_ids() {
        let mut data = pack_header();
        data.extend(pes(0xE0, &[0u8; 32]));
        data.extend(pes(0xC0, &[0xFF, 0xFB, 0x90, 0x00]));
        data.extend(pack_header());
        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        assert!(out.streams.iter().any(|s| s.kind() == StreamKind::Audio));
        assert!(out.streams.iter().any(|s| s.kind() == StreamKind::Video));
    }

    #[test]
    fn non_ps_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 512]);
        let out = parse(&mut cursor, 512);
        assert!(!out.ok);
    }
}
