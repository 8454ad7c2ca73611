//! §4.3.b Matroska / EBML. Reads up to [`MATROSKA_HEAD_CAP`] from the file
//! head for `Segment -> Info/Tracks`, then a second streaming pass
//! (`applyMatroskaStats`) walks `Cluster` timecodes across the remainder
//! of the file to refine duration.

use std::io::{Read, Seek, SeekFrom};

use mediainfo_bitstream::{read_vint_id, read_vint_size};
use mediainfo_report::{
    format_duration, format_sample_rate, normalize_language_code, ContainerInfo, Field, Stream,
    StreamKind,
};

use crate::common::{read_capped, ContainerOutput, MATROSKA_HEAD_CAP};

const ID_SEGMENT: u64 = 0x18538067;
const ID_INFO: u64 = 0x1549A966;
const ID_TIMECODE_SCALE: u64 = 0x2AD7B1;
const ID_DURATION: u64 = 0x4489;
const ID_TRACKS: u64 = 0x1654AE6B;
const ID_TRACK_ENTRY: u64 = 0xAE;
const ID_TRACK_NUMBER: u64 = 0xD7;
const ID_TRACK_TYPE: u64 = 0x83;
const ID_CODEC_ID: u64 = 0x86;
const ID_LANGUAGE: u64 = 0x22B59C;
const ID_VIDEO: u64 = 0xE0;
const ID_PIXEL_WIDTH: u64 = 0xB0;
const ID_PIXEL_HEIGHT: u64 = 0xBA;
const ID_AUDIO: u64 = 0xE1;
const ID_SAMPLING_FREQUENCY: u64 = 0xB5;
const ID_CHANNELS: u64 = 0x9F;
const ID_BIT_DEPTH: u64 = 0x6264;
const ID_CLUSTER: u64 = 0x1F43B675;
const ID_TIMECODE: u64 = 0xE7;

struct Element {
    id: u64,
    payload: std::ops::Range<usize>,
}

fn iter_elements(data: &[u8]) -> Vec<Element> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos < data.len() {
        let Some(id_vint) = read_vint_id(&data[pos..]) else {
            break;
        };
        let id_end = pos + id_vint.length;
        let Some(size_vint) = read_vint_size(&data[id_end..]) else {
            break;
        };
        let payload_start = id_end + size_vint.length;
        let payload_len = if size_vint.unknown {
            data.len() - payload_start
        } else {
            size_vint.value as usize
        };
        let payload_end = (payload_start + payload_len).min(data.len());
        if payload_start > data.len() {
            break;
        }
        out.push(Element {
            id: id_vint.value,
            payload: payload_start..payload_end,
        });
        pos = payload_end;
        if pos <= payload_start && payload_len == 0 && size_vint.unknown {
            break; // avoid spinning forever on a malformed unknown-size element
        }
    }
    out
}

fn find<'a>(elements: &'a [Element], id: u64) -> Option<&'a Element> {
    elements.iter().find(|e| e.id == id)
}

fn find_all<'a>(elements: &'a [Element], id: u64) -> Vec<&'a Element> {
    elements.iter().filter(|e| e.id == id).collect()
}

fn read_uint(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn read_float(data: &[u8]) -> f64 {
    match data.len() {
        4 => f32::from_be_bytes(data.try_into().unwrap()) as f64,
        8 => f64::from_be_bytes(data.try_into().unwrap()),
        _ => 0.0,
    }
}

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let head = match read_capped(reader, MATROSKA_HEAD_CAP) {
        Ok(buf) => buf,
        Err(_) => return ContainerOutput::mismatch(),
    };
    let top = iter_elements(&head);
    let Some(segment) = find(&top, ID_SEGMENT) else {
        return ContainerOutput::mismatch();
    };
    let segment_data = &head[segment.payload.clone()];
    let segment_elements = iter_elements(segment_data);

    let mut timecode_scale: u64 = 1_000_000;
    let mut info = ContainerInfo::default();
    let mut general_fields = vec![Field::new("Format", "Matroska")];

    if let Some(info_elem) = find(&segment_elements, ID_INFO) {
        let info_data = &segment_data[info_elem.payload.clone()];
        let info_elements = iter_elements(info_data);
        if let Some(ts) = find(&info_elements, ID_TIMECODE_SCALE) {
            let v = read_uint(&info_data[ts.payload.clone()]);
            if v > 0 {
                timecode_scale = v;
            }
        }
        if let Some(dur) = find(&info_elements, ID_DURATION) {
            let raw = read_float(&info_data[dur.payload.clone()]);
            info.duration_seconds = raw * timecode_scale as f64 / 1_000_000_000.0;
        }
    }

    let mut streams = Vec::new();
    if let Some(tracks) = find(&segment_elements, ID_TRACKS) {
        let tracks_data = &segment_data[tracks.payload.clone()];
        let track_entries = find_all(&iter_elements(tracks_data), ID_TRACK_ENTRY);
        for entry in track_entries {
            let entry_data = &tracks_data[entry.payload.clone()];
            if let Some(stream) = parse_track_entry(entry_data) {
                streams.push(stream);
            }
        }
    }

    if !info.has_duration() {
        if let Some(refined) = scan_cluster_duration(reader, size, timecode_scale) {
            info.duration_seconds = refined;
        }
    }
    if info.has_duration() {
        general_fields.push(Field::new("Duration", format_duration(info.duration_seconds)));
        for stream in streams.iter_mut() {
            stream.append_field_unique(Field::new("Duration", format_duration(info.duration_seconds)));
            stream
                .json
                .insert("Duration".to_string(), format!("{:.3}", info.duration_seconds));
        }
    }

    ContainerOutput {
        info,
        streams,
        general_fields,
        ok: true,
    }
}

fn parse_track_entry(data: &[u8]) -> Option<Stream> {
    let elements = iter_elements(data);
    let track_type = find(&elements, ID_TRACK_TYPE).map(|e| read_uint(&data[e.payload.clone()]))?;
    let kind = match track_type {
        1 => StreamKind::Video,
        2 => StreamKind::Audio,
        17 => StreamKind::Text,
        _ => return None,
    };

    let mut stream = Stream::new(kind);
    if let Some(number) = find(&elements, ID_TRACK_NUMBER) {
        let track_number = read_uint(&data[number.payload.clone()]);
        stream.append_field_unique(Field::new("ID", track_number.to_string()));
    }
    if let Some(codec) = find(&elements, ID_CODEC_ID) {
        let codec_id = String::from_utf8_lossy(&data[codec.payload.clone()]).to_string();
        let format = map_matroska_codec_id(&codec_id);
        if !format.is_empty() {
            stream.append_field_unique(Field::new("Format", format));
        }
        stream.append_field_unique(Field::new("Codec ID", codec_id));
    }
    if let Some(lang) = find(&elements, ID_LANGUAGE) {
        let raw = String::from_utf8_lossy(&data[lang.payload.clone()]).to_string();
        stream.append_field_unique(Field::new("Language", normalize_language_code(&raw)));
    }

    match kind {
        StreamKind::Video => {
            if let Some(video) = find(&elements, ID_VIDEO) {
                let vdata = &data[video.payload.clone()];
                let velements = iter_elements(vdata);
                if let Some(w) = find(&velements, ID_PIXEL_WIDTH) {
                    let width = read_uint(&vdata[w.payload.clone()]);
                    stream.append_field_unique(Field::new("Width", format!("{} pixels", width)));
                }
                if let Some(h) = find(&velements, ID_PIXEL_HEIGHT) {
                    let height = read_uint(&vdata[h.payload.clone()]);
                    stream.append_field_unique(Field::new("Height", format!("{} pixels", height)));
                }
            }
        }
        StreamKind::Audio => {
            if let Some(audio) = find(&elements, ID_AUDIO) {
                let adata = &data[audio.payload.clone()];
                let aelements = iter_elements(adata);
                if let Some(sr) = find(&aelements, ID_SAMPLING_FREQUENCY) {
                    let rate = read_float(&adata[sr.payload.clone()]);
                    if rate > 0.0 {
                        stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(rate)));
                    }
                }
                if let Some(ch) = find(&aelements, ID_CHANNELS) {
                    let channels = read_uint(&adata[ch.payload.clone()]);
                    stream.append_field_unique(Field::new(
                        "Channel(s)",
                        mediainfo_report::format_channels(channels),
                    ));
                }
                if let Some(bd) = find(&aelements, ID_BIT_DEPTH) {
                    let bits = read_uint(&adata[bd.payload.clone()]);
                    stream.append_field_unique(Field::new("Bit depth", format!("{} bits", bits)));
                }
            }
        }
        _ => {}
    }

    Some(stream)
}

fn map_matroska_codec_id(codec_id: &str) -> &'static str {
    match codec_id {
        "V_MPEG4/ISO/AVC" => "AVC",
        "V_MPEGH/ISO/HEVC" => "HEVC",
        "V_MPEG4/ISO/ASP" => "MPEG-4 Visual",
        "V_MPEG2" => "MPEG Video",
        "A_AAC" => "AAC",
        "A_AC3" | "A_AC3/BSID9" | "A_AC3/BSID10" => "AC-3",
        "A_DTS" => "DTS",
        "A_FLAC" => "FLAC",
        "A_OPUS" => "Opus",
        "A_VORBIS" => "Vorbis",
        "A_PCM/INT/LIT" | "A_PCM/INT/BIG" => "PCM",
        "S_TEXT/UTF8" => "UTF-8",
        "S_TEXT/ASS" | "S_TEXT/SSA" => "ASS",
        "S_VOBSUB" => "VobSub",
        "S_HDMV/PGS" => "PGS",
        _ => "",
    }
}

/// Streams the file looking for top-level `Cluster` elements' `Timecode`
/// child, tracking min/max across the whole segment to derive a duration
/// when `Info.Duration` is absent. Reads in fixed 1 MiB chunks to bound
/// memory use; a `Cluster` element larger than one chunk is skipped
/// rather than reassembled, which undercounts duration on files with very
/// large clusters but never mis-locates a timecode.
fn scan_cluster_duration<R: Read + Seek>(reader: &mut R, size: u64, timecode_scale: u64) -> Option<f64> {
    if size == 0 {
        return None;
    }
    reader.seek(SeekFrom::Start(0)).ok()?;
    const CHUNK: usize = 1024 * 1024;
    const TAIL: usize = 16;
    let mut window = Vec::new();
    let mut min_tc: Option<u64> = None;
    let mut max_tc: Option<u64> = None;
    loop {
        let mut chunk = vec![0u8; CHUNK];
        let n = reader.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        chunk.truncate(n);
        window.extend_from_slice(&chunk);
        for elem in iter_elements(&window) {
            if elem.id != ID_CLUSTER || elem.payload.end > window.len() {
                continue;
            }
            let cluster_data = &window[elem.payload.clone()];
            if let Some(tc_elem) = find(&iter_elements(cluster_data), ID_TIMECODE) {
                let tc = read_uint(&cluster_data[tc_elem.payload.clone()]);
                min_tc = Some(min_tc.map_or(tc, |m: u64| m.min(tc)));
                max_tc = Some(max_tc.map_or(tc, |m: u64| m.max(tc)));
            }
        }
        // Keep only a small rolling tail so a Cluster header split across
        // a chunk boundary is still found, without buffering the file.
        if window.len() > TAIL {
            let drop = window.len() - TAIL;
            window.drain(0..drop);
        }
    }
    match (min_tc, max_tc) {
        (Some(min), Some(max)) if max >= min => {
            Some(((max - min) as f64 * timecode_scale as f64) / 1_000_000_000.0)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn vint_size(value: u64) -> Vec<u8> {
        // Minimal single-byte VINT for small sizes used in these tests.
        assert!(value < 0x80);
        vec![0x80 | value as u8]
    }

    fn element(id: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&vint_size(payload.len() as u64));
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn duration_from_info_matches_boundary_scenario() {
        // TimecodeScale default 1_000_000, Duration stored as an 8-byte
        // float of 4321.0 ticks -> 4321 * 1e6 / 1e9 = 4.321s.
        let duration_bytes = 4321.0f64.to_be_bytes();
        let info = element(&[0x44, 0x89], &duration_bytes); // Duration id 0x4489
        let segment = element(&[0x15, 0x49, 0xA9, 0x66], &info); // Info id
        let top = element(&[0x18, 0x53, 0x80, 0x67], &segment); // Segment id

        let mut cursor = Cursor::new(top.clone());
        let out = parse(&mut cursor, top.len() as u64);
        assert!(out.ok);
        assert!((out.info.duration_seconds - 4.321).abs() < 1e-6);
    }

    #[test]
    fn non_ebml_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let out = parse(&mut cursor, 16);
        assert!(!out.ok);
    }

    #[test]
    fn track_entry_audio_fields() {
        let sampling = element(&[0xB5], &44100.0f32.to_be_bytes());
        let channels = element(&[0x9F], &[2]);
        let audio = element(&[0xE1], &{
            let mut b = sampling;
            b.extend_from_slice(&channels);
            b
        });
        let codec = element(&[0x86], b"A_AAC");
        let track_type = element(&[0x83], &[2]);
        let entry_data = {
            let mut b = track_type;
            b.extend_from_slice(&codec);
            b.extend_from_slice(&audio);
            b
        };
        let stream = parse_track_entry(&entry_data).unwrap();
        assert_eq!(stream.kind(), StreamKind::Audio);
        assert_eq!(stream.find_field("Format"), Some("AAC"));
        assert_eq!(stream.find_field("Channel(s)"), Some("2 channels"));
    }
}
