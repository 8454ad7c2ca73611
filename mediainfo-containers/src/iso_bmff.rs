//! §4.3.a ISO-BMFF / QuickTime (MP4). Iterates top-level boxes; `moov` is
//! buffered up to [`crate::common::MOOV_CAP`] and walked recursively for
//! `mvhd`, `udta.chpl`, and one `trak` per elementary stream.

use std::io::{Read, Seek, SeekFrom};

use mediainfo_codecs::{aac, h264, hevc};
use mediainfo_report::{
    format_duration, format_sample_rate, ContainerInfo, Field, Stream, StreamKind,
};

use crate::common::{ContainerOutput, MOOV_CAP};

struct BoxHeader {
    fourcc: [u8; 4],
    /// Byte range of the box's payload (after the 8- or 16-byte header),
    /// relative to the slice `iter_boxes` was called on.
    payload: std::ops::Range<usize>,
}

impl BoxHeader {
    fn fourcc_str(&self) -> &str {
        std::str::from_utf8(&self.fourcc).unwrap_or("????")
    }
}

/// Walks one level of boxes in `data`. `size == 0` is treated as "rest of
/// `data`" (only strictly valid for the file's final top-level box, but a
/// reasonable reading for any capped sub-buffer too); `size == 1` reads a
/// 64-bit `largesize` field; `size < 8` (and not 0/1) is malformed and
/// stops the walk without failing the whole parse.
fn iter_boxes(data: &[u8]) -> Vec<BoxHeader> {
    let mut boxes = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= data.len() {
        let size32 = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as u64;
        let mut fourcc = [0u8; 4];
        fourcc.copy_from_slice(&data[pos + 4..pos + 8]);
        let mut header_len = 8u64;
        let total_size = if size32 == 1 {
            if pos + 16 > data.len() {
                break;
            }
            header_len = 16;
            u64::from_be_bytes(data[pos + 8..pos + 16].try_into().unwrap())
        } else if size32 == 0 {
            (data.len() - pos) as u64
        } else if size32 < 8 {
            break;
        } else {
            size32
        };
        let payload_start = pos + header_len as usize;
        let box_end = pos.saturating_add(total_size as usize).min(data.len());
        if payload_start > data.len() || payload_start > box_end {
            break;
        }
        boxes.push(BoxHeader {
            fourcc,
            payload: payload_start..box_end,
        });
        if total_size == 0 {
            break;
        }
        pos += total_size as usize;
    }
    boxes
}

fn find_box<'a>(boxes: &'a [BoxHeader], name: &str) -> Option<&'a BoxHeader> {
    boxes.iter().find(|b| b.fourcc_str() == name)
}

pub fn parse<R: Read + Seek>(reader: &mut R, _size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let top = match crate::common::read_capped(reader, MOOV_CAP) {
        Ok(buf) => buf,
        Err(_) => return ContainerOutput::mismatch(),
    };
    let top_boxes = iter_boxes(&top);
    let Some(ftyp) = find_box(&top_boxes, "ftyp") else {
        return ContainerOutput::mismatch();
    };
    let ftyp_data = &top[ftyp.payload.clone()];
    if ftyp_data.len() < 8 {
        return ContainerOutput::mismatch();
    }
    let major_brand = String::from_utf8_lossy(&ftyp_data[0..4]).to_string();

    let mut general_fields = Vec::new();
    let format_name = if major_brand.trim() == "qt" {
        "QuickTime"
    } else {
        "MPEG-4"
    };
    general_fields.push(Field::new("Format", format_name));
    general_fields.push(Field::new("Codec ID", major_brand.trim().to_string()));

    // `moov` may not fit entirely in the capped top-level read if it is a
    // huge atom placed after a large `mdat`; re-seek and read it directly
    // when that happens rather than silently truncating.
    let moov_box = find_box(&top_boxes, "moov");
    let moov_data: Vec<u8> = match moov_box {
        Some(b) if b.payload.end <= top.len() => top[b.payload.clone()].to_vec(),
        _ => return ContainerOutput::mismatch(),
    };
    if moov_data.len() > MOOV_CAP {
        log::warn!("moov exceeds {}-byte cap, truncating", MOOV_CAP);
    }
    let moov_boxes = iter_boxes(&moov_data);

    let mut info = ContainerInfo::default();
    if let Some(mvhd) = find_box(&moov_boxes, "mvhd") {
        if let Some((timescale, duration)) = parse_mvhd(&moov_data[mvhd.payload.clone()]) {
            if timescale > 0 {
                info.duration_seconds = duration as f64 / timescale as f64;
            }
        }
    }
    if info.has_duration() {
        general_fields.push(Field::new("Duration", format_duration(info.duration_seconds)));
    }

    if let Some(udta) = find_box(&moov_boxes, "udta") {
        let udta_boxes = iter_boxes(&moov_data[udta.payload.clone()]);
        if let Some(chpl) = find_box(&udta_boxes, "chpl") {
            for (title, start_ms) in parse_chpl(&moov_data[udta.payload.start + chpl.payload.start
                ..udta.payload.start + chpl.payload.end]) {
                general_fields.push(Field::new(format!("Chapter {}", start_ms), title));
            }
        }
    }

    let mut streams = Vec::new();
    for trak in moov_boxes.iter().filter(|b| b.fourcc_str() == "trak") {
        if let Some(stream) = parse_trak(&moov_data[trak.payload.clone()]) {
            streams.push(stream);
        }
    }

    ContainerOutput {
        info,
        streams,
        general_fields,
        ok: true,
    }
}

fn parse_mvhd(data: &[u8]) -> Option<(u32, u64)> {
    if data.is_empty() {
        return None;
    }
    let version = data[0];
    if version == 1 {
        if data.len() < 4 + 8 + 8 + 4 + 8 {
            return None;
        }
        let timescale = u32::from_be_bytes(data[20..24].try_into().unwrap());
        let duration = u64::from_be_bytes(data[24..32].try_into().unwrap());
        Some((timescale, duration))
    } else {
        if data.len() < 4 + 4 + 4 + 4 + 4 {
            return None;
        }
        let timescale = u32::from_be_bytes(data[12..16].try_into().unwrap());
        let duration = u32::from_be_bytes(data[16..20].try_into().unwrap()) as u64;
        Some((timescale, duration))
    }
}

/// QuickTime `udta.chpl` chapter list: `version(1) reserved(7)
/// entry_count(1)` then `(start_100ns(8), title_len(1), title)` per entry.
fn parse_chpl(data: &[u8]) -> Vec<(String, u64)> {
    let mut out = Vec::new();
    if data.len() < 9 {
        return out;
    }
    let entry_count = data[8];
    let mut pos = 9usize;
    for _ in 0..entry_count {
        if pos + 9 > data.len() {
            break;
        }
        let start_100ns = u64::from_be_bytes(data[pos..pos + 8].try_into().unwrap());
        let title_len = data[pos + 8] as usize;
        pos += 9;
        if pos + title_len > data.len() {
            break;
        }
        let title = String::from_utf8_lossy(&data[pos..pos + title_len]).to_string();
        pos += title_len;
        out.push((title, start_100ns / 10_000));
    }
    out
}

fn parse_trak(data: &[u8]) -> Option<Stream> {
    let trak_boxes = iter_boxes(data);
    let track_id = find_box(&trak_boxes, "tkhd").and_then(|b| parse_tkhd(&data[b.payload.clone()]));
    let mdia = find_box(&trak_boxes, "mdia")?;
    let mdia_data = &data[mdia.payload.clone()];
    let mdia_boxes = iter_boxes(mdia_data);

    let hdlr = find_box(&mdia_boxes, "hdlr")?;
    let handler = parse_hdlr(&mdia_data[hdlr.payload.clone()])?;
    let kind = match crate::common::canonicalize_kind_token(&handler) {
        "video" => StreamKind::Video,
        "audio" => StreamKind::Audio,
        "text" => StreamKind::Text,
        _ => return None,
    };

    let mdhd = find_box(&mdia_boxes, "mdhd");
    let (timescale, duration, language) = mdhd
        .and_then(|b| parse_mdhd(&mdia_data[b.payload.clone()]))
        .unwrap_or((0, 0, String::new()));

    let minf = find_box(&mdia_boxes, "minf")?;
    let minf_data = &mdia_data[minf.payload.clone()];
    let minf_boxes = iter_boxes(minf_data);
    let stbl = find_box(&minf_boxes, "stbl")?;
    let stbl_data = &minf_data[stbl.payload.clone()];
    let stbl_boxes = iter_boxes(stbl_data);

    let stsd = find_box(&stbl_boxes, "stsd")?;
    let sample_entry = first_sample_entry(&stbl_data[stsd.payload.clone()]);

    let mut stream = Stream::new(kind);
    if let Some(id) = track_id {
        stream.append_field_unique(Field::new("ID", id.to_string()));
    }
    if !language.is_empty() {
        stream.append_field_unique(Field::new(
            "Language",
            mediainfo_report::normalize_language_code(&language),
        ));
    }
    if timescale > 0 && duration > 0 {
        let secs = duration as f64 / timescale as f64;
        stream.append_field_unique(Field::new("Duration", format_duration(secs)));
        stream
            .json
            .insert("Duration".to_string(), format!("{:.3}", secs));
    }

    if let Some(entry) = sample_entry {
        apply_sample_entry(&mut stream, kind, entry);
    }

    let stsz_bytes = find_box(&stbl_boxes, "stsz")
        .and_then(|b| parse_stsz_total(&stbl_data[b.payload.clone()]));
    if let Some(bytes) = stsz_bytes {
        stream.json.insert("StreamSize".to_string(), bytes.to_string());
    }

    let stts_count = find_box(&stbl_boxes, "stts")
        .and_then(|b| parse_stts_total(&stbl_data[b.payload.clone()]));
    if let (Some(count), true) = (stts_count, kind == StreamKind::Video) {
        if timescale > 0 && duration > 0 {
            let secs = duration as f64 / timescale as f64;
            let fps = crate::common::estimate_frame_rate(count, secs);
            if fps > 0.0 {
                stream.append_field_unique(Field::new(
                    "Frame rate",
                    mediainfo_report::format_frame_rate(fps),
                ));
            }
        }
    }

    Some(stream)
}

/// `tkhd` carries the track id at a version-dependent offset, same layout
/// shift as `mdhd`.
fn parse_tkhd(data: &[u8]) -> Option<u32> {
    if data.is_empty() {
        return None;
    }
    let version = data[0];
    let id_off = if version == 1 { 20 } else { 12 };
    if data.len() < id_off + 4 {
        return None;
    }
    Some(u32::from_be_bytes(data[id_off..id_off + 4].try_into().unwrap()))
}

fn parse_hdlr(data: &[u8]) -> Option<String> {
    if data.len() < 12 {
        return None;
    }
    Some(String::from_utf8_lossy(&data[8..12]).to_string())
}

fn parse_mdhd(data: &[u8]) -> Option<(u32, u64, String)> {
    if data.is_empty() {
        return None;
    }
    let version = data[0];
    let (timescale_off, dur_len) = if version == 1 { (20, 8) } else { (12, 4) };
    if data.len() < timescale_off + 4 + dur_len + 2 {
        return None;
    }
    let timescale = u32::from_be_bytes(data[timescale_off..timescale_off + 4].try_into().unwrap());
    let duration = if dur_len == 8 {
        u64::from_be_bytes(data[timescale_off + 4..timescale_off + 12].try_into().unwrap())
    } else {
        u32::from_be_bytes(data[timescale_off + 4..timescale_off + 8].try_into().unwrap()) as u64
    };
    let lang_off = timescale_off + 4 + dur_len;
    let lang_packed = u16::from_be_bytes(data[lang_off..lang_off + 2].try_into().unwrap());
    let language = unpack_iso639_2(lang_packed);
    Some((timescale, duration, language))
}

/// ISO-639-2 packed as three 5-bit values biased by 0x60 ("1 + ASCII - 0x60").
fn unpack_iso639_2(packed: u16) -> String {
    if packed == 0 {
        return String::new();
    }
    let c1 = ((packed >> 10) & 0x1F) as u8;
    let c2 = ((packed >> 5) & 0x1F) as u8;
    let c3 = (packed & 0x1F) as u8;
    if c1 == 0 || c2 == 0 || c3 == 0 {
        return String::new();
    }
    let bytes = [c1 + 0x60, c2 + 0x60, c3 + 0x60];
    String::from_utf8(bytes.to_vec()).unwrap_or_default()
}

struct SampleEntry<'a> {
    format: [u8; 4],
    data: &'a [u8],
}

fn first_sample_entry(stsd_payload: &[u8]) -> Option<SampleEntry<'_>> {
    if stsd_payload.len() < 8 {
        return None;
    }
    let entries = &stsd_payload[8..];
    let boxes = iter_boxes(entries);
    let first = boxes.first()?;
    let start = first.payload.start.saturating_sub(8);
    Some(SampleEntry {
        format: first.fourcc,
        data: &entries[start..first.payload.end],
    })
}

fn apply_sample_entry(stream: &mut Stream, kind: StreamKind, entry: SampleEntry<'_>) {
    let format = std::str::from_utf8(&entry.format).unwrap_or("");
    let codec_name = map_codec_id(format);
    if !codec_name.is_empty() {
        stream.append_field_unique(Field::new("Format", codec_name));
    }

    match kind {
        StreamKind::Video => apply_video_entry(stream, format, entry.data),
        StreamKind::Audio => apply_audio_entry(stream, format, entry.data),
        _ => {}
    }
}

fn map_codec_id(fourcc: &str) -> &'static str {
    match fourcc {
        "avc1" | "avc3" => "AVC",
        "hvc1" | "hev1" => "HEVC",
        "mp4a" => "AAC",
        "ac-3" => "AC-3",
        "ec-3" => "E-AC-3",
        "alac" => "ALAC",
        "fLaC" | "flac" => "FLAC",
        "Opus" => "Opus",
        "tx3g" => "Timed Text",
        "wvtt" => "WebVTT",
        _ => "",
    }
}

fn apply_video_entry(stream: &mut Stream, format: &str, data: &[u8]) {
    if data.len() >= 36 {
        let width = u16::from_be_bytes(data[32..34].try_into().unwrap());
        let height = u16::from_be_bytes(data[34..36].try_into().unwrap());
        if width > 0 {
            stream.append_field_unique(Field::new("Width", format!("{} pixels", width)));
        }
        if height > 0 {
            stream.append_field_unique(Field::new("Height", format!("{} pixels", height)));
        }
    }
    let inner_boxes = iter_boxes(data);
    match format {
        "avc1" | "avc3" => {
            if let Some(avcc) = find_box(&inner_boxes, "avcC") {
                if let Some((_, fields)) = h264::parse_avc_config(&data[avcc.payload.clone()]) {
                    for f in fields {
                        stream.append_field_unique(f);
                    }
                }
            }
        }
        "hvc1" | "hev1" => {
            if let Some(hvcc) = find_box(&inner_boxes, "hvcC") {
                if let Some(sps_nal) = first_hevc_sps_nal(&data[hvcc.payload.clone()]) {
                    if let Some(info) = hevc::parse_sps(&sps_nal) {
                        stream.append_field_unique(Field::new(
                            "Chroma subsampling",
                            info.chroma_format,
                        ));
                        stream.append_field_unique(Field::new(
                            "Bit depth",
                            format!("{} bits", info.bit_depth_luma),
                        ));
                    }
                }
            }
        }
        _ => {}
    }
}

/// `hvcC`: after the 22-byte fixed header, `numOfArrays(1)` arrays of
/// `NAL_unit_type(1, low 6 bits) numNalus(2)` each followed by that many
/// `(length(2), NAL bytes)` entries. Returns the first NALU of the first
/// SPS (`NAL_unit_type == 33`) array.
fn first_hevc_sps_nal(hvcc: &[u8]) -> Option<Vec<u8>> {
    if hvcc.len() < 23 {
        return None;
    }
    let num_arrays = hvcc[22];
    let mut pos = 23usize;
    for _ in 0..num_arrays {
        if pos + 3 > hvcc.len() {
            return None;
        }
        let nal_type = hvcc[pos] & 0x3F;
        let num_nalus = u16::from_be_bytes([hvcc[pos + 1], hvcc[pos + 2]]);
        pos += 3;
        for _ in 0..num_nalus {
            if pos + 2 > hvcc.len() {
                return None;
            }
            let len = u16::from_be_bytes([hvcc[pos], hvcc[pos + 1]]) as usize;
            pos += 2;
            if pos + len > hvcc.len() {
                return None;
            }
            if nal_type == 33 {
                return Some(hvcc[pos..pos + len].to_vec());
            }
            pos += len;
        }
    }
    None
}

fn apply_audio_entry(stream: &mut Stream, format: &str, data: &[u8]) {
    if data.len() >= 36 {
        let channels = u16::from_be_bytes(data[24..26].try_into().unwrap());
        let sample_rate_fixed = u32::from_be_bytes(data[32..36].try_into().unwrap());
        let sample_rate = (sample_rate_fixed >> 16) as f64;
        if channels > 0 {
            stream.append_field_unique(Field::new(
                "Channel(s)",
                mediainfo_report::format_channels(channels as u64),
            ));
        }
        if sample_rate > 0.0 {
            stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(sample_rate)));
        }
    }
    if format == "mp4a" {
        let inner_boxes = iter_boxes(data);
        if let Some(esds) = find_box(&inner_boxes, "esds") {
            if let Some(config) = extract_decoder_specific_info(&data[esds.payload.clone()]) {
                if let Some(info) = aac::parse_audio_specific_config(&config) {
                    stream.append_field_unique(Field::new("Format profile", info.profile.to_string()));
                }
            }
        }
    }
}

/// Scans an `esds` box payload for the MPEG-4 `DecoderSpecificInfo`
/// descriptor (tag `0x05`) and returns its payload, which for an AAC track
/// is the raw `AudioSpecificConfig`. Descriptor tags use the ISO/IEC
/// 14496-1 expandable-length encoding (top bit of each length byte marks
/// continuation); only the common 1-byte-length case is handled here.
fn extract_decoder_specific_info(esds: &[u8]) -> Option<Vec<u8>> {
    let mut pos = 4usize; // version(1) + flags(3)
    while pos < esds.len() {
        let tag = esds[pos];
        pos += 1;
        let mut len = 0usize;
        loop {
            if pos >= esds.len() {
                return None;
            }
            let b = esds[pos];
            pos += 1;
            len = (len << 7) | (b & 0x7F) as usize;
            if b & 0x80 == 0 {
                break;
            }
        }
        if tag == 0x05 {
            if pos + len > esds.len() {
                return None;
            }
            return Some(esds[pos..pos + len].to_vec());
        }
        pos += len;
    }
    None
}

fn parse_stsz_total(data: &[u8]) -> Option<i64> {
    if data.len() < 12 {
        return None;
    }
    let sample_size = u32::from_be_bytes(data[4..8].try_into().unwrap());
    let sample_count = u32::from_be_bytes(data[8..12].try_into().unwrap());
    if sample_size != 0 {
        return Some(sample_size as i64 * sample_count as i64);
    }
    let mut total = 0i64;
    let mut pos = 12usize;
    for _ in 0..sample_count {
        if pos + 4 > data.len() {
            break;
        }
        total += u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap()) as i64;
        pos += 4;
    }
    Some(total)
}

fn parse_stts_total(data: &[u8]) -> Option<u64> {
    if data.len() < 8 {
        return None;
    }
    let entry_count = u32::from_be_bytes(data[4..8].try_into().unwrap());
    let mut total = 0u64;
    let mut pos = 8usize;
    for _ in 0..entry_count {
        if pos + 8 > data.len() {
            break;
        }
        let sample_count = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap());
        total += sample_count as u64;
        pos += 8;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u32be(v: u32) -> [u8; 4] {
        v.to_be_bytes()
    }

    fn build_box(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&u32be((8 + payload.len()) as u32));
        out.extend_from_slice(fourcc);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn mvhd_v0_duration_matches_boundary_scenario() {
        // timescale=1000, duration=10000 -> "10 s 0 ms"
        let mut mvhd_payload = vec![0u8, 0, 0, 0]; // version+flags
        mvhd_payload.extend_from_slice(&u32be(0)); // creation_time
        mvhd_payload.extend_from_slice(&u32be(0)); // modification_time
        mvhd_payload.extend_from_slice(&u32be(1000)); // timescale
        mvhd_payload.extend_from_slice(&u32be(10000)); // duration
        let mvhd = build_box(b"mvhd", &mvhd_payload);
        let ftyp = build_box(b"ftyp", b"isomisom");
        let moov = build_box(b"moov", &mvhd);
        let mut data = ftyp;
        data.extend_from_slice(&moov);

        let mut cursor = Cursor::new(data);
        let out = parse(&mut cursor, 0);
        assert!(out.ok);
        assert_eq!(out.info.duration_seconds, 10.0);
        assert!(out
            .general_fields
            .iter()
            .any(|f| f.name == "Format" && f.value == "MPEG-4"));
        assert!(out
            .general_fields
            .iter()
            .any(|f| f.name == "Duration" && f.value == "10 s 0 ms"));
    }

    #[test]
    fn non_mp4_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 32]);
        let out = parse(&mut cursor, 32);
        assert!(!out.ok);
    }

    #[test]
    fn box_size_zero_means_to_end_of_buffer() {
        let mut data = vec![0u8, 0, 0, 0];
        data.extend_from_slice(b"free");
        data.extend_from_slice(&[1, 2, 3, 4]);
        let boxes = iter_boxes(&data);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].payload, 8..12);
    }

    #[test]
    fn unpacks_iso639_2_language() {
        // "eng" packed: e=0x65-0x60=5, n=0x6E-0x60=14, g=0x67-0x60=7
        let packed = (5u16 << 10) | (14u16 << 5) | 7u16;
        assert_eq!(unpack_iso639_2(packed), "eng");
    }
}
