//! §4.3.i MPEG Audio (standalone MP3). Skips an optional ID3v2 header,
//! scans up to [`MP3_SYNC_SCAN_CAP`] for the first valid frame sync, reads
//! the Xing/Info VBR tag when present for frame-accurate duration, and
//! otherwise falls back to `file size / bitrate`. A trailing 128-byte
//! ID3v1 `"TAG"` footer is excluded from the payload size either way.

use std::io::{Read, Seek, SeekFrom};

use mediainfo_codecs::mp3_frame::{self, Mp3FrameHeader};
use mediainfo_report::{
    format_bitrate, format_duration, format_sample_rate, ContainerInfo, Field, Stream, StreamKind,
};

use crate::common::{ContainerOutput, MP3_SYNC_SCAN_CAP};

const ID3V1_SIZE: usize = 128;

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let head_cap = MP3_SYNC_SCAN_CAP.min(size as usize);
    let Ok(head) = crate::common::read_capped(reader, head_cap) else {
        return ContainerOutput::mismatch();
    };

    let mut general_fields = vec![Field::new("Format", "MPEG Audio")];
    let id3_len = id3v2_size(&head).unwrap_or(0);
    if id3_len > 0 {
        apply_id3v2_text_frames(&mut general_fields, &head, id3_len);
    }

    let Some((frame_offset, header)) = find_first_frame(&head, id3_len) else {
        return ContainerOutput::mismatch();
    };

    let has_id3v1 = has_id3v1_tag(reader, size);
    let mut payload_size = size;
    if has_id3v1 {
        payload_size = payload_size.saturating_sub(ID3V1_SIZE as u64);
    }
    let payload_size = payload_size.saturating_sub(frame_offset as u64);

    let vbr = parse_vbr_tag(&head, frame_offset, &header);

    let mut stream = Stream::new(StreamKind::Audio);
    stream.append_field_unique(Field::new("Format", "MPEG Audio"));
    stream.append_field_unique(Field::new(
        "Channel(s)",
        mediainfo_report::format_channels(header.channels as u64),
    ));
    stream.append_field_unique(Field::new(
        "Sampling rate",
        format_sample_rate(header.sample_rate as f64),
    ));

    let mut info = ContainerInfo::default();
    let duration = match &vbr {
        Some(vbr) if vbr.frame_count > 0 => {
            let samples_per_frame = if header.version_id == 0x03 { 1152.0 } else { 576.0 };
            Some((vbr.frame_count as f64 * samples_per_frame) / header.sample_rate as f64)
        }
        _ => {
            if header.bitrate_kbps > 0 {
                Some((payload_size as f64 * 8.0) / (header.bitrate_kbps as f64 * 1000.0))
            } else {
                None
            }
        }
    };

    if let Some(duration) = duration {
        info.duration_seconds = duration;
        stream.append_field_unique(Field::new("Duration", format_duration(duration)));
        let bitrate = match &vbr {
            Some(vbr) if vbr.byte_count > 0 => (vbr.byte_count as f64 * 8.0) / duration,
            _ => (payload_size as f64 * 8.0) / duration,
        };
        info.overall_bitrate_min = bitrate;
        info.overall_bitrate_max = bitrate;
        stream.append_field_unique(Field::new("Bit rate", format_bitrate(bitrate)));
        stream.append_field_unique(Field::new(
            "Bit rate mode",
            if vbr.is_some() { "Variable" } else { "Constant" },
        ));
    } else {
        stream.append_field_unique(Field::new("Bit rate", format_bitrate(header.bitrate_kbps as f64 * 1000.0)));
    }

    ContainerOutput {
        info,
        streams: vec![stream],
        general_fields,
        ok: true,
    }
}

/// ID3v2 header: `"ID3"` + 2 version bytes + 1 flags byte + a 4-byte
/// syncsafe (7 bits per byte) size field, not counting the 10-byte header
/// itself.
fn id3v2_size(data: &[u8]) -> Option<usize> {
    if data.len() < 10 || &data[0..3] != b"ID3" {
        return None;
    }
    let size = ((data[6] as u32 & 0x7F) << 21)
        | ((data[7] as u32 & 0x7F) << 14)
        | ((data[8] as u32 & 0x7F) << 7)
        | (data[9] as u32 & 0x7F);
    Some(10 + size as usize)
}

/// Walks ID3v2.3/2.4 frames (4-char ID + 4-byte size + 2 flag bytes) inside
/// `data[0..id3_len]`, mapping the handful of text frames this report
/// surfaces. Text-frame payloads are prefixed with a 1-byte encoding flag.
fn apply_id3v2_text_frames(general_fields: &mut Vec<Field>, data: &[u8], id3_len: usize) {
    let end = id3_len.min(data.len());
    let mut pos = 10usize;
    while pos + 10 <= end {
        let frame_id = &data[pos..pos + 4];
        if frame_id == [0, 0, 0, 0] {
            break;
        }
        let frame_size = u32::from_be_bytes(data[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body_start = pos + 10;
        let body_end = (body_start + frame_size).min(end);
        if body_start > end {
            break;
        }
        let field_name = match frame_id {
            b"TIT2" => Some("Track name"),
            b"TALB" => Some("Album"),
            b"TPE1" => Some("Performer"),
            b"TYER" | b"TDRC" => Some("Recorded date"),
            _ => None,
        };
        if let (Some(name), true) = (field_name, body_end > body_start + 1) {
            let text = String::from_utf8_lossy(&data[body_start + 1..body_end])
                .trim_end_matches('\0')
                .to_string();
            if !text.is_empty() {
                general_fields.push(Field::new(name, text));
            }
        }
        pos = body_end;
    }
}

fn find_first_frame(data: &[u8], start: usize) -> Option<(usize, Mp3FrameHeader)> {
    let mut pos = start.min(data.len());
    while pos + 4 <= data.len() {
        if let Some(header) = mp3_frame::parse_header(&data[pos..pos + 4]) {
            return Some((pos, header));
        }
        pos += 1;
    }
    None
}

struct VbrTag {
    frame_count: u32,
    byte_count: u32,
}

/// Xing/Info VBR header sits right after the side-info block following the
/// first frame's 4-byte header, tagged `"Xing"` or `"Info"`, then a 4-byte
/// flags field gating the optional frame-count and byte-count fields.
fn parse_vbr_tag(data: &[u8], frame_offset: usize, header: &Mp3FrameHeader) -> Option<VbrTag> {
    let tag_offset = frame_offset + 4 + mp3_frame::side_info_len(header.version_id, header.channels);
    if data.len() < tag_offset + 8 {
        return None;
    }
    let tag = &data[tag_offset..tag_offset + 4];
    if tag != b"Xing" && tag != b"Info" {
        return None;
    }
    let flags = u32::from_be_bytes(data[tag_offset + 4..tag_offset + 8].try_into().unwrap());
    let mut pos = tag_offset + 8;
    let frame_count = if flags & 0x01 != 0 {
        if data.len() < pos + 4 {
            return None;
        }
        let v = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap());
        pos += 4;
        v
    } else {
        0
    };
    let byte_count = if flags & 0x02 != 0 {
        if data.len() < pos + 4 {
            return None;
        }
        u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap())
    } else {
        0
    };
    Some(VbrTag { frame_count, byte_count })
}

fn has_id3v1_tag<R: Read + Seek>(reader: &mut R, size: u64) -> bool {
    if size < ID3V1_SIZE as u64 {
        return false;
    }
    if reader.seek(SeekFrom::End(-(ID3V1_SIZE as i64))).is_err() {
        return false;
    }
    let mut tag = [0u8; 3];
    reader.read_exact(&mut tag).is_ok() && &tag == b"TAG"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn mp3_frame_bytes() -> Vec<u8> {
        // MPEG-1 Layer III, 128 kb/s, 44.1 kHz, stereo.
        vec![0xFF, 0xFB, 0x90, 0x00]
    }

    #[test]
    fn finds_frame_and_estimates_bitrate_duration() {
        let mut data = mp3_frame_bytes();
        data.extend(vec![0u8; 10_000]);
        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        assert!(out.info.duration_seconds > 0.0);
        assert!(out.streams[0]
            .fields
            .iter()
            .any(|f| f.name == "Format" && f.value == "MPEG Audio"));
    }

    #[test]
    fn non_mp3_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let out = parse(&mut cursor, 16);
        assert!(!out.ok);
    }
}
