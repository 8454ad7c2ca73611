//! §4.3.h Ogg. Iterates pages from the head (up to [`HEAD_PAGE_CAP`] pages
//! or [`crate::common::OGG_TAIL_CAP`] bytes) to find the identification
//! packet and OpusTags/Vorbis-comment packet, then tail-scans (expanding
//! window) for the last page's granule position to compute duration.

use std::io::{Read, Seek, SeekFrom};

use mediainfo_codecs::opus_vorbis;
use mediainfo_report::{
    format_bitrate, format_channels, format_duration, format_sample_rate, ContainerInfo, Field,
    Stream, StreamKind,
};

use crate::common::{ContainerOutput, OGG_TAIL_CAP};

const HEAD_PAGE_CAP: usize = 64;
const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

struct Page<'a> {
    granule_position: i64,
    segment_data: &'a [u8],
    header_len: usize,
    total_len: usize,
}

/// Parses one Ogg page starting at `data[0..]`. Returns `None` if `data`
/// does not begin with the capture pattern or is truncated.
fn parse_page(data: &[u8]) -> Option<Page<'_>> {
    if data.len() < 27 || &data[0..4] != CAPTURE_PATTERN {
        return None;
    }
    let granule_position = i64::from_le_bytes(data[6..14].try_into().unwrap());
    let segment_count = data[26] as usize;
    let seg_table_end = 27 + segment_count;
    if data.len() < seg_table_end {
        return None;
    }
    let payload_len: usize = data[27..seg_table_end].iter().map(|&b| b as usize).sum();
    let payload_start = seg_table_end;
    let payload_end = (payload_start + payload_len).min(data.len());
    Some(Page {
        granule_position,
        segment_data: &data[payload_start..payload_end],
        header_len: seg_table_end,
        total_len: seg_table_end + payload_len,
    })
}

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let head_cap = OGG_TAIL_CAP.min(size as usize);
    let Ok(head) = crate::common::read_capped(reader, head_cap) else {
        return ContainerOutput::mismatch();
    };
    if head.len() < 4 || &head[0..4] != CAPTURE_PATTERN {
        return ContainerOutput::mismatch();
    }

    let mut pos = 0usize;
    let mut page_count = 0usize;
    let mut identification: Option<opus_vorbis::IdentificationInfo> = None;
    let mut comment: Option<opus_vorbis::CommentInfo> = None;
    while pos < head.len() && page_count < HEAD_PAGE_CAP {
        let Some(page) = parse_page(&head[pos..]) else { break };
        if identification.is_none() {
            identification = opus_vorbis::parse_identification(page.segment_data);
        } else if comment.is_none() {
            comment = opus_vorbis::parse_comments(page.segment_data);
        }
        pos += page.total_len;
        page_count += 1;
        if identification.is_some() && comment.is_some() {
            break;
        }
    }

    let Some(ident) = identification else {
        return ContainerOutput::mismatch();
    };

    let last_granule = find_last_granule(reader, size);

    let mut stream = Stream::new(StreamKind::Audio);
    stream.append_field_unique(Field::new("Format", ident.codec));
    stream.append_field_unique(Field::new("Channel(s)", format_channels(ident.channels as u64)));
    stream.append_field_unique(Field::new(
        "Sampling rate",
        format_sample_rate(ident.sample_rate as f64),
    ));

    let mut info = ContainerInfo::default();
    if let Some(granule) = last_granule {
        if granule > 0 && ident.sample_rate > 0 {
            let duration = granule as f64 / ident.sample_rate as f64;
            info.duration_seconds = duration;
            stream.append_field_unique(Field::new("Duration", format_duration(duration)));
            if size > 0 {
                let bitrate = (size as f64 * 8.0) / duration;
                info.overall_bitrate_min = bitrate;
                info.overall_bitrate_max = bitrate;
                stream.append_field_unique(Field::new("Bit rate", format_bitrate(bitrate)));
            }
        }
    }

    let mut general_fields = vec![Field::new("Format", "Ogg")];
    if let Some(c) = comment {
        if !c.vendor.is_empty() {
            general_fields.push(Field::new("Writing library", c.vendor));
        }
        if let Some(encoder) = c.encoder {
            general_fields.push(Field::new("Writing application", encoder));
        }
    }

    ContainerOutput {
        info,
        streams: vec![stream],
        general_fields,
        ok: true,
    }
}

/// Expands the tail-read window (1 page chunk at a time conceptually, but
/// implemented here as a single read of up to [`OGG_TAIL_CAP`] bytes from
/// the file's end, matching spec.md's "expanding window up to 4 MiB")
/// looking for the last well-formed page's granule position.
fn find_last_granule<R: Read + Seek>(reader: &mut R, size: u64) -> Option<i64> {
    let window = OGG_TAIL_CAP.min(size as usize);
    if window == 0 {
        return None;
    }
    reader.seek(SeekFrom::End(-(window as i64))).ok()?;
    let mut buf = vec![0u8; window];
    reader.read_exact(&mut buf).ok()?;

    let mut last_granule = None;
    let mut pos = 0usize;
    while pos < buf.len() {
        let Some(idx) = buf[pos..]
            .windows(4)
            .position(|w| w == CAPTURE_PATTERN)
            .map(|i| i + pos)
        else {
            break;
        };
        let Some(page) = parse_page(&buf[idx..]) else {
            pos = idx + 1;
            continue;
        };
        last_granule = Some(page.granule_position);
        pos = idx + page.header_len.max(1);
    }
    last_granule
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build_page(granule: i64, segment_data: &[u8]) -> Vec<u8> {
        let mut page = Vec::new();
        page.extend_from_slice(CAPTURE_PATTERN);
        page.push(0); // version
        page.push(0x02); // header_type: beginning-of-stream
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&0u32.to_le_bytes()); // serial number
        page.extend_from_slice(&0u32.to_le_bytes()); // page sequence
        page.extend_from_slice(&0u32.to_le_bytes()); // checksum
        let segments = (segment_data.len() / 255) + 1;
        page.push(segments as u8);
        let mut remaining = segment_data.len();
        for _ in 0..segments {
            let seg = remaining.min(255);
            page.push(seg as u8);
            remaining -= seg;
        }
        page.extend_from_slice(segment_data);
        page
    }

    #[test]
    fn identifies_opus_head_and_duration() {
        let mut opus_head = b"OpusHead".to_vec();
        opus_head.push(1); // version
        opus_head.push(2); // channels
        opus_head.extend_from_slice(&[0u8; 9]);
        let data = build_page(0, &opus_head);
        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        assert!(out.streams[0]
            .fields
            .iter()
            .any(|f| f.name == "Format" && f.value == "Opus"));
    }

    #[test]
    fn non_ogg_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let out = parse(&mut cursor, 16);
        assert!(!out.ok);
    }
}
