//! §4.3.f FLAC. The magic and metadata-block walk are delegated to
//! `anni-flac` (`anni_flac::parse_flac`), which already decodes the
//! STREAMINFO bit layout (20-bit sample rate, 3-bit channels, 5-bit
//! bits-per-sample, 36-bit total samples) this format needs; this module
//! is only responsible for turning that struct into the report model and
//! deriving duration/bitrate from it.

use std::io::{Read, Seek, SeekFrom};

use anni_flac::MetadataBlockData;
use mediainfo_report::{
    format_bitrate, format_channels, format_duration, format_sample_rate, ContainerInfo, Field,
    Stream, StreamKind,
};

use crate::common::ContainerOutput;

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let mut data = Vec::with_capacity(size as usize);
    if reader.read_to_end(&mut data).is_err() {
        return ContainerOutput::mismatch();
    }
    if data.len() < 4 || &data[0..4] != b"fLaC" {
        return ContainerOutput::mismatch();
    }
    let Ok(flac) = anni_flac::parse_flac(&data) else {
        return ContainerOutput::mismatch();
    };

    let stream_info = flac
        .metadata_blocks
        .iter()
        .find_map(|b| match &b.data {
            MetadataBlockData::StreamInfo(info) => Some(info),
            _ => None,
        });
    let Some(info) = stream_info else {
        return ContainerOutput::mismatch();
    };

    let mut container_info = ContainerInfo::default();
    let mut stream = Stream::new(StreamKind::Audio);
    stream.append_field_unique(Field::new("Format", "FLAC"));
    stream.append_field_unique(Field::new("Channel(s)", format_channels(info.channels as u64)));
    stream.append_field_unique(Field::new(
        "Sampling rate",
        format_sample_rate(info.sample_rate as f64),
    ));
    stream.append_field_unique(Field::new(
        "Bit depth",
        format!("{} bits", info.bits_per_sample),
    ));

    if info.sample_rate > 0 && info.total_samples > 0 {
        let duration = info.total_samples as f64 / info.sample_rate as f64;
        container_info.duration_seconds = duration;
        stream.append_field_unique(Field::new("Duration", format_duration(duration)));
        if size > 0 {
            let bitrate = (size as f64 * 8.0) / duration;
            container_info.overall_bitrate_min = bitrate;
            container_info.overall_bitrate_max = bitrate;
            stream.append_field_unique(Field::new("Bit rate", format_bitrate(bitrate)));
        }
    }

    let mut general_fields = vec![Field::new("Format", "FLAC")];
    let vorbis_comment = flac.metadata_blocks.iter().find_map(|b| match &b.data {
        MetadataBlockData::VorbisComment(c) => Some(c),
        _ => None,
    });
    if let Some(comments) = vorbis_comment {
        apply_vorbis_comments(&mut general_fields, comments);
    }

    ContainerOutput {
        info: container_info,
        streams: vec![stream],
        general_fields,
        ok: true,
    }
}

/// `anni_flac`'s `VorbisComment` block stores each comment as a raw
/// `"KEY=value"` string (`UserComment.comment`); split on the first `=`
/// and map the handful of keys this report surfaces. `bits_per_sample`/
/// `channels` on `BlockStreamInfo` are biased by one, matching the
/// on-disk `(value - 1)` encoding.
fn apply_vorbis_comments(
    general_fields: &mut Vec<Field>,
    comments: &anni_flac::MetadataBlockVorbisComment,
) {
    for comment in comments.comments.iter() {
        let Some((key, value)) = comment.comment.split_once('=') else {
            continue;
        };
        let field_name = match key.to_ascii_uppercase().as_str() {
            "ENCODER" => "Writing application",
            "TITLE" => "Track name",
            "ALBUM" => "Album",
            "ARTIST" => "Performer",
            _ => continue,
        };
        general_fields.push(Field::new(field_name, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build_stream_info_block(sample_rate: u32, channels: u8, bits: u8, total_samples: u64) -> Vec<u8> {
        let mut payload = vec![0u8; 34];
        payload[0..2].copy_from_slice(&4096u16.to_be_bytes());
        payload[2..4].copy_from_slice(&4096u16.to_be_bytes());
        let packed = ((sample_rate as u64) << 44)
            | (((channels - 1) as u64) << 41)
            | (((bits - 1) as u64) << 36)
            | (total_samples & 0xF_FFFF_FFFF);
        payload[10..18].copy_from_slice(&packed.to_be_bytes());
        let mut block = vec![0x80u8]; // last-block flag + type 0
        block.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        block.extend_from_slice(&payload);
        block
    }

    #[test]
    fn parses_streaminfo_duration_and_rate() {
        let mut data = b"fLaC".to_vec();
        data.extend(build_stream_info_block(44100, 2, 16, 44100 * 4));
        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        assert_eq!(out.info.duration_seconds, 4.0);
        assert!(out.streams[0]
            .fields
            .iter()
            .any(|f| f.name == "Sampling rate" && f.value == "44.1 kHz"));
    }

    #[test]
    fn non_flac_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let out = parse(&mut cursor, 16);
        assert!(!out.ok);
    }
}
