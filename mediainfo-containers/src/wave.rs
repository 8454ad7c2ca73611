//! §4.3.g Wave. RIFF/WAVE chunk walk: `fmt ` for format/channels/sample
//! rate/bits-per-sample, `data` for payload size, `LIST/INFO/ISFT` for the
//! writing application. Chunks are padded to an even size per the RIFF
//! spec; odd-length chunk bodies are followed by one skipped pad byte.

use std::io::{Read, Seek, SeekFrom};

use mediainfo_report::{
    format_bitrate, format_channels, format_duration, format_sample_rate, ContainerInfo, Field,
    Stream, StreamKind,
};

use crate::common::ContainerOutput;

struct Chunk<'a> {
    id: [u8; 4],
    data: &'a [u8],
}

fn iter_chunks(data: &[u8]) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= data.len() {
        let mut id = [0u8; 4];
        id.copy_from_slice(&data[pos..pos + 4]);
        let size = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body_start = pos + 8;
        let body_end = (body_start + size).min(data.len());
        if body_start > data.len() {
            break;
        }
        out.push(Chunk {
            id,
            data: &data[body_start..body_end],
        });
        let padded_size = size + (size & 1);
        pos = body_start + padded_size;
    }
    out
}

fn id_str(id: &[u8; 4]) -> &str {
    std::str::from_utf8(id).unwrap_or("????")
}

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let mut data = Vec::with_capacity(size as usize);
    if reader.read_to_end(&mut data).is_err() {
        return ContainerOutput::mismatch();
    }
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return ContainerOutput::mismatch();
    }
    let chunks = iter_chunks(&data[12..]);

    let Some(fmt_chunk) = chunks.iter().find(|c| id_str(&c.id) == "fmt ") else {
        return ContainerOutput::mismatch();
    };
    let Some(fmt) = parse_fmt(fmt_chunk.data) else {
        return ContainerOutput::mismatch();
    };

    let mut stream = Stream::new(StreamKind::Audio);
    stream.append_field_unique(Field::new("Format", fmt.format_name));
    stream.append_field_unique(Field::new("Channel(s)", format_channels(fmt.channels as u64)));
    stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(fmt.sample_rate as f64)));
    if fmt.bits_per_sample > 0 {
        stream.append_field_unique(Field::new("Bit depth", format!("{} bits", fmt.bits_per_sample)));
    }

    let mut info = ContainerInfo::default();
    if let Some(data_chunk) = chunks.iter().find(|c| id_str(&c.id) == "data") {
        let payload_bytes = data_chunk.data.len() as i64;
        if fmt.byte_rate > 0 {
            let duration = payload_bytes as f64 / fmt.byte_rate as f64;
            info.duration_seconds = duration;
            stream.append_field_unique(Field::new("Duration", format_duration(duration)));
            let bitrate = fmt.byte_rate as f64 * 8.0;
            info.overall_bitrate_min = bitrate;
            info.overall_bitrate_max = bitrate;
            stream.append_field_unique(Field::new("Bit rate", format_bitrate(bitrate)));
        }
    }

    let mut general_fields = vec![Field::new("Format", "Wave")];
    if let Some(writing_app) = find_isft(&chunks) {
        general_fields.push(Field::new("Writing application", writing_app));
    }

    ContainerOutput {
        info,
        streams: vec![stream],
        general_fields,
        ok: true,
    }
}

struct FmtInfo {
    format_name: &'static str,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    bits_per_sample: u16,
}

fn parse_fmt(data: &[u8]) -> Option<FmtInfo> {
    if data.len() < 16 {
        return None;
    }
    let audio_format = u16::from_le_bytes([data[0], data[1]]);
    let channels = u16::from_le_bytes([data[2], data[3]]);
    let sample_rate = u32::from_le_bytes(data[4..8].try_into().unwrap());
    let byte_rate = u32::from_le_bytes(data[8..12].try_into().unwrap());
    let bits_per_sample = u16::from_le_bytes([data[14], data[15]]);
    let format_name = if audio_format == 1 { "PCM" } else { "Unknown" };
    Some(FmtInfo {
        format_name,
        channels,
        sample_rate,
        byte_rate,
        bits_per_sample,
    })
}

/// `LIST` chunk of list-type `INFO` carries sub-chunks keyed by a
/// four-char tag; `ISFT` ("software") is the writing-application string.
fn find_isft(chunks: &[Chunk<'_>]) -> Option<String> {
    for chunk in chunks.iter().filter(|c| id_str(&c.id) == "LIST") {
        if chunk.data.len() < 4 || &chunk.data[0..4] != b"INFO" {
            continue;
        }
        let sub_chunks = iter_chunks(&chunk.data[4..]);
        for sub in sub_chunks.iter().filter(|c| id_str(&c.id) == "ISFT") {
            let text = String::from_utf8_lossy(sub.data)
                .trim_end_matches('\0')
                .to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(id);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn build_wave(fmt_body: &[u8], data_body: &[u8]) -> Vec<u8> {
        let mut riff_body = b"WAVE".to_vec();
        riff_body.extend(chunk(b"fmt ", fmt_body));
        riff_body.extend(chunk(b"data", data_body));
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(riff_body.len() as u32).to_le_bytes());
        out.extend(riff_body);
        out
    }

    fn pcm_fmt(channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
        let block_align = channels * (bits / 8);
        let byte_rate = sample_rate * block_align as u32;
        let mut body = vec![1u8, 0]; // PCM
        body.extend_from_slice(&channels.to_le_bytes());
        body.extend_from_slice(&sample_rate.to_le_bytes());
        body.extend_from_slice(&byte_rate.to_le_bytes());
        body.extend_from_slice(&block_align.to_le_bytes());
        body.extend_from_slice(&bits.to_le_bytes());
        body
    }

    #[test]
    fn parses_pcm_fmt_and_duration() {
        let fmt = pcm_fmt(2, 44100, 16);
        let data = vec![0u8; 44100 * 4]; // 1 second of stereo 16-bit audio
        let wave = build_wave(&fmt, &data);
        let mut cursor = Cursor::new(wave.clone());
        let out = parse(&mut cursor, wave.len() as u64);
        assert!(out.ok);
        assert!((out.info.duration_seconds - 1.0).abs() < 1e-6);
        assert!(out.streams[0]
            .fields
            .iter()
            .any(|f| f.name == "Channel(s)" && f.value == "2 channels"));
    }

    #[test]
    fn non_riff_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let out = parse(&mut cursor, 16);
        assert!(!out.ok);
    }
}
