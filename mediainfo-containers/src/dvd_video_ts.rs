//! §4.3.i DVD VIDEO_TS (IFO/BUP), grounded on `original_source/dvd.go`.
//! Single-file scope: continuous-title-set VOB aggregation is out of scope
//! (per the specification's Non-goals), so `Stream size`/`File size` here
//! reflect the IFO/BUP file itself, not the title set's VOBs.

use std::io::{Read, Seek, SeekFrom};

use mediainfo_report::{
    format_bitrate, format_channels, format_duration, format_frame_rate, format_language,
    format_sample_rate, ContainerInfo, Field, Stream, StreamKind,
};

use crate::common::ContainerOutput;

const SECTOR_SIZE: usize = 2048;

const VIDEO_ATTR_VMG_OFFSET: usize = 0x0100;
const AUDIO_COUNT_VMG_OFFSET: usize = 0x0102;
const AUDIO_ATTR_VMG_OFFSET: usize = 0x0104;
const VIDEO_ATTR_VTS_OFFSET: usize = 0x0200;
const AUDIO_COUNT_VTS_OFFSET: usize = 0x0202;
const AUDIO_ATTR_VTS_OFFSET: usize = 0x0204;

const PTT_SRPT_POINTER_OFFSET: usize = 0x00C8;
const PGCI_POINTER_OFFSET: usize = 0x00CC;

struct VideoAttrs {
    version: &'static str,
    standard: &'static str,
    aspect_ratio: &'static str,
    width: u32,
    height: u32,
    frame_rate: f64,
}

struct AudioAttrs {
    format: &'static str,
    format_info: &'static str,
    channels: u8,
    sample_rate: f64,
    language_raw: String,
}

pub fn parse<R: Read + Seek>(reader: &mut R, size: u64) -> ContainerOutput {
    reader.seek(SeekFrom::Start(0)).ok();
    let mut data = Vec::with_capacity(size as usize);
    if reader.read_to_end(&mut data).is_err() || data.len() < 0x0206 {
        return ContainerOutput::mismatch();
    }
    let is_vts = &data[0..12] == b"DVDVIDEO-VTS";
    let is_vmg = &data[0..12] == b"DVDVIDEO-VMG";
    if !is_vts && !is_vmg {
        return ContainerOutput::mismatch();
    }

    let video_attrs = if is_vmg {
        parse_video_attrs(&data, VIDEO_ATTR_VMG_OFFSET)
    } else {
        parse_video_attrs(&data, VIDEO_ATTR_VTS_OFFSET)
    };

    let mut general_fields = vec![Field::new("Format", "DVD Video")];
    if is_vmg {
        general_fields.push(Field::new("Format profile", "Menu"));
    } else {
        general_fields.push(Field::new("Format profile", "Program"));
    }

    let mut info = ContainerInfo::default();
    let mut chapter_starts_ms: Vec<i64> = Vec::new();
    if is_vts {
        let ptt_offset = dvd_pointer(&data, PTT_SRPT_POINTER_OFFSET);
        let pgc_offset = dvd_pointer(&data, PGCI_POINTER_OFFSET);
        if let (Some(ptt), Some(pgc)) = (ptt_offset, pgc_offset) {
            let (duration, starts) = parse_chapters(&data, ptt, pgc);
            info.duration_seconds = duration;
            chapter_starts_ms = starts;
        }
        if info.has_duration() {
            general_fields.push(Field::new("Duration", format_duration(info.duration_seconds)));
        }
    }

    general_fields.push(Field::new("Overall bit rate mode", "Variable"));
    if info.has_duration() && size > 0 {
        let overall = (size as f64 * 8.0) / info.duration_seconds;
        info.overall_bitrate_min = overall;
        info.overall_bitrate_max = overall;
        general_fields.push(Field::new("Overall bit rate", format_bitrate(overall)));
    }
    if video_attrs.frame_rate > 0.0 {
        general_fields.push(Field::new("Frame rate", format_frame_rate(video_attrs.frame_rate)));
    }

    let mut streams = Vec::new();
    streams.push(build_video_stream(&video_attrs, info.duration_seconds));

    if is_vts {
        let audio_attrs = parse_audio_attrs(&data, AUDIO_COUNT_VTS_OFFSET, AUDIO_ATTR_VTS_OFFSET);
        if let Some(audio) = audio_attrs.first() {
            streams.push(build_audio_stream(audio, info.duration_seconds));
        }
    }

    if is_vmg {
        let mut text = Stream::new(StreamKind::Text);
        text.append_field_unique(Field::new("Format", "RLE"));
        text.append_field_unique(Field::new("Format/Info", "Run-length encoding"));
        text.append_field_unique(Field::new("Bit depth", "2 bits"));
        streams.push(text);
    }

    if !chapter_starts_ms.is_empty() && info.has_duration() {
        streams.push(build_menu_stream(&chapter_starts_ms, info.duration_seconds));
    }

    ContainerOutput {
        info,
        streams,
        general_fields,
        ok: true,
    }
}

fn parse_video_attrs(data: &[u8], offset: usize) -> VideoAttrs {
    if offset + 2 > data.len() {
        return VideoAttrs {
            version: "",
            standard: "",
            aspect_ratio: "",
            width: 0,
            height: 0,
            frame_rate: 0.0,
        };
    }
    let b0 = data[offset];
    let b1 = data[offset + 1];
    let coding = (b0 >> 6) & 0x03;
    let standard_code = (b0 >> 4) & 0x03;
    let aspect_code = (b0 >> 2) & 0x03;
    let res_code = (b1 >> 3) & 0x03;

    let version = match coding {
        0 => "Version 1",
        1 => "Version 2",
        _ => "",
    };
    let (standard, frame_rate) = match standard_code {
        0 => ("NTSC", 29.97),
        1 => ("PAL", 25.0),
        _ => ("", 0.0),
    };
    let aspect_ratio = match aspect_code {
        0 => "4:3",
        3 => "16:9",
        _ => "",
    };
    let (width, height) = match (standard, res_code) {
        ("PAL", 0) => (720, 576),
        ("PAL", 1) => (704, 576),
        ("PAL", 2) => (352, 576),
        ("PAL", 3) => (352, 288),
        ("NTSC", 0) => (720, 480),
        ("NTSC", 1) => (704, 480),
        ("NTSC", 2) => (352, 480),
        ("NTSC", 3) => (352, 240),
        _ => (0, 0),
    };

    VideoAttrs {
        version,
        standard,
        aspect_ratio,
        width,
        height,
        frame_rate,
    }
}

fn parse_audio_attrs(data: &[u8], count_offset: usize, attr_offset: usize) -> Vec<AudioAttrs> {
    if count_offset >= data.len() || attr_offset >= data.len() {
        return Vec::new();
    }
    let count = data[count_offset] as usize + 1;
    let mut out = Vec::new();
    for i in 0..count {
        let off = attr_offset + i * 8;
        if off + 8 > data.len() {
            break;
        }
        let b0 = data[off];
        let b1 = data[off + 1];
        let code = (b0 >> 5) & 0x07;
        let (format, format_info) = audio_format(code);
        let lang = String::from_utf8_lossy(&data[off + 2..off + 4]).trim().to_string();
        let sample_code = (b1 >> 4) & 0x03;
        let sample_rate = match sample_code {
            0 => 48000.0,
            1 => 96000.0,
            _ => 0.0,
        };
        let channels = (b1 & 0x07) + 1;
        out.push(AudioAttrs {
            format,
            format_info,
            channels,
            sample_rate,
            language_raw: lang,
        });
    }
    out
}

fn audio_format(code: u8) -> (&'static str, &'static str) {
    match code {
        0 => ("AC-3", "Audio Coding 3"),
        2 => ("MPEG Audio", "MPEG Audio"),
        3 => ("LPCM", "Linear PCM"),
        4 => ("DTS", "Digital Theater Systems"),
        _ => ("", ""),
    }
}

fn dvd_pointer(data: &[u8], offset: usize) -> Option<usize> {
    if offset + 4 > data.len() {
        return None;
    }
    let sector = u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap());
    if sector == 0 {
        return None;
    }
    let pos = sector as usize * SECTOR_SIZE;
    if pos == 0 || pos >= data.len() {
        return None;
    }
    Some(pos)
}

/// PTT_SRPT (title->PGC/program map) plus PGCI (PGC table) walk, yielding
/// total title duration and each chapter's start offset in milliseconds.
/// `cellIdx == cellTimes.len()` is treated as valid (an off-by-one relative
/// to a strict `>` bound would reject an empty trailing cell-time table
/// when the last chapter consists of exactly one cell) — see DESIGN.md.
fn parse_chapters(data: &[u8], ptt_offset: usize, pgc_offset: usize) -> (f64, Vec<i64>) {
    if ptt_offset + 8 > data.len() || pgc_offset + 8 > data.len() {
        return (0.0, Vec::new());
    }
    let ptt_count = u16::from_be_bytes(data[ptt_offset..ptt_offset + 2].try_into().unwrap());
    if ptt_count == 0 {
        return (0.0, Vec::new());
    }
    let ptt_end_rel = u32::from_be_bytes(data[ptt_offset + 4..ptt_offset + 8].try_into().unwrap()) as usize;
    if data.len() < ptt_offset + 12 {
        return (0.0, Vec::new());
    }
    let ptt_start_rel = u32::from_be_bytes(data[ptt_offset + 8..ptt_offset + 12].try_into().unwrap()) as usize;
    if ptt_start_rel == 0 || ptt_end_rel == 0 {
        return (0.0, Vec::new());
    }
    let ptt_start = ptt_offset + ptt_start_rel;
    let ptt_end = ptt_offset + ptt_end_rel + 1;
    if ptt_start >= data.len() || ptt_end > data.len() || ptt_end <= ptt_start {
        return (0.0, Vec::new());
    }

    let mut entries: Vec<(u16, u16)> = Vec::new();
    let mut pos = ptt_start;
    while pos + 4 <= ptt_end {
        let pgcn = u16::from_be_bytes(data[pos..pos + 2].try_into().unwrap());
        let pgn = u16::from_be_bytes(data[pos + 2..pos + 4].try_into().unwrap());
        if pgcn != 0 && pgn != 0 {
            entries.push((pgcn, pgn));
        }
        pos += 4;
    }
    if entries.is_empty() {
        return (0.0, Vec::new());
    }

    let pgc_count = u16::from_be_bytes(data[pgc_offset..pgc_offset + 2].try_into().unwrap());
    if pgc_count == 0 {
        return (0.0, Vec::new());
    }
    let pgcn = entries[0].0 as usize;
    if pgcn < 1 || pgcn > pgc_count as usize {
        return (0.0, Vec::new());
    }
    let pgc_entry_off = pgc_offset + 8 + (pgcn - 1) * 8;
    if pgc_entry_off + 8 > data.len() {
        return (0.0, Vec::new());
    }
    let pgc_offset_rel = u32::from_be_bytes(data[pgc_entry_off + 4..pgc_entry_off + 8].try_into().unwrap()) as usize;
    let pgc_base = pgc_offset + pgc_offset_rel;
    if pgc_base + 0x00EA > data.len() {
        return (0.0, Vec::new());
    }

    let duration_ms = dvd_time_to_ms(&data[pgc_base + 4..pgc_base + 8]);
    let duration = duration_ms as f64 / 1000.0;
    let program_count = data[pgc_base + 2] as usize;
    let cell_count = data[pgc_base + 3] as usize;
    if program_count == 0 || cell_count == 0 {
        return (duration, Vec::new());
    }

    let prog_map_off = u16::from_be_bytes(data[pgc_base + 0x00E6..pgc_base + 0x00E8].try_into().unwrap()) as usize;
    let cell_play_off = u16::from_be_bytes(data[pgc_base + 0x00E8..pgc_base + 0x00EA].try_into().unwrap()) as usize;
    let prog_map_start = pgc_base + prog_map_off;
    let cell_play_start = pgc_base + cell_play_off;
    if prog_map_start + program_count > data.len() || cell_play_start >= data.len() {
        return (duration, Vec::new());
    }

    let program_map = &data[prog_map_start..prog_map_start + program_count];
    let mut cell_times: Vec<i64> = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        let entry_start = cell_play_start + i * 0x18;
        if entry_start + 8 > data.len() {
            break;
        }
        cell_times.push(dvd_time_to_ms(&data[entry_start + 4..entry_start + 8]));
    }

    let mut starts = Vec::new();
    for (entry_pgcn, entry_pgn) in entries {
        if entry_pgcn as usize != pgcn {
            continue;
        }
        let pgn = entry_pgn as usize;
        if pgn < 1 || pgn > program_map.len() {
            continue;
        }
        let cell_idx = program_map[pgn - 1] as i64 - 1;
        if cell_idx < 0 || cell_idx as usize > cell_times.len() {
            continue;
        }
        let cell_idx = cell_idx as usize;
        let mut start = 0i64;
        for t in cell_times.iter().take(cell_idx) {
            start += t;
        }
        starts.push(start);
    }
    (duration, starts)
}

/// BCD `hh:mm:ss:ff` with the frame-rate flag in the top 2 bits of the
/// frame byte: `01` -> 25 fps (40 ms ticks -> `frame * 3600` 90kHz ticks),
/// `11` -> 29.97 fps (`frame * 3000` ticks); `00`/`10` carry no sub-second
/// component.
fn dvd_time_to_ms(b: &[u8]) -> i64 {
    if b.len() < 4 {
        return 0;
    }
    let h = bcd(b[0]);
    let m = bcd(b[1]);
    let s = bcd(b[2]);
    let frame = bcd(b[3] & 0x3F);
    let fps_code = (b[3] >> 6) & 0x03;
    let mut ticks = (h * 3600 + m * 60 + s) as i64 * 90_000;
    match fps_code {
        1 => ticks += frame as i64 * 3600,
        3 => ticks += frame as i64 * 3000,
        _ => {}
    }
    (ticks * 1000 + 45_000) / 90_000
}

fn bcd(v: u8) -> u32 {
    ((v >> 4) * 10 + (v & 0x0F)) as u32
}

fn build_video_stream(attrs: &VideoAttrs, duration: f64) -> Stream {
    let mut stream = Stream::new(StreamKind::Video);
    stream.append_field_unique(Field::new("Format", "MPEG Video"));
    if !attrs.version.is_empty() {
        stream.append_field_unique(Field::new("Format version", attrs.version));
    }
    stream.append_field_unique(Field::new("ID", "224 (0xE0)"));
    stream.append_field_unique(Field::new("Bit rate mode", "Variable"));
    if duration > 0.0 {
        stream.append_field_unique(Field::new("Duration", format_duration(duration)));
    }
    if attrs.width > 0 {
        stream.append_field_unique(Field::new("Width", format!("{} pixels", attrs.width)));
    }
    if attrs.height > 0 {
        stream.append_field_unique(Field::new("Height", format!("{} pixels", attrs.height)));
    }
    if !attrs.aspect_ratio.is_empty() {
        stream.append_field_unique(Field::new("Display aspect ratio", attrs.aspect_ratio));
    }
    if attrs.frame_rate > 0.0 {
        stream.append_field_unique(Field::new("Frame rate", format_frame_rate(attrs.frame_rate)));
    }
    if !attrs.standard.is_empty() {
        stream.append_field_unique(Field::new("Standard", attrs.standard));
    }
    stream.append_field_unique(Field::new("Compression mode", "Lossy"));
    stream
}

fn build_audio_stream(attrs: &AudioAttrs, duration: f64) -> Stream {
    let mut stream = Stream::new(StreamKind::Audio);
    stream.append_field_unique(Field::new("ID", "189 (0xBD)-128 (0x80)"));
    if !attrs.format.is_empty() {
        stream.append_field_unique(Field::new("Format", attrs.format));
    }
    if !attrs.format_info.is_empty() {
        stream.append_field_unique(Field::new("Format/Info", attrs.format_info));
    }
    if duration > 0.0 {
        stream.append_field_unique(Field::new("Duration", format_duration(duration)));
    }
    if attrs.channels > 0 {
        stream.append_field_unique(Field::new("Channel(s)", format_channels(attrs.channels as u64)));
    }
    if attrs.sample_rate > 0.0 {
        stream.append_field_unique(Field::new("Sampling rate", format_sample_rate(attrs.sample_rate)));
    }
    stream.append_field_unique(Field::new("Compression mode", "Lossy"));
    if !attrs.language_raw.is_empty() {
        stream.append_field_unique(Field::new("Language", format_language(&attrs.language_raw)));
    }
    stream
}

fn build_menu_stream(chapter_starts_ms: &[i64], duration: f64) -> Stream {
    let mut stream = Stream::new(StreamKind::Menu);
    stream.append_field_unique(Field::new("Duration", format_duration(duration)));
    for (i, &start_ms) in chapter_starts_ms.iter().enumerate() {
        stream.append_field_unique(Field::new(format_chapter_time_ms(start_ms), format!("Chapter {}", i + 1)));
    }
    stream.append_field_unique(Field::new("List (Audio)", "0"));
    stream
}

fn format_chapter_time_ms(ms_total: i64) -> String {
    let ms_total = ms_total.max(0);
    let h = ms_total / (3600 * 1000);
    let mut rem = ms_total - h * 3600 * 1000;
    let m = rem / (60 * 1000);
    rem -= m * 60 * 1000;
    let s = rem / 1000;
    let ms = rem - s * 1000;
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ntsc_vts_file() -> Vec<u8> {
        let mut data = vec![0u8; 0x0300];
        data[0..12].copy_from_slice(b"DVDVIDEO-VTS");
        // video attrs at 0x0200: coding=1 (Version 2), standard=0 (NTSC), aspect=0 (4:3), res=0 (720x480)
        data[VIDEO_ATTR_VTS_OFFSET] = 0b0100_0000;
        data[VIDEO_ATTR_VTS_OFFSET + 1] = 0b0000_0000;
        // one audio stream: AC-3, 48 kHz, stereo
        data[AUDIO_COUNT_VTS_OFFSET] = 0;
        data[AUDIO_ATTR_VTS_OFFSET] = 0b000_00000;
        data[AUDIO_ATTR_VTS_OFFSET + 1] = 0b0000_0001; // sample_code=0, channels=1(+1=2)
        data[AUDIO_ATTR_VTS_OFFSET + 2..AUDIO_ATTR_VTS_OFFSET + 4].copy_from_slice(b"en");
        data
    }

    #[test]
    fn parses_video_and_audio_attrs() {
        let data = ntsc_vts_file();
        let mut cursor = Cursor::new(data.clone());
        let out = parse(&mut cursor, data.len() as u64);
        assert!(out.ok);
        let video = out.streams.iter().find(|s| s.kind() == StreamKind::Video).unwrap();
        assert!(video.fields.iter().any(|f| f.name == "Width" && f.value == "720 pixels"));
        let audio = out.streams.iter().find(|s| s.kind() == StreamKind::Audio).unwrap();
        assert!(audio.fields.iter().any(|f| f.name == "Format" && f.value == "AC-3"));
        assert!(audio.fields.iter().any(|f| f.name == "Language" && f.value == "English"));
    }

    #[test]
    fn non_dvd_input_is_a_mismatch() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let out = parse(&mut cursor, 16);
        assert!(!out.ok);
    }
}
