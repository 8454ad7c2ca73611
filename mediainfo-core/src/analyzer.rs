//! Analyzer/aggregator: dispatches on the detected container format,
//! assembles the General stream, and fills the handful of derived fields
//! that belong to the aggregator rather than to individual container
//! parsers (a video stream's `Frame rate`/`Frame rate mode`/
//! `Bits/(Pixel*Frame)`, `Stream size` percentages, and the promotion of
//! the first video stream's frame rate up to General).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use mediainfo_containers::{detect_format, ContainerOutput, Format};
use mediainfo_report::{
    format_bitrate, format_bits_per_pixel_frame, format_bytes, format_duration,
    format_frame_rate, format_stream_size, infer_bitrate_mode, sort_fields, sort_streams, Field,
    Report, Stream, StreamKind,
};

use crate::error::Error;

/// Sniff buffer handed to the format detector; generous enough to cover
/// every container magic this crate knows about (the deepest being the
/// 3-packet MPEG-TS stride probe at up to `4 + 192*2 + 1` bytes) while
/// staying a single small read.
const SNIFF_LEN: usize = 8 * 1024;

/// Runs the full pipeline over one file: detect, dispatch, parse, assemble.
/// The only error this returns is a filesystem failure (`stat`/`open`);
/// every other recoverable condition (format mismatch, malformed payload)
/// yields a `Report` instead.
pub fn analyze(path: impl AsRef<Path>) -> Result<Report, Error> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_size = metadata.len() as i64;
    let mut file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sniff = vec![0u8; SNIFF_LEN.min(file_size.max(0) as usize)];
    let n = file.read(&mut sniff).unwrap_or(0);
    sniff.truncate(n);
    file.seek(SeekFrom::Start(0)).ok();

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let format = detect_format(&sniff, file_name);

    let mut general = Stream::new(StreamKind::General);
    general.append_field_unique(Field::new("Complete name", path.display().to_string()));
    general.append_field_unique(Field::new("File size", format_bytes(file_size)));

    let output = match format {
        Some(fmt) => dispatch(fmt, &mut file, file_size.max(0) as u64),
        None => {
            log::debug!("{}: no container format matched its magic", path.display());
            ContainerOutput::mismatch()
        }
    };

    if !output.ok {
        log::warn!("{}: container parser reported a mismatch, emitting a minimal report", path.display());
        general.append_field_unique(Field::new(
            "Format",
            format.map(Format::name).unwrap_or("Unknown"),
        ));
        sort_fields(StreamKind::General, &mut general.fields);
        return Ok(Report {
            path: path.display().to_string(),
            general,
            streams: Vec::new(),
        });
    }

    for field in output.general_fields {
        general.append_field_unique(field);
    }
    if general.find_field("Format").is_none() {
        general.append_field_unique(Field::new(
            "Format",
            format.map(Format::name).unwrap_or("Unknown"),
        ));
    }

    let mut streams = output.streams;
    assign_stream_ids(&mut streams);
    for stream in streams.iter_mut() {
        finalize_stream(stream, file_size);
    }

    promote_video_frame_rate(&mut general, &streams);

    if output.info.has_duration() {
        general.append_field_unique(Field::new("Duration", format_duration(output.info.duration_seconds)));
        apply_overall_bitrate(&mut general, output.info.overall_bitrate_max, || {
            (file_size as f64 * 8.0) / output.info.duration_seconds
        });
        if let Some(mode) = output.info.bitrate_mode {
            general.append_field_unique(Field::new("Overall bit rate mode", mode.as_str()));
        }
    }

    sort_fields(StreamKind::General, &mut general.fields);
    for stream in streams.iter_mut() {
        sort_fields(stream.kind(), &mut stream.fields);
    }
    sort_streams(&mut streams);

    Ok(Report {
        path: path.display().to_string(),
        general,
        streams,
    })
}

fn dispatch<R: Read + Seek>(format: Format, reader: &mut R, size: u64) -> ContainerOutput {
    use mediainfo_containers::*;
    match format {
        Format::IsoBmff => iso_bmff::parse(reader, size),
        Format::Matroska => matroska::parse(reader, size),
        Format::MpegTs => mpeg_ts::parse(reader, size),
        Format::MpegPs => mpeg_ps::parse(reader, size),
        Format::Flac => flac::parse(reader, size),
        Format::Wave => wave::parse(reader, size),
        Format::Ogg => ogg::parse(reader, size),
        Format::MpegAudio => mpeg_audio::parse(reader, size),
        Format::DvdIfo => dvd_video_ts::parse(reader, size),
    }
}

/// `ID` defaults to a 1-based, first-appearance index; container parsers
/// that already know a more meaningful identifier (a Matroska track
/// number, a TS PID, a PS stream ID) set their own `ID` field first and
/// this is a no-op for them (`append_field_unique`).
fn assign_stream_ids(streams: &mut [Stream]) {
    for (index, stream) in streams.iter_mut().enumerate() {
        stream.append_field_unique(Field::new("ID", (index + 1).to_string()));
    }
}

fn promote_video_frame_rate(general: &mut Stream, streams: &[Stream]) {
    if general.find_field("Frame rate").is_some() {
        return;
    }
    if let Some(rate) = streams
        .iter()
        .find(|s| s.kind() == StreamKind::Video)
        .and_then(|s| s.find_field("Frame rate"))
    {
        general.append_field_unique(Field::new("Frame rate", rate.to_string()));
    }
}

fn apply_overall_bitrate(general: &mut Stream, declared: f64, fallback: impl FnOnce() -> f64) {
    let overall = if declared > 0.0 { declared } else { fallback() };
    if overall <= 0.0 {
        return;
    }
    general.append_field_unique(Field::new("Overall bit rate", format_bitrate(overall)));
    if general.find_field("Overall bit rate mode").is_none() {
        if let Some(mode) = infer_bitrate_mode(overall) {
            general.append_field_unique(Field::new("Overall bit rate mode", mode.as_str()));
        }
    }
}

/// Fills the per-stream fields that belong to the aggregator rather than
/// to the container parser that produced `stream`: a video stream's
/// `Frame rate`/`Frame rate mode`/`Bits/(Pixel*Frame)` (the first derived
/// from a `FrameRate` JSON quantity some container parsers — MPEG-TS's
/// per-PID frame counter — leave unformatted), `Stream size` (from a
/// `StreamSize` JSON byte count), and `Bit rate mode` (from a `BitRateMode`
/// JSON hint, or inferred from how close the rendered `Bit rate` sits to a
/// round kbps value).
fn finalize_stream(stream: &mut Stream, file_size: i64) {
    if stream.kind() == StreamKind::Video {
        if stream.find_field("Frame rate").is_none() {
            if let Some(fps) = stream
                .json
                .get("FrameRate")
                .and_then(|raw| raw.parse::<f64>().ok())
            {
                if fps > 0.0 {
                    stream.append_field_unique(Field::new("Frame rate", format_frame_rate(fps)));
                }
            }
        }
        if stream.find_field("Frame rate").is_some() && stream.find_field("Frame rate mode").is_none() {
            stream.append_field_unique(Field::new("Frame rate mode", "Constant"));
        }
        if stream.find_field("Bits/(Pixel*Frame)").is_none() {
            if let (Some(width), Some(height), Some(fps), Some(bitrate)) = (
                parse_leading_u64(stream.find_field("Width")),
                parse_leading_u64(stream.find_field("Height")),
                parse_leading_f64(stream.find_field("Frame rate")),
                parse_bitrate(stream.find_field("Bit rate")),
            ) {
                let value = format_bits_per_pixel_frame(bitrate, width, height, fps);
                if !value.is_empty() {
                    stream.append_field_unique(Field::new("Bits/(Pixel*Frame)", value));
                }
            }
        }
    }

    if stream.find_field("Stream size").is_none() {
        if let Some(bytes) = stream.json.get("StreamSize").and_then(|v| v.parse::<i64>().ok()) {
            let value = format_stream_size(bytes, file_size);
            if !value.is_empty() {
                stream.append_field_unique(Field::new("Stream size", value));
            }
        }
    }

    if stream.find_field("Bit rate mode").is_none() {
        let hinted = stream.json.get("BitRateMode").and_then(|v| match v.as_str() {
            "Constant" => Some("Constant"),
            "Variable" => Some("Variable"),
            _ => None,
        });
        if let Some(mode) = hinted {
            stream.append_field_unique(Field::new("Bit rate mode", mode));
        } else if let Some(bitrate) = parse_bitrate(stream.find_field("Bit rate")) {
            if let Some(mode) = infer_bitrate_mode(bitrate) {
                stream.append_field_unique(Field::new("Bit rate mode", mode.as_str()));
            }
        }
    }
}

fn parse_leading_u64(value: Option<&str>) -> Option<u64> {
    value?.split_whitespace().next()?.parse().ok()
}

fn parse_leading_f64(value: Option<&str>) -> Option<f64> {
    value?.split_whitespace().next()?.parse().ok()
}

/// Reverses `format_bitrate`/`format_bitrate_kbps` well enough to recover a
/// bits-per-second value: strips the ` Mb/s`/` kb/s`/` b/s` suffix and the
/// space-grouped thousands separator `format_bitrate` inserts.
fn parse_bitrate(value: Option<&str>) -> Option<f64> {
    let v = value?;
    if let Some(num) = v.strip_suffix(" Mb/s") {
        return num.replace(' ', "").parse::<f64>().ok().map(|x| x * 1_000_000.0);
    }
    if let Some(num) = v.strip_suffix(" kb/s") {
        return num.replace(' ', "").parse::<f64>().ok().map(|x| x * 1_000.0);
    }
    if let Some(num) = v.strip_suffix(" b/s") {
        return num.replace(' ', "").parse::<f64>().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    fn flac_fixture() -> Vec<u8> {
        let mut payload = vec![0u8; 34];
        payload[0..2].copy_from_slice(&4096u16.to_be_bytes());
        payload[2..4].copy_from_slice(&4096u16.to_be_bytes());
        let sample_rate = 44100u64;
        let channels = 2u64;
        let bits = 16u64;
        let total_samples = 44100u64 * 2; // 2 seconds
        let packed = (sample_rate << 44) | ((channels - 1) << 41) | ((bits - 1) << 36) | total_samples;
        payload[10..18].copy_from_slice(&packed.to_be_bytes());
        let mut block = vec![0x80u8];
        block.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        block.extend_from_slice(&payload);
        let mut data = b"fLaC".to_vec();
        data.extend(block);
        data
    }

    #[test]
    fn analyzes_flac_fixture_end_to_end() {
        let data = flac_fixture();
        let file = write_temp(&data);
        let report = analyze(file.path()).unwrap();
        assert_eq!(report.general.kind(), StreamKind::General);
        assert!(report.general.find_field("Format") == Some("FLAC"));
        assert!(report.general.find_field("Duration").is_some());
        assert_eq!(report.streams.len(), 1);
        assert_eq!(report.streams[0].kind(), StreamKind::Audio);
        assert_eq!(report.streams[0].find_field("ID"), Some("1"));
    }

    #[test]
    fn unrecognized_input_yields_minimal_general_only_report() {
        let file = write_temp(&[0u8; 64]);
        let report = analyze(file.path()).unwrap();
        assert!(report.streams.is_empty());
        assert_eq!(report.general.find_field("Format"), Some("Unknown"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = analyze("/nonexistent/path/does-not-exist.mp4").unwrap_err();
        match err {
            Error::Io { .. } => {}
        }
    }
}
