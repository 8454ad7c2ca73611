//! §4.3.j format detector: byte sniffing against the first N bytes of a
//! file, falling back to an extension hint. Priority is deterministic —
//! declared top to bottom in [`detect_format`] — matching the design
//! note's "table of (magic predicate, parser) pairs" recommendation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    IsoBmff,
    Matroska,
    MpegTs,
    MpegPs,
    Flac,
    Wave,
    Ogg,
    MpegAudio,
    DvdIfo,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::IsoBmff => "ISO-BMFF",
            Format::Matroska => "Matroska",
            Format::MpegTs => "MPEG-TS",
            Format::MpegPs => "MPEG-PS",
            Format::Flac => "FLAC",
            Format::Wave => "Wave",
            Format::Ogg => "Ogg",
            Format::MpegAudio => "MPEG Audio",
            Format::DvdIfo => "DVD Video",
        }
    }
}

/// Detects a container format from its sniff buffer (the caller should
/// supply at least the first 8 KiB) and, for directory-style inputs
/// (DVD `VIDEO_TS`), the file name. Order is significant: more specific
/// magics (EBML, TS sync-with-stride) are checked before looser ones
/// (bare MPEG Audio sync) to avoid false positives.
pub fn detect_format(buf: &[u8], file_name: &str) -> Option<Format> {
    if is_iso_bmff(buf) {
        return Some(Format::IsoBmff);
    }
    if buf.len() >= 4 && buf[0..4] == [0x1A, 0x45, 0xDF, 0xA3] {
        return Some(Format::Matroska);
    }
    if is_mpeg_ts(buf) {
        return Some(Format::MpegTs);
    }
    if buf.len() >= 4 && buf[0..4] == [0x00, 0x00, 0x01, 0xBA] {
        return Some(Format::MpegPs);
    }
    if buf.len() >= 4 && &buf[0..4] == b"fLaC" {
        return Some(Format::Flac);
    }
    if buf.len() >= 12 && &buf[0..4] == b"RIFF" && &buf[8..12] == b"WAVE" {
        return Some(Format::Wave);
    }
    if buf.len() >= 4 && &buf[0..4] == b"OggS" {
        return Some(Format::Ogg);
    }
    if is_dvd_ifo(buf, file_name) {
        return Some(Format::DvdIfo);
    }
    if is_mpeg_audio(buf) {
        return Some(Format::MpegAudio);
    }
    None
}

fn is_iso_bmff(buf: &[u8]) -> bool {
    buf.len() >= 8 && &buf[4..8] == b"ftyp"
}

/// MPEG-TS packets are 188 bytes, optionally preceded by a 4-byte BDAV
/// timestamp (so the sync byte sits at offset 4, 192, 380, ...). Probe
/// both offset 0 and offset 4 for three consecutive `0x47` syncs.
fn is_mpeg_ts(buf: &[u8]) -> bool {
    has_ts_stride(buf, 0, 188) || has_ts_stride(buf, 4, 192)
}

fn has_ts_stride(buf: &[u8], start: usize, stride: usize) -> bool {
    let needed = start + stride * 3 + 1;
    if buf.len() < needed {
        return false;
    }
    (0..3).all(|i| buf[start + i * stride] == 0x47)
}

fn is_dvd_ifo(buf: &[u8], file_name: &str) -> bool {
    let has_magic = buf.len() >= 12
        && (&buf[0..12] == b"DVDVIDEO-VTS" || &buf[0..12] == b"DVDVIDEO-VMG");
    let name = file_name.to_ascii_uppercase();
    has_magic || ((name.ends_with(".IFO") || name.ends_with(".BUP")) && name.contains("VTS"))
        || ((name.ends_with(".IFO") || name.ends_with(".BUP")) && name.contains("VIDEO_TS"))
}

fn is_mpeg_audio(buf: &[u8]) -> bool {
    if buf.len() >= 3 && &buf[0..3] == b"ID3" {
        return true;
    }
    buf.windows(2)
        .any(|w| w[0] == 0xFF && (w[1] & 0xE0) == 0xE0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_iso_bmff_by_ftyp() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(b"ftypisom");
        assert_eq!(detect_format(&buf, "a.mp4"), Some(Format::IsoBmff));
    }

    #[test]
    fn detects_matroska_ebml() {
        let buf = [0x1A, 0x45, 0xDF, 0xA3, 0x00, 0x00];
        assert_eq!(detect_format(&buf, "a.mkv"), Some(Format::Matroska));
    }

    #[test]
    fn detects_ts_with_bdav_offset() {
        let mut buf = vec![0u8; 4];
        buf.push(0x47);
        buf.extend(vec![0u8; 187]);
        buf.push(0x47);
        buf.extend(vec![0u8; 187]);
        buf.push(0x47);
        assert_eq!(detect_format(&buf, "a.m2ts"), Some(Format::MpegTs));
    }

    #[test]
    fn detects_flac_and_wave() {
        assert_eq!(detect_format(b"fLaC....", "a.flac"), Some(Format::Flac));
        let mut buf = b"RIFF".to_vec();
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(b"WAVE");
        assert_eq!(detect_format(&buf, "a.wav"), Some(Format::Wave));
    }

    #[test]
    fn falls_back_to_mpeg_audio_sync() {
        let buf = [0xFFu8, 0xFB, 0x90, 0x00];
        assert_eq!(detect_format(&buf, "a.mp3"), Some(Format::MpegAudio));
    }
}
