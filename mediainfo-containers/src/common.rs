//! Shared utility layer every container parser draws on: the per-format
//! scan caps from §5 of the specification this crate implements, a PTS
//! tracker with cumulative/segmented policy, frame-rate estimation from a
//! sample count and duration, and the `ContainerOutput` shape every
//! `*::parse` entry point returns.

use std::io::{self, Read};

use mediainfo_report::{ContainerInfo, Field, Stream};

/// Matroska: read up to 4 MiB from the file head.
pub const MATROSKA_HEAD_CAP: usize = 4 * 1024 * 1024;
/// ISO-BMFF: `moov` box is capped at 16 MiB.
pub const MOOV_CAP: usize = 16 * 1024 * 1024;
/// Ogg: tail-scan window expands up to 4 MiB looking for the last page.
pub const OGG_TAIL_CAP: usize = 4 * 1024 * 1024;
/// MPEG-PS: 1 MiB sliding window carried between reads.
pub const MPEG_PS_WINDOW_CAP: usize = 1024 * 1024;
/// MPEG Audio: scan up to 64 KiB for the first valid frame header.
pub const MP3_SYNC_SCAN_CAP: usize = 64 * 1024;

pub const PTS_MODULUS: u64 = 1u64 << 33;
pub const PTS_CLOCK_HZ: f64 = 90_000.0;

/// The `(ContainerInfo, streams, general_fields)` triple every container
/// parser produces, plus the `ok` flag spec.md §7 uses to signal "format
/// mismatch, fall through to the next candidate" without an exception.
#[derive(Debug, Default)]
pub struct ContainerOutput {
    pub info: ContainerInfo,
    pub streams: Vec<Stream>,
    pub general_fields: Vec<Field>,
    pub ok: bool,
}

impl ContainerOutput {
    pub fn mismatch() -> Self {
        ContainerOutput::default()
    }
}

/// Reads at most `cap` bytes from `reader`, matching the per-container
/// scan-cap discipline (stop early at EOF, never allocate past `cap`).
pub fn read_capped<R: Read>(reader: &mut R, cap: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; cap];
    let mut total = 0usize;
    loop {
        if total == buf.len() {
            break;
        }
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    buf.truncate(total);
    Ok(buf)
}

/// Tracking policy selected per spec.md's "PTS trackers" design note:
/// `Cumulative` absorbs mod-2^33 wraparound (MPEG-PS style single-program
/// streams); `Segmented` resets the active window whenever a jump exceeds
/// `reset_threshold_ticks` (live-capture TS) while still accumulating a
/// `duration_total` across segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtsPolicy {
    Cumulative,
    Segmented { reset_threshold_ticks: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct PtsTracker {
    policy: PtsPolicy,
    first: Option<u64>,
    last: Option<u64>,
    duration_total_ticks: u64,
    has_resets: bool,
}

impl PtsTracker {
    pub fn new(policy: PtsPolicy) -> Self {
        PtsTracker {
            policy,
            first: None,
            last: None,
            duration_total_ticks: 0,
            has_resets: false,
        }
    }

    /// Records one observed PTS value (90 kHz ticks, already masked to 33
    /// bits by the caller).
    pub fn observe(&mut self, pts: u64) {
        let pts = pts & (PTS_MODULUS - 1);
        match self.policy {
            PtsPolicy::Cumulative => {
                if self.first.is_none() {
                    self.first = Some(pts);
                }
                self.last = Some(pts);
            }
            PtsPolicy::Segmented { reset_threshold_ticks } => {
                if let Some(last) = self.last {
                    let delta = delta_with_wrap(last, pts);
                    if delta > reset_threshold_ticks {
                        self.duration_total_ticks += self.segment_ticks();
                        self.has_resets = true;
                        self.first = Some(pts);
                        self.last = Some(pts);
                        return;
                    }
                }
                if self.first.is_none() {
                    self.first = Some(pts);
                }
                self.last = Some(pts);
            }
        }
    }

    fn segment_ticks(&self) -> u64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) => delta_with_wrap(first, last),
            _ => 0,
        }
    }

    /// Duration of the current (or only, for `Cumulative`) active segment,
    /// in seconds: `(last - first) / 90000`, or `(last + 2^33 - first) /
    /// 90000` when `last < first` (wraparound).
    pub fn duration_seconds(&self) -> f64 {
        self.segment_ticks() as f64 / PTS_CLOCK_HZ
    }

    /// Cross-segment total for `Segmented` trackers: the sum of every
    /// completed segment's duration plus the still-open segment. Equal to
    /// `duration_seconds()` for `Cumulative` trackers, which never reset.
    pub fn duration_total_seconds(&self) -> f64 {
        (self.duration_total_ticks + self.segment_ticks()) as f64 / PTS_CLOCK_HZ
    }

    pub fn has_resets(&self) -> bool {
        self.has_resets
    }

    pub fn first(&self) -> Option<u64> {
        self.first
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

fn delta_with_wrap(first: u64, last: u64) -> u64 {
    if last >= first {
        last - first
    } else {
        last + PTS_MODULUS - first
    }
}

/// Estimates frame rate from a sample (frame) count and a duration in
/// seconds, returning `0.0` when either input is non-positive.
pub fn estimate_frame_rate(sample_count: u64, duration_seconds: f64) -> f64 {
    if sample_count == 0 || duration_seconds <= 0.0 {
        return 0.0;
    }
    sample_count as f64 / duration_seconds
}

/// Canonicalizes a raw handler/track-kind string (as seen in ISO-BMFF
/// `hdlr` four-char-codes, Matroska `TrackType` numbers mapped to a name,
/// etc.) to the lowercase token the analyzer dispatches stream kind on.
pub fn canonicalize_kind_token(raw: &str) -> &'static str {
    match raw {
        "vide" | "video" | "1" => "video",
        "soun" | "audio" | "2" => "audio",
        "text" | "sbtl" | "subt" | "subtitle" | "17" => "text",
        "hint" => "hint",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_tracker_handles_wrap() {
        let mut t = PtsTracker::new(PtsPolicy::Cumulative);
        t.observe(PTS_MODULUS - 1000);
        t.observe(500);
        assert_eq!(t.first(), Some(PTS_MODULUS - 1000));
        assert_eq!(t.last(), Some(500));
        let expected = (1500) as f64 / PTS_CLOCK_HZ;
        assert!((t.duration_seconds() - expected).abs() < 1e-9);
    }

    #[test]
    fn segmented_tracker_resets_on_large_jump() {
        let mut t = PtsTracker::new(PtsPolicy::Segmented {
            reset_threshold_ticks: 90_000 * 5,
        });
        t.observe(0);
        t.observe(90_000); // 1s later, within threshold
        t.observe(90_000 * 100); // huge jump -> reset
        assert!(t.has_resets());
        assert!(t.duration_total_seconds() > 0.0);
    }

    #[test]
    fn frame_rate_estimation() {
        assert_eq!(estimate_frame_rate(0, 10.0), 0.0);
        assert!((estimate_frame_rate(250, 10.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn kind_token_canonicalization() {
        assert_eq!(canonicalize_kind_token("vide"), "video");
        assert_eq!(canonicalize_kind_token("2"), "audio");
        assert_eq!(canonicalize_kind_token("weird"), "unknown");
    }
}
