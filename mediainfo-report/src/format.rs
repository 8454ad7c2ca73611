use crate::model::BitrateMode;

/// `B` up to 1024; above, `KiB/MiB/GiB/TiB/PiB` with a 2/1/0-decimal tier
/// depending on magnitude (>=100 -> 0 decimals, >=10 -> 1, else 2).
pub fn format_bytes(size: i64) -> String {
    const UNIT: f64 = 1024.0;
    if size < 1024 {
        return format!("{} Bytes", size);
    }
    let units = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut div = size as f64;
    let mut exp = 0usize;
    while div >= UNIT && exp < units.len() {
        div /= UNIT;
        exp += 1;
    }
    if exp == 0 {
        return format!("{:.2} {}", div, units[0]);
    }
    format!("{} {}", format_byte_value(div), units[exp - 1])
}

fn format_byte_value(value: f64) -> String {
    if value >= 100.0 {
        format!("{:.0}", value)
    } else if value >= 10.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// `<ms> ms` under 1 s; `<s> s <ms> ms` under 60 s (with the 59.5s -> 60s
/// rounding special case); `<min> min <s> s`; `<h> h <min> min <s> s`.
pub fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return String::new();
    }
    let total_ms = (seconds * 1000.0).round() as i64;
    if total_ms < 1000 {
        return format!("{} ms", total_ms);
    }
    let mut total_sec = total_ms / 1000;
    let mut rem_ms = total_ms % 1000;
    if total_sec == 59 && rem_ms >= 500 {
        total_sec = 60;
        rem_ms = 0;
    }
    if total_sec < 60 {
        return format!("{} s {} ms", total_sec, rem_ms);
    }
    let hours = total_sec / 3600;
    let minutes = (total_sec % 3600) / 60;
    let secs = total_sec % 60;
    if hours > 0 {
        format!("{} h {} min {} s", hours, minutes, secs)
    } else {
        format!("{} min {} s", minutes, secs)
    }
}

/// `<int> b/s` under 1 kb/s; `<float> kb/s` under 100 kb/s; space-grouped
/// thousands-separated int `kb/s` otherwise; `<x.y> Mb/s` at or above 10 Mb/s.
pub fn format_bitrate(bits_per_second: f64) -> String {
    if bits_per_second <= 0.0 {
        return String::new();
    }
    if bits_per_second >= 10_000_000.0 {
        return format!("{:.1} Mb/s", bits_per_second / 1_000_000.0);
    }
    if bits_per_second < 1000.0 {
        return format!("{} b/s", bits_per_second.round() as i64);
    }
    if bits_per_second < 100_000.0 {
        return format!("{:.1} kb/s", bits_per_second / 1000.0);
    }
    let kbps = (bits_per_second / 1000.0).round() as i64;
    format!("{} kb/s", format_thousands(kbps))
}

pub fn format_bitrate_kbps(kbps: i64) -> String {
    if kbps <= 0 {
        return String::new();
    }
    format!("{} kb/s", format_thousands(kbps))
}

fn format_thousands(value: i64) -> String {
    if value < 1000 {
        return value.to_string();
    }
    let mut groups = Vec::new();
    let mut v = value;
    while v > 0 {
        let chunk = v % 1000;
        v /= 1000;
        if v > 0 {
            groups.push(format!("{:03}", chunk));
        } else {
            groups.push(chunk.to_string());
        }
    }
    groups.reverse();
    groups.join(" ")
}

pub fn format_frame_rate(rate: f64) -> String {
    if rate <= 0.0 {
        return String::new();
    }
    format!("{:.3} FPS", rate)
}

pub fn format_frame_rate_ratio(numer: u32, denom: u32) -> String {
    if numer == 0 || denom == 0 {
        return String::new();
    }
    let rate = numer as f64 / denom as f64;
    format!("{:.3} ({}/{}) FPS", rate, numer, denom)
}

/// `x.x kHz` at or above 1 kHz, else `Hz`.
pub fn format_sample_rate(rate: f64) -> String {
    if rate <= 0.0 {
        return String::new();
    }
    if rate >= 1000.0 {
        format!("{:.1} kHz", rate / 1000.0)
    } else {
        format!("{:.0} Hz", rate)
    }
}

pub fn format_channels(value: u64) -> String {
    if value == 0 {
        String::new()
    } else if value == 1 {
        "1 channel".to_string()
    } else {
        format!("{} channels", value)
    }
}

pub fn format_aspect_ratio(width: u64, height: u64) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }
    let g = gcd(width, height);
    format!("{}:{}", width / g, height / g)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

pub fn format_bits_per_pixel_frame(bitrate: f64, width: u64, height: u64, fps: f64) -> String {
    if bitrate <= 0.0 || width == 0 || height == 0 || fps <= 0.0 {
        return String::new();
    }
    let value = bitrate / (width as f64 * height as f64 * fps);
    format!("{:.3}", value)
}

pub fn format_stream_size(bytes: i64, total: i64) -> String {
    if bytes <= 0 || total <= 0 {
        return String::new();
    }
    let percent = ((bytes as f64 * 100.0) / total as f64).round() as i64;
    format!("{} ({}%)", format_bytes(bytes), percent)
}

/// The reference implementation stores an explicit `BitrateMode` per
/// container where the format declares it (e.g. MP3 Xing/Info tag, DTS
/// extension sync) and only falls back to inference from "ratio sharpness"
/// when the container is silent. The public corpus that ships with this
/// repository does not retain that inference helper, so this port documents
/// its own policy (see DESIGN.md): a bitrate within 0.5% of its nearest
/// round kbps value is treated as `Constant`, anything else `Variable`.
pub fn infer_bitrate_mode(bits_per_second: f64) -> Option<BitrateMode> {
    if bits_per_second <= 0.0 {
        return None;
    }
    let kbps = bits_per_second / 1000.0;
    let nearest = kbps.round();
    if nearest <= 0.0 {
        return None;
    }
    let drift = (kbps - nearest).abs() / nearest;
    Some(if drift < 0.005 {
        BitrateMode::Constant
    } else {
        BitrateMode::Variable
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_size_tiers() {
        assert_eq!(format_bytes(500), "500 Bytes");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(20 * 1024), "20.0 KiB");
        assert_eq!(format_bytes(200 * 1024), "200 KiB");
    }

    #[test]
    fn duration_tiers_and_rounding() {
        assert_eq!(format_duration(0.5), "500 ms");
        assert_eq!(format_duration(10.0), "10 s 0 ms");
        assert_eq!(format_duration(59.5), "1 min 0 s");
        assert_eq!(format_duration(65.0), "1 min 5 s");
        assert_eq!(format_duration(3725.0), "1 h 2 min 5 s");
    }

    #[test]
    fn bitrate_thousands_grouping() {
        assert_eq!(format_bitrate(9_515_000.0), "9 515 kb/s");
        assert_eq!(format_bitrate(500.0), "500 b/s");
        assert_eq!(format_bitrate(96_000.0), "96.0 kb/s");
        assert_eq!(format_bitrate(12_000_000.0), "12.0 Mb/s");
    }

    #[test]
    fn frame_rate_formats() {
        assert_eq!(format_frame_rate(23.976), "23.976 FPS");
        assert_eq!(format_frame_rate_ratio(24000, 1001), "23.976 (24000/1001) FPS");
    }

    #[test]
    fn channels_and_sample_rate() {
        assert_eq!(format_channels(1), "1 channel");
        assert_eq!(format_channels(6), "6 channels");
        assert_eq!(format_sample_rate(48000.0), "48.0 kHz");
        assert_eq!(format_sample_rate(800.0), "800 Hz");
    }
}
