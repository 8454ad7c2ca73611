//! AC-3 (Dolby Digital) bitstream header: sync, sample rate, bitrate,
//! channel layout with LFE insertion, and service kind (`bsmod`).

use mediainfo_bitstream::BitReader;

#[derive(Debug, Clone, PartialEq)]
pub struct Ac3Info {
    pub bitrate_kbps: i64,
    pub sample_rate: f64,
    pub channels: u64,
    pub layout: String,
    pub bsid: u8,
    pub bsmod: u8,
    pub service_kind: String,
    pub frame_rate: f64,
    pub samples_per_frame: u32,
}

/// Scans for sync `0x0B77` and decodes the fixed header fields needed for
/// the report. Returns `None` on sync-not-found or bitstream underflow.
pub fn parse_ac3_header(payload: &[u8]) -> Option<Ac3Info> {
    let idx = find_sync(payload)?;
    if idx + 7 > payload.len() {
        return None;
    }
    let mut br = BitReader::new(&payload[idx..]);
    let sync = br.read(16);
    if sync != 0x0B77 {
        return None;
    }
    br.skip(16); // crc1
    let fscod = br.read(2) as u8;
    let frmsizecod = br.read(6) as u8;
    let bsid = br.read(5) as u8;
    let bsmod = br.read(3) as u8;
    let acmod = br.read(3) as u8;

    if acmod == 0 {
        br.skip(2);
        br.skip(2);
    } else {
        if acmod & 1 != 0 {
            br.skip(2);
        }
        if acmod & 4 != 0 {
            br.skip(2);
        }
    }
    if acmod == 2 {
        br.skip(2);
    }
    let lfeon = br.read(1) == 1;
    if !br.ok() {
        return None;
    }

    let sample_rate = sample_rate_for(fscod);
    let bitrate_kbps = bitrate_kbps_for(frmsizecod);
    let (channels, layout) = channel_layout(acmod, lfeon)?;
    let samples_per_frame = 1536;
    let frame_rate = if sample_rate > 0.0 {
        sample_rate / samples_per_frame as f64
    } else {
        0.0
    };

    Some(Ac3Info {
        bitrate_kbps,
        sample_rate,
        channels,
        layout,
        bsid,
        bsmod,
        service_kind: service_kind(bsmod).to_string(),
        frame_rate,
        samples_per_frame,
    })
}

fn find_sync(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == [0x0B, 0x77])
}

fn sample_rate_for(fscod: u8) -> f64 {
    match fscod {
        0 => 48000.0,
        1 => 44100.0,
        2 => 32000.0,
        _ => 0.0,
    }
}

const BITRATES_KBPS: [i64; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

fn bitrate_kbps_for(frmsizecod: u8) -> i64 {
    if frmsizecod > 37 {
        return 0;
    }
    let idx = (frmsizecod >> 1) as usize;
    BITRATES_KBPS.get(idx).copied().unwrap_or(0)
}

/// Channel layout per `acmod`, with `LFE` spliced in immediately after `C`
/// (or appended when no center channel is present) when `lfeon` is set.
fn channel_layout(acmod: u8, lfeon: bool) -> Option<(u64, String)> {
    let base: &[&str] = match acmod {
        0 => &["L", "R"],
        1 => &["C"],
        2 => &["L", "R"],
        3 => &["L", "R", "C"],
        4 => &["L", "R", "S"],
        5 => &["L", "R", "C", "S"],
        6 => &["L", "R", "Ls", "Rs"],
        7 => &["L", "R", "C", "Ls", "Rs"],
        _ => return None,
    };
    let mut layout: Vec<&str> = base.to_vec();
    if lfeon {
        let mut with_lfe = Vec::with_capacity(layout.len() + 1);
        let mut inserted = false;
        for &ch in &layout {
            with_lfe.push(ch);
            if ch == "C" {
                with_lfe.push("LFE");
                inserted = true;
            }
        }
        if !inserted {
            with_lfe.push("LFE");
        }
        layout = with_lfe;
    }
    Some((layout.len() as u64, layout.join(" ")))
}

fn service_kind(bsmod: u8) -> &'static str {
    match bsmod {
        0 => "Complete Main",
        1 => "Music and Effects",
        2 => "Visually Impaired",
        3 => "Hearing Impaired",
        4 => "Dialogue",
        5 => "Commentary",
        6 => "Emergency",
        7 => "Voice Over",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_header(fscod: u8, frmsizecod: u8, acmod: u8, lfeon: bool) -> Vec<u8> {
        // sync(16) crc1(16) fscod(2) frmsizecod(6) bsid(5) bsmod(3) acmod(3)
        // [acmod-dependent mix bits] lfeon(1)
        let mut bits: Vec<u8> = Vec::new();
        let push = |bits: &mut Vec<u8>, value: u32, n: u32| {
            for i in (0..n).rev() {
                bits.push(((value >> i) & 1) as u8);
            }
        };
        push(&mut bits, 0x0B77, 16);
        push(&mut bits, 0, 16);
        push(&mut bits, fscod as u32, 2);
        push(&mut bits, frmsizecod as u32, 6);
        push(&mut bits, 8, 5); // bsid
        push(&mut bits, 0, 3); // bsmod
        push(&mut bits, acmod as u32, 3);
        if acmod == 0 {
            push(&mut bits, 0, 2);
            push(&mut bits, 0, 2);
        } else {
            if acmod & 1 != 0 {
                push(&mut bits, 0, 2);
            }
            if acmod & 4 != 0 {
                push(&mut bits, 0, 2);
            }
        }
        if acmod == 2 {
            push(&mut bits, 0, 2);
        }
        push(&mut bits, lfeon as u32, 1);
        while bits.len() % 8 != 0 {
            bits.push(0);
        }
        let mut bytes = Vec::with_capacity(bits.len() / 8);
        for chunk in bits.chunks(8) {
            let mut byte = 0u8;
            for &b in chunk {
                byte = (byte << 1) | b;
            }
            bytes.push(byte);
        }
        bytes
    }

    #[test]
    fn acmod7_lfeon1_matches_boundary_scenario() {
        // fscod=0, frmsizecod=30, acmod=7, lfeon=1
        let data = build_header(0, 30, 7, true);
        let info = parse_ac3_header(&data).unwrap();
        assert_eq!(info.sample_rate, 48000.0);
        assert_eq!(info.bitrate_kbps, 448);
        assert_eq!(info.channels, 6);
        assert_eq!(info.layout, "L R C LFE Ls Rs");
    }

    #[test]
    fn stereo_no_lfe() {
        let data = build_header(0, 0, 2, false);
        let info = parse_ac3_header(&data).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.layout, "L R");
    }

    #[test]
    fn no_sync_returns_none() {
        assert!(parse_ac3_header(&[0u8; 16]).is_none());
    }
}
