//! Opus/Vorbis identification-packet parsing and OpusTags/Vorbis comment
//! extraction, used by both the Ogg container and MP4 `Opus`/`vorbis`
//! sample entries.

#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationInfo {
    pub codec: &'static str,
    pub channels: u8,
    pub sample_rate: u32,
}

/// Recognizes `"OpusHead"` or `0x01 "vorbis"` identification packets.
pub fn parse_identification(data: &[u8]) -> Option<IdentificationInfo> {
    if data.len() >= 19 && &data[0..8] == b"OpusHead" {
        let channels = data[9];
        // Opus is always reported at a 48 kHz canonical rate regardless of
        // the input sample rate field, matching MediaInfoLib's convention.
        return Some(IdentificationInfo {
            codec: "Opus",
            channels,
            sample_rate: 48000,
        });
    }
    if data.len() >= 30 && data[0] == 0x01 && &data[1..7] == b"vorbis" {
        let channels = data[11];
        let sample_rate = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);
        return Some(IdentificationInfo {
            codec: "Vorbis",
            channels,
            sample_rate,
        });
    }
    None
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentInfo {
    pub vendor: String,
    pub encoder: Option<String>,
}

/// Parses an OpusTags / Vorbis comment-header packet: a 4-byte
/// little-endian vendor-string length, the vendor string itself, a 4-byte
/// comment count, then `(length, text)` pairs. Extracts the vendor string
/// (-> `Encoded_Library`) and an `ENCODER=` comment (-> `Writing_Application`).
pub fn parse_comments(data: &[u8]) -> Option<CommentInfo> {
    let mut offset = 0usize;
    let data = if data.starts_with(b"OpusTags") {
        offset = 8;
        data
    } else if data.len() > 7 && data[0] == 0x03 && &data[1..7] == b"vorbis" {
        offset = 7;
        data
    } else {
        data
    };
    if data.len() < offset + 4 {
        return None;
    }
    let vendor_len = u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]) as usize;
    offset += 4;
    if data.len() < offset + vendor_len {
        return None;
    }
    let vendor = String::from_utf8_lossy(&data[offset..offset + vendor_len]).to_string();
    offset += vendor_len;

    if data.len() < offset + 4 {
        return Some(CommentInfo { vendor, encoder: None });
    }
    let count = u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]);
    offset += 4;

    let mut encoder = None;
    for _ in 0..count {
        if data.len() < offset + 4 {
            break;
        }
        let len = u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;
        offset += 4;
        if data.len() < offset + len {
            break;
        }
        let comment = String::from_utf8_lossy(&data[offset..offset + len]);
        if let Some(value) = comment.strip_prefix("ENCODER=") {
            encoder = Some(value.to_string());
        }
        offset += len;
    }

    Some(CommentInfo { vendor, encoder })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opus_head_reports_canonical_48k() {
        let mut data = b"OpusHead".to_vec();
        data.push(1); // version
        data.push(2); // channels
        data.extend_from_slice(&[0u8; 9]); // pre-skip/sample-rate/gain/mapping
        let info = parse_identification(&data).unwrap();
        assert_eq!(info.codec, "Opus");
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 48000);
    }

    #[test]
    fn opus_tags_vendor_and_encoder() {
        let mut data = b"OpusTags".to_vec();
        let vendor = b"libopus 1.3";
        data.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        data.extend_from_slice(vendor);
        data.extend_from_slice(&1u32.to_le_bytes());
        let comment = b"ENCODER=opusenc";
        data.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        data.extend_from_slice(comment);
        let info = parse_comments(&data).unwrap();
        assert_eq!(info.vendor, "libopus 1.3");
        assert_eq!(info.encoder.as_deref(), Some("opusenc"));
    }
}
