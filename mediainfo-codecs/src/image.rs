//! JPEG (SOF marker scan) and PNG (signature + IHDR) still-image parsing,
//! used by the image container entries embedded alongside audio/video
//! streams (cover art, DVD menu thumbnails).

#[derive(Debug, Clone, PartialEq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_space: &'static str,
    pub chroma_subsampling: Option<&'static str>,
}

/// Start-of-frame markers excluding DHT (C4), JPG extension (C8) and DAC
/// (CC), matching libjpeg's own `SOFn` enumeration.
fn is_sof_marker(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC
}

pub fn parse_jpeg(data: &[u8]) -> Option<JpegInfo> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut pos = 2usize;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if is_sof_marker(marker) {
            let seg = data.get(pos + 4..pos + 2 + seg_len)?;
            return parse_sof_segment(seg);
        }
        if marker == 0xDA {
            break;
        }
        pos += 2 + seg_len;
    }
    None
}

fn parse_sof_segment(seg: &[u8]) -> Option<JpegInfo> {
    if seg.len() < 6 {
        return None;
    }
    let bit_depth = seg[0];
    let height = u16::from_be_bytes([seg[1], seg[2]]) as u32;
    let width = u16::from_be_bytes([seg[3], seg[4]]) as u32;
    let num_components = seg[5] as usize;
    let mut h_max = 0u8;
    let mut v_max = 0u8;
    let mut luma_sampling = None;
    for i in 0..num_components {
        let base = 6 + i * 3;
        if base + 2 >= seg.len() {
            break;
        }
        let sampling = seg[base + 1];
        let h = (sampling >> 4) & 0x0F;
        let v = sampling & 0x0F;
        if i == 0 {
            luma_sampling = Some((h, v));
        }
        h_max = h_max.max(h);
        v_max = v_max.max(v);
    }
    let chroma_subsampling = luma_sampling.and_then(|(h, v)| {
        if num_components < 3 {
            None
        } else if h == h_max && v == v_max {
            Some("4:4:4")
        } else if h == h_max && v == h_max / 2.max(1) && v * 2 == v_max {
            Some("4:2:2")
        } else if h * 2 == h_max && v * 2 == v_max {
            Some("4:2:0")
        } else if h * 2 == h_max && v == v_max {
            Some("4:2:2")
        } else {
            None
        }
    });
    Some(JpegInfo {
        width,
        height,
        bit_depth,
        color_space: if num_components == 1 { "Y" } else { "YUV" },
        chroma_subsampling,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_space: &'static str,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Reads width/height/bit-depth/color-type straight out of the `IHDR` chunk,
/// which PNG guarantees is the first chunk after the signature.
pub fn parse_png(data: &[u8]) -> Option<PngInfo> {
    if data.len() < 8 + 8 + 13 || data[0..8] != PNG_SIGNATURE {
        return None;
    }
    let chunk_type = &data[12..16];
    if chunk_type != b"IHDR" {
        return None;
    }
    let ihdr = &data[16..16 + 13];
    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    let bit_depth = ihdr[8];
    let color_type = ihdr[9];
    let color_space = match color_type {
        0 | 4 => "Y",
        2 | 3 | 6 => "RGB",
        _ => return None,
    };
    Some(PngInfo {
        width,
        height,
        bit_depth,
        color_space,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_with_sof(components: &[(u8, u8)]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        let seg_len = 8 + components.len() * 3;
        data.push(0xFF);
        data.push(0xC0);
        data.extend_from_slice(&(seg_len as u16).to_be_bytes());
        data.push(8); // bit depth
        data.extend_from_slice(&100u16.to_be_bytes()); // height
        data.extend_from_slice(&200u16.to_be_bytes()); // width
        data.push(components.len() as u8);
        for (i, (h, v)) in components.iter().enumerate() {
            data.push(i as u8 + 1);
            data.push((h << 4) | v);
            data.push(0);
        }
        data
    }

    #[test]
    fn jpeg_420_subsampling() {
        let data = jpeg_with_sof(&[(2, 2), (1, 1), (1, 1)]);
        let info = parse_jpeg(&data).unwrap();
        assert_eq!(info.width, 200);
        assert_eq!(info.height, 100);
        assert_eq!(info.chroma_subsampling, Some("4:2:0"));
    }

    #[test]
    fn jpeg_444_subsampling() {
        let data = jpeg_with_sof(&[(1, 1), (1, 1), (1, 1)]);
        let info = parse_jpeg(&data).unwrap();
        assert_eq!(info.chroma_subsampling, Some("4:4:4"));
    }

    #[test]
    fn png_ihdr_rgb() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&640u32.to_be_bytes());
        data.extend_from_slice(&480u32.to_be_bytes());
        data.push(8); // bit depth
        data.push(2); // color type: truecolor
        data.extend_from_slice(&[0, 0, 0]); // compression/filter/interlace
        let info = parse_png(&data).unwrap();
        assert_eq!(info.width, 640);
        assert_eq!(info.height, 480);
        assert_eq!(info.color_space, "RGB");
    }

    #[test]
    fn png_rejects_bad_signature() {
        assert!(parse_png(&[0; 30]).is_none());
    }
}
