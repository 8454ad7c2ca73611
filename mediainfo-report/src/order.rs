use crate::model::{Stream, StreamKind};

const GENERAL_FIELD_ORDER: &[&str] = &[
    "Complete name",
    "Format",
    "File size",
    "Duration",
    "Overall bit rate mode",
    "Overall bit rate",
    "Frame rate",
];

/// Shared across Video/Audio/Text/Image/Menu, matching the reference
/// implementation's single `streamFieldOrder` table. Fields absent from
/// this table keep their relative insertion order (stable sort).
const STREAM_FIELD_ORDER: &[&str] = &[
    "ID",
    "Format",
    "Format profile",
    "Codec ID",
    "Duration",
    "Bit rate mode",
    "Bit rate",
    "Width",
    "Height",
    "Display aspect ratio",
    "Frame rate mode",
    "Frame rate",
    "Color space",
    "Chroma subsampling",
    "Bit depth",
    "Scan type",
    "Channel(s)",
    "Channel layout",
    "Sampling rate",
    "Bit depth",
    "Compression mode",
    "Language",
    "Stream size",
    "Bits/(Pixel*Frame)",
];

fn rank_of(name: &str, kind: StreamKind) -> Option<usize> {
    let table = match kind {
        StreamKind::General => GENERAL_FIELD_ORDER,
        _ => STREAM_FIELD_ORDER,
    };
    table.iter().position(|&n| n == name)
}

/// Stable-sorts `fields` by the per-kind rank table; fields absent from the
/// table sort after every ranked field, in original relative order.
pub fn sort_fields(kind: StreamKind, fields: &mut [crate::model::Field]) {
    fields.sort_by_key(|f| rank_of(&f.name, kind).unwrap_or(usize::MAX));
}

/// Stable-sorts streams by `StreamKind::rank`, preserving first-appearance
/// order within a kind.
pub fn sort_streams(streams: &mut Vec<Stream>) {
    streams.sort_by_key(|s| s.kind().rank());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    #[test]
    fn general_fields_follow_declared_order() {
        let mut fields = vec![
            Field::new("Format", "MPEG-4"),
            Field::new("Complete name", "/a/b.mp4"),
            Field::new("File size", "1 KiB"),
        ];
        sort_fields(StreamKind::General, &mut fields);
        assert_eq!(fields[0].name, "Complete name");
        assert_eq!(fields[1].name, "Format");
        assert_eq!(fields[2].name, "File size");
    }

    #[test]
    fn unranked_fields_keep_relative_order() {
        let mut fields = vec![
            Field::new("Custom B", "1"),
            Field::new("ID", "1"),
            Field::new("Custom A", "2"),
        ];
        sort_fields(StreamKind::Video, &mut fields);
        assert_eq!(fields[0].name, "ID");
        assert_eq!(fields[1].name, "Custom B");
        assert_eq!(fields[2].name, "Custom A");
    }

    #[test]
    fn streams_sort_by_kind_rank_stable() {
        let mut streams = vec![
            Stream::new(StreamKind::Audio),
            Stream::new(StreamKind::General),
            Stream::new(StreamKind::Video),
            Stream::new(StreamKind::Audio),
        ];
        sort_streams(&mut streams);
        let kinds: Vec<_> = streams.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StreamKind::General,
                StreamKind::Video,
                StreamKind::Audio,
                StreamKind::Audio
            ]
        );
    }
}
