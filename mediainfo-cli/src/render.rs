use std::io::Cursor;

use mediainfo_report::{Report, Stream, StreamKind};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Map, Value};

fn kind_label(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::General => "General",
        StreamKind::Video => "Video",
        StreamKind::Audio => "Audio",
        StreamKind::Text => "Text",
        StreamKind::Image => "Image",
        StreamKind::Menu => "Menu",
    }
}

fn streams_in_order(report: &Report) -> Vec<&Stream> {
    std::iter::once(&report.general)
        .chain(report.streams.iter())
        .collect()
}

/// Human-readable rendering: one block per stream, field names padded to
/// column 36 as a fixed-width name/value column per MediaInfo's own text
/// output convention.
pub fn render_text(reports: &[Report]) -> String {
    let mut out = String::new();
    for stream_list in reports.iter().map(streams_in_order) {
        for stream in stream_list {
            out.push_str(kind_label(stream.kind()));
            out.push('\n');
            for field in &stream.fields {
                let name_col = format!("{} ", field.name);
                if name_col.len() < 36 {
                    out.push_str(&name_col);
                    out.push_str(&" ".repeat(36 - name_col.len()));
                } else {
                    out.push_str(&name_col);
                }
                out.push_str(": ");
                out.push_str(&field.value);
                out.push('\n');
            }
            out.push('\n');
        }
    }
    out
}

fn stream_to_json(stream: &Stream) -> Value {
    let mut map = Map::new();
    map.insert("@type".to_string(), json!(kind_label(stream.kind())));
    for field in &stream.fields {
        map.insert(field.name.clone(), json!(field.value));
    }
    for (key, value) in &stream.json {
        map.entry(key.clone()).or_insert_with(|| json!(value));
    }
    for (key, value) in &stream.json_raw {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(map)
}

pub fn render_json(reports: &[Report]) -> String {
    let media = reports
        .iter()
        .map(|report| {
            let tracks: Vec<Value> = streams_in_order(report)
                .into_iter()
                .map(stream_to_json)
                .collect();
            json!({
                "@ref": report.path,
                "track": tracks,
            })
        })
        .collect::<Vec<_>>();
    let root = json!({ "media": media });
    serde_json::to_string_pretty(&root).unwrap_or_default() + "\n"
}

fn xml_tag_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.chars().next().unwrap().is_ascii_digit() {
        out.insert(0, '_');
    }
    out
}

pub fn render_xml(reports: &[Report]) -> String {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
        .write_event(Event::Start(BytesStart::new("MediaInfo")))
        .ok();
    for report in reports {
        let mut media = BytesStart::new("media");
        media.push_attribute(("ref", report.path.as_str()));
        writer.write_event(Event::Start(media)).ok();
        for stream in streams_in_order(report) {
            let mut track = BytesStart::new("track");
            track.push_attribute(("type", kind_label(stream.kind())));
            writer.write_event(Event::Start(track)).ok();
            for field in &stream.fields {
                let tag = xml_tag_name(&field.name);
                writer
                    .write_event(Event::Start(BytesStart::new(tag.clone())))
                    .ok();
                writer
                    .write_event(Event::Text(BytesText::new(&field.value)))
                    .ok();
                writer.write_event(Event::End(BytesEnd::new(tag))).ok();
            }
            writer.write_event(Event::End(BytesEnd::new("track"))).ok();
        }
        writer.write_event(Event::End(BytesEnd::new("media"))).ok();
    }
    writer
        .write_event(Event::End(BytesEnd::new("MediaInfo")))
        .ok();
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).unwrap_or_default() + "\n"
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn render_html(reports: &[Report]) -> String {
    let body = html_escape(&render_text(reports));
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>MediaInfo</title></head>\n<body><pre>\n{body}</pre></body></html>\n"
    )
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn render_csv(reports: &[Report]) -> String {
    let mut out = String::from("Source,Kind,Fields\n");
    for report in reports {
        for stream in streams_in_order(report) {
            let fields = stream
                .fields
                .iter()
                .map(|f| format!("{}={}", f.name, f.value))
                .collect::<Vec<_>>()
                .join(";");
            out.push_str(&csv_escape(&report.path));
            out.push(',');
            out.push_str(kind_label(stream.kind()));
            out.push(',');
            out.push_str(&csv_escape(&fields));
            out.push('\n');
        }
    }
    out
}
