//! Text renderings shared by the classifier rules.

use diagram_engine::{fence_block, strip_code_fence, DIAGRAM_FENCE_TAG};
use serde_json::{Map, Value};

pub(crate) const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Non-null field of an object payload.
pub(crate) fn field<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.as_object()
        .and_then(|object| object.get(key))
        .filter(|value| !value.is_null())
}

pub(crate) fn field_str<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    field(data, key).and_then(Value::as_str)
}

/// First of `keys` present with a non-null value, with the key that matched.
pub(crate) fn first_field<'a>(data: &'a Value, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|key| field(data, key).map(|value| (*key, value)))
}

pub(crate) fn first_str<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| field_str(data, key))
}

/// Strings verbatim, anything else as pretty JSON.
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => pretty_json(other),
    }
}

pub(crate) fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Terminate a block rendering with a blank line.
pub(crate) fn block(mut text: String) -> String {
    while text.ends_with('\n') {
        text.pop();
    }
    text.push_str("\n\n");
    text
}

pub(crate) fn image_markdown(source: &str) -> String {
    let source = source.trim();
    let source = if looks_like_url(source) {
        source.to_string()
    } else {
        format!("{DATA_URI_PREFIX}{source}")
    };
    block(format!("![Generated image]({source})"))
}

fn looks_like_url(source: &str) -> bool {
    ["http://", "https://", "data:", "/", "./", "file:"]
        .iter()
        .any(|prefix| source.starts_with(prefix))
}

pub(crate) fn download_link(url: &str) -> String {
    block(format!("[Download presentation]({})", url.trim()))
}

pub(crate) fn diagram_fence(source: &Value) -> String {
    block(fence_block(DIAGRAM_FENCE_TAG, &strip_code_fence(&text_of(source))))
}

pub(crate) fn json_dump(value: &Value) -> String {
    block(fence_block("json", &pretty_json(value)))
}

/// `- [ ]` / `- [x]` list; items are strings or task objects.
pub(crate) fn checklist(tasks: &[Value]) -> String {
    let lines: Vec<String> = tasks.iter().map(checklist_line).collect();
    block(lines.join("\n"))
}

fn checklist_line(task: &Value) -> String {
    match task {
        Value::String(title) => format!("- [ ] {}", title.trim()),
        Value::Object(object) => {
            let title = ["title", "task", "description", "name"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(object.clone()).to_string());
            let done = is_done(object);
            format!("- [{}] {}", if done { "x" } else { " " }, title.trim())
        }
        other => format!("- [ ] {other}"),
    }
}

fn is_done(object: &Map<String, Value>) -> bool {
    ["completed", "done"]
        .iter()
        .any(|key| object.get(*key).and_then(Value::as_bool).unwrap_or(false))
        || object
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case("completed") || status.eq_ignore_ascii_case("done"))
}

/// Body followed by a bulleted "Sources" section.
pub(crate) fn with_sources(body: String, sources: &[Value]) -> String {
    let bullets: Vec<String> = sources.iter().filter_map(source_bullet).collect();
    if bullets.is_empty() {
        return body;
    }
    format!("{}\n\n**Sources**\n{}\n", body.trim_end(), bullets.join("\n"))
}

fn source_bullet(source: &Value) -> Option<String> {
    match source {
        Value::String(text) if !text.trim().is_empty() => Some(format!("- {}", text.trim())),
        Value::Object(_) => {
            let url = first_str(source, &["url", "link", "href"]);
            let title = first_str(source, &["title", "name"]);
            match (title, url) {
                (Some(title), Some(url)) => Some(format!("- [{title}]({url})")),
                (None, Some(url)) => Some(format!("- {url}")),
                (Some(title), None) => Some(format!("- {title}")),
                (None, None) => Some(format!("- {source}")),
            }
        }
        Value::Null => None,
        other => Some(format!("- {other}")),
    }
}

/// Confirmation for a calendar event the agent staged.
pub(crate) fn event_confirmation(message: &Value, preview: &Value) -> String {
    let mut out = text_of(message).trim_end().to_string();
    out.push('\n');

    let title = first_str(preview, &["title", "summary", "name"]).unwrap_or("Untitled event");
    out.push_str(&format!("\n> **{title}**"));

    let start = first_str(preview, &["start", "start_time", "starts_at"]);
    let end = first_str(preview, &["end", "end_time", "ends_at"]);
    match (start, end) {
        (Some(start), Some(end)) => out.push_str(&format!("\n> {start} – {end}")),
        (Some(start), None) => out.push_str(&format!("\n> {start}")),
        (None, Some(end)) => out.push_str(&format!("\n> until {end}")),
        (None, None) => {}
    }

    if let Some(location) = first_str(preview, &["location", "place"]) {
        out.push_str(&format!("\n> {location}"));
    }
    block(out)
}

/// Comma-separated recipients from a string or an array of strings.
pub(crate) fn recipients(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => text_of(other).trim().to_string(),
    }
}
