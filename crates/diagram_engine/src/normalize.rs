use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::fence::strip_code_fence;

/// Node id followed by one of the four label bracket styles:
/// `[...]`, `(...)`, `{...}` and the asymmetric `>...]`.
static NODE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?P<id>[A-Za-z0-9_]+)(?:\[(?P<square>[^\[\]\n]*)\]|\((?P<round>[^()\n]*)\)|\{(?P<curly>[^{}\n]*)\}|>(?P<asym>[^\[\]\n]*)\])"#,
    )
    .expect("node label regex must compile")
});

/// Pipe-delimited edge label: `-->|label|`.
static EDGE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|([^|\n]*)\|").expect("edge label regex must compile"));

/// Labels opening with these characters select a compound node shape
/// (`A[(db)]`, `A([stadium])`, `A[/lean/]`) and are left as written.
const SHAPE_MODIFIERS: &[char] = &['(', '[', '{', '/', '\\'];

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

const BRACKET_CHARS: &[char] = &['[', ']', '(', ')', '{', '}'];

/// First-stage cleanup applied before every render.
///
/// Strips a fenced-code wrapper and quotes node labels so spaces and
/// punctuation survive the render engine's parser. Labels that are already
/// quoted keep their delimiters; embedded double quotes become single quotes.
/// Text inside `|...|` edge labels is copied as written.
pub fn normalize(raw: &str) -> String {
    let source = strip_code_fence(raw);
    let mut out = String::with_capacity(source.len());
    let mut rest = 0;
    for edge in EDGE_LABEL.find_iter(&source) {
        out.push_str(&quote_node_labels(&source[rest..edge.start()]));
        out.push_str(edge.as_str());
        rest = edge.end();
    }
    out.push_str(&quote_node_labels(&source[rest..]));
    out
}

fn quote_node_labels(segment: &str) -> String {
    NODE_LABEL
        .replace_all(segment, |caps: &Captures<'_>| quote_node_label(caps))
        .into_owned()
}

/// Second-stage relaxation used only after a failed first render.
///
/// Removes every quote character and every bracket inside `|...|` edge
/// labels. This is a heuristic: it can alter diagrams that were valid.
pub fn relax_for_retry(normalized: &str) -> String {
    let unquoted: String = normalized
        .chars()
        .filter(|ch| !QUOTE_CHARS.contains(ch))
        .collect();

    EDGE_LABEL
        .replace_all(&unquoted, |caps: &Captures<'_>| {
            let label: String = caps[1]
                .chars()
                .filter(|ch| !BRACKET_CHARS.contains(ch))
                .collect();
            format!("|{label}|")
        })
        .into_owned()
}

fn quote_node_label(caps: &Captures<'_>) -> String {
    let whole = &caps[0];
    let id = &caps["id"];

    let (open, label, close) = if let Some(label) = caps.name("square") {
        ("[", label.as_str(), "]")
    } else if let Some(label) = caps.name("round") {
        ("(", label.as_str(), ")")
    } else if let Some(label) = caps.name("curly") {
        ("{", label.as_str(), "}")
    } else if let Some(label) = caps.name("asym") {
        (">", label.as_str(), "]")
    } else {
        return whole.to_string();
    };

    match quote_label(label) {
        Some(quoted) => format!("{id}{open}{quoted}{close}"),
        None => whole.to_string(),
    }
}

fn quote_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.starts_with(SHAPE_MODIFIERS) {
        return None;
    }

    let inner = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    Some(format!("\"{}\"", inner.replace('"', "'")))
}
