/// Fence info string that marks diagram source in Markdown content.
pub const DIAGRAM_FENCE_TAG: &str = "mermaid";

const FENCE: &str = "```";

/// Remove a leading and/or trailing fenced-code wrapper.
///
/// The opening fence line is dropped together with its info string
/// (`` ```mermaid ``, `` ```markdown ``); inner content is returned trimmed.
/// Text without a wrapper comes back trimmed and otherwise untouched.
pub fn strip_code_fence(input: &str) -> String {
    let mut text = input.trim();

    if text.starts_with(FENCE) {
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => text.trim_start_matches('`'),
        };
    }

    if let Some(stripped) = text.trim_end().strip_suffix(FENCE) {
        text = stripped;
    }

    text.trim().to_string()
}

/// Wrap `body` in a fenced block carrying `tag`.
pub fn fence_block(tag: &str, body: &str) -> String {
    format!("{FENCE}{tag}\n{}\n{FENCE}", body.trim_end())
}
