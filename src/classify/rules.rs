use diagram_engine::strip_code_fence;
use serde_json::Value;

use super::render::{
    block, checklist, diagram_fence, download_link, event_confirmation, field, field_str,
    first_field, first_str, image_markdown, json_dump, recipients, text_of, with_sources,
};
use super::ClassifyContext;
use crate::attachment::{AttachmentUnit, ContentAction};

/// One entry of the classification cascade.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    matches: fn(&Value) -> bool,
    apply: fn(&Value, &ClassifyContext<'_>) -> ContentAction,
}

impl Rule {
    pub fn matches(&self, data: &Value) -> bool {
        (self.matches)(data)
    }

    pub fn apply(&self, data: &Value, context: &ClassifyContext<'_>) -> ContentAction {
        (self.apply)(data, context)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

const IMAGE_KEYS: &[&str] = &["image_url", "image", "image_base64"];
const ARCHIVE_KEYS: &[&str] = &["zip_url", "archive_url"];
const PPTX_PATH_KEYS: &[&str] = &["file_path", "path", "pptx_path"];
const DOWNLOAD_KEYS: &[&str] = &["download_url", "presentation_url", "pptx_url"];
const CONTENT_KEYS: &[&str] = &["content", "response", "result"];

/// Classification cascade. The first matching rule wins, so order matters:
/// an email payload carrying a `message` must hit `email` before `message`.
pub const RULES: &[Rule] = &[
    Rule {
        name: "image",
        matches: is_image,
        apply: image,
    },
    Rule {
        name: "presentation",
        matches: is_presentation,
        apply: presentation,
    },
    Rule {
        name: "document",
        matches: is_document,
        apply: document,
    },
    Rule {
        name: "presentation_download",
        matches: is_presentation_download,
        apply: presentation_download,
    },
    Rule {
        name: "flowchart",
        matches: is_flowchart,
        apply: flowchart,
    },
    Rule {
        name: "summary",
        matches: is_summary,
        apply: summary,
    },
    Rule {
        name: "output",
        matches: is_output,
        apply: output,
    },
    Rule {
        name: "tasks",
        matches: is_tasks,
        apply: tasks,
    },
    Rule {
        name: "email",
        matches: is_email,
        apply: email,
    },
    Rule {
        name: "article",
        matches: is_article,
        apply: article,
    },
    Rule {
        name: "content",
        matches: is_content,
        apply: content,
    },
    Rule {
        name: "answer",
        matches: is_answer,
        apply: answer,
    },
    Rule {
        name: "text",
        matches: Value::is_string,
        apply: text,
    },
    Rule {
        name: "event_confirmation",
        matches: is_event_confirmation,
        apply: event,
    },
    Rule {
        name: "message",
        matches: is_message,
        apply: message,
    },
    Rule {
        name: "structured_data",
        matches: any_shape,
        apply: structured_data,
    },
];

fn is_image(data: &Value) -> bool {
    first_str(data, IMAGE_KEYS).is_some_and(|source| !source.trim().is_empty())
}

fn image(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    let source = first_str(data, IMAGE_KEYS).unwrap_or_default();
    ContentAction::AppendText(image_markdown(source))
}

fn is_presentation(data: &Value) -> bool {
    first_str(data, ARCHIVE_KEYS).is_some() || pptx_path(data).is_some()
}

fn pptx_path(data: &Value) -> Option<&str> {
    PPTX_PATH_KEYS
        .iter()
        .filter_map(|key| field_str(data, key))
        .find(|path| path.trim().to_ascii_lowercase().ends_with(".pptx"))
}

fn presentation(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    ContentAction::SetAttachment(AttachmentUnit::Presentation {
        title: first_str(data, &["title", "name"])
            .unwrap_or("Presentation")
            .to_string(),
        archive_url: first_str(data, ARCHIVE_KEYS).map(str::to_string),
        file_path: pptx_path(data).map(str::to_string),
    })
}

fn is_document(data: &Value) -> bool {
    field(data, "document").is_some()
        || (field(data, "type").is_some() && field(data, "filename").is_some())
}

fn document(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    let nested = field(data, "document").filter(|value| value.is_object());
    let lookup = |key: &str| {
        field_str(data, key).or_else(|| nested.and_then(|document| field_str(document, key)))
    };

    let body = match field(data, "document") {
        Some(Value::String(body)) => body.clone(),
        Some(document @ Value::Object(_)) => field(document, "content")
            .or_else(|| field(data, "content"))
            .map(text_of)
            .unwrap_or_default(),
        Some(other) => text_of(other),
        None => field(data, "content").map(text_of).unwrap_or_default(),
    };
    let filename = lookup("filename").map(str::to_string);
    let title = lookup("title")
        .map(str::to_string)
        .or_else(|| filename.clone())
        .unwrap_or_else(|| "Document".to_string());

    ContentAction::SetAttachment(AttachmentUnit::Document {
        title,
        body: strip_code_fence(&body),
        doc_type: lookup("type").map(str::to_string),
        filename,
    })
}

fn is_presentation_download(data: &Value) -> bool {
    first_str(data, DOWNLOAD_KEYS).is_some()
}

fn presentation_download(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    ContentAction::AppendText(download_link(
        first_str(data, DOWNLOAD_KEYS).unwrap_or_default(),
    ))
}

fn is_flowchart(data: &Value) -> bool {
    field(data, "flowchart").is_some()
}

fn flowchart(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    match field(data, "flowchart") {
        Some(source) => ContentAction::AppendText(diagram_fence(source)),
        None => ContentAction::Ignore,
    }
}

fn is_summary(data: &Value) -> bool {
    field(data, "summary").is_some()
}

fn summary(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    append_field(data, "summary")
}

fn is_output(data: &Value) -> bool {
    field(data, "output").is_some()
}

fn output(data: &Value, context: &ClassifyContext<'_>) -> ContentAction {
    let body = field(data, "output").map(text_of).unwrap_or_default();
    persona_routed(data, body, context)
}

fn is_tasks(data: &Value) -> bool {
    field(data, "tasks").is_some_and(Value::is_array)
}

fn tasks(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    match field(data, "tasks").and_then(Value::as_array) {
        Some(tasks) => ContentAction::AppendText(checklist(tasks)),
        None => ContentAction::Ignore,
    }
}

fn is_email(data: &Value) -> bool {
    let has = |key| field(data, key).is_some();
    field(data, "preview").is_some_and(Value::is_object)
        || (has("subject") && has("body"))
        || (has("body") && (has("to") || has("recipient")))
}

fn email(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    let source = field(data, "preview")
        .filter(|preview| preview.is_object())
        .unwrap_or(data);
    let text = |key: &str| field(source, key).map(text_of).unwrap_or_default();

    ContentAction::SetAttachment(AttachmentUnit::Email {
        to: first_field(source, &["to", "recipient", "recipients"])
            .map(|(_, value)| recipients(value))
            .unwrap_or_default(),
        cc: field(source, "cc")
            .map(recipients)
            .filter(|cc| !cc.is_empty()),
        subject: text("subject"),
        body: text("body"),
    })
}

fn is_article(data: &Value) -> bool {
    first_field(data, &["article", "report"]).is_some()
}

fn article(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    let Some((key, body)) = first_field(data, &["article", "report"]) else {
        return ContentAction::Ignore;
    };
    let default_title = if key == "article" { "Article" } else { "Report" };
    ContentAction::SetAttachment(AttachmentUnit::Document {
        title: field_str(data, "title").unwrap_or(default_title).to_string(),
        body: strip_code_fence(&text_of(body)),
        doc_type: Some(key.to_string()),
        filename: field_str(data, "filename").map(str::to_string),
    })
}

fn is_content(data: &Value) -> bool {
    first_field(data, CONTENT_KEYS).is_some()
}

fn content(data: &Value, context: &ClassifyContext<'_>) -> ContentAction {
    let Some((key, value)) = first_field(data, CONTENT_KEYS) else {
        return ContentAction::Ignore;
    };
    let mut body = text_of(value);
    if key == "result" {
        if let Some(sources) = field(data, "sources").and_then(Value::as_array) {
            body = with_sources(body, sources);
        }
    }
    persona_routed(data, body, context)
}

fn is_answer(data: &Value) -> bool {
    field(data, "answer").is_some()
}

fn answer(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    append_field(data, "answer")
}

fn text(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    ContentAction::AppendText(data.as_str().unwrap_or_default().to_string())
}

fn is_event_confirmation(data: &Value) -> bool {
    field(data, "message").is_some() && field(data, "event_preview").is_some()
}

fn event(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    match (field(data, "message"), field(data, "event_preview")) {
        (Some(message), Some(preview)) => {
            ContentAction::AppendText(event_confirmation(message, preview))
        }
        _ => ContentAction::Ignore,
    }
}

fn is_message(data: &Value) -> bool {
    field(data, "message").is_some()
}

fn message(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    append_field(data, "message")
}

fn any_shape(_: &Value) -> bool {
    true
}

fn structured_data(data: &Value, _: &ClassifyContext<'_>) -> ContentAction {
    ContentAction::AppendText(json_dump(data))
}

fn append_field(data: &Value, key: &str) -> ContentAction {
    match field(data, key) {
        Some(Value::String(text)) => ContentAction::AppendText(text.clone()),
        Some(other) => ContentAction::AppendText(block(text_of(other))),
        None => ContentAction::Ignore,
    }
}

/// Research personas receive long-form bodies as documents; everyone else
/// gets them inline.
fn persona_routed(data: &Value, body: String, context: &ClassifyContext<'_>) -> ContentAction {
    if !context.is_research_persona() {
        return ContentAction::AppendText(body);
    }
    ContentAction::SetAttachment(AttachmentUnit::Document {
        title: field_str(data, "title")
            .unwrap_or("Research report")
            .to_string(),
        body: strip_code_fence(&body),
        doc_type: Some("research".to_string()),
        filename: field_str(data, "filename").map(str::to_string),
    })
}
