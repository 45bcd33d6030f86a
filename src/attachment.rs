use crate::viewer::ContentKind;

/// Structured artifact attached to an assistant turn.
///
/// A turn holds at most one; a later attachment replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentUnit {
    Presentation {
        title: String,
        archive_url: Option<String>,
        file_path: Option<String>,
    },
    Document {
        title: String,
        body: String,
        doc_type: Option<String>,
        filename: Option<String>,
    },
    Email {
        to: String,
        cc: Option<String>,
        subject: String,
        body: String,
    },
}

impl AttachmentUnit {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Presentation { .. } => ContentKind::Presentation,
            Self::Document { .. } => ContentKind::Document,
            Self::Email { .. } => ContentKind::Email,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Presentation { title, .. } | Self::Document { title, .. } => title,
            Self::Email { subject, .. } => subject,
        }
    }

    /// One-line description for compact transcript views.
    pub fn summary(&self) -> String {
        match self {
            Self::Presentation {
                title,
                archive_url,
                file_path,
            } => {
                let location = archive_url
                    .as_deref()
                    .or(file_path.as_deref())
                    .unwrap_or("no download available");
                format!("Presentation: {title} ({location})")
            }
            Self::Document {
                title, filename, ..
            } => match filename {
                Some(filename) => format!("Document: {title} ({filename})"),
                None => format!("Document: {title}"),
            },
            Self::Email { to, subject, .. } => format!("Email draft to {to}: {subject}"),
        }
    }

    /// Full text handed to a full-result viewer.
    pub fn full_content(&self) -> String {
        match self {
            Self::Presentation {
                title,
                archive_url,
                file_path,
            } => {
                let mut out = format!("# {title}\n");
                if let Some(url) = archive_url {
                    out.push_str(&format!("\nArchive: {url}\n"));
                }
                if let Some(path) = file_path {
                    out.push_str(&format!("\nFile: {path}\n"));
                }
                out
            }
            Self::Document { body, .. } => body.clone(),
            Self::Email {
                to,
                cc,
                subject,
                body,
            } => {
                let mut out = format!("To: {to}\n");
                if let Some(cc) = cc {
                    out.push_str(&format!("Cc: {cc}\n"));
                }
                out.push_str(&format!("Subject: {subject}\n\n{body}"));
                out
            }
        }
    }
}

/// Canonical effect of one stream record on the in-flight turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentAction {
    AppendText(String),
    SetAttachment(AttachmentUnit),
    Ignore,
}
