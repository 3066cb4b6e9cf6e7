use super::super::domain::SubmittedDocument;

/// Outcome of inspecting a single submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentQuality {
    Valid,
    Invalid { reason: String },
}

/// Per-document quality gate run during fraud screening.
pub trait DocumentInspector: Send + Sync {
    fn inspect(&self, document: &SubmittedDocument) -> DocumentQuality;
}

/// Placeholder gate: every document passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllDocuments;

impl DocumentInspector for AcceptAllDocuments {
    fn inspect(&self, _document: &SubmittedDocument) -> DocumentQuality {
        DocumentQuality::Valid
    }
}

pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 100 * 1024;
pub const DEFAULT_ALLOWED_FORMATS: [&str; 3] = ["jpeg", "jpg", "png"];

/// Rejects scans in formats the verification desk cannot read, and oversized uploads.
#[derive(Debug, Clone)]
pub struct FormatDocumentInspector {
    allowed_formats: Vec<String>,
    max_bytes: u64,
}

impl Default for FormatDocumentInspector {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED_FORMATS.iter().map(|format| format.to_string()),
            DEFAULT_MAX_DOCUMENT_BYTES,
        )
    }
}

impl FormatDocumentInspector {
    pub fn new(allowed_formats: impl IntoIterator<Item = String>, max_bytes: u64) -> Self {
        Self {
            allowed_formats: allowed_formats
                .into_iter()
                .map(|format| format.to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }
}

impl DocumentInspector for FormatDocumentInspector {
    fn inspect(&self, document: &SubmittedDocument) -> DocumentQuality {
        let extension = file_extension(&document.file_url).unwrap_or_default();
        if !self.allowed_formats.iter().any(|format| *format == extension) {
            let shown = if extension.is_empty() {
                "unknown"
            } else {
                extension.as_str()
            };
            return DocumentQuality::Invalid {
                reason: format!("Unsupported document format: {shown}"),
            };
        }

        if document.size_bytes.is_some_and(|size| size > self.max_bytes) {
            return DocumentQuality::Invalid {
                reason: "Document exceeds size limit".to_string(),
            };
        }

        DocumentQuality::Valid
    }
}

/// Lower-cased extension of the last path segment, ignoring query strings and fragments.
fn file_extension(file_url: &str) -> Option<String> {
    let path = file_url.split(['?', '#']).next().unwrap_or(file_url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
