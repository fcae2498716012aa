use crate::extract::sanitize_filename;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Text,
}

impl ContentKind {
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_lowercase().ends_with(".pdf") {
            ContentKind::Pdf
        } else {
            ContentKind::Text
        }
    }
}

/// One uploaded document, consumed by text extraction.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub raw_bytes: Vec<u8>,
    pub filename: String,
    pub content_kind: ContentKind,
}

impl AnalysisRequest {
    /// Derives the content kind from the client-supplied filename, then sanitizes it.
    pub fn new(raw_bytes: Vec<u8>, filename: &str) -> Self {
        let content_kind = ContentKind::from_filename(filename);
        let filename = sanitize_filename(filename);
        Self {
            raw_bytes,
            filename,
            content_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_from_filename() {
        assert_eq!(AnalysisRequest::new(vec![], "Report.PDF").content_kind, ContentKind::Pdf);
        assert_eq!(AnalysisRequest::new(vec![], "notes.txt").content_kind, ContentKind::Text);
        assert_eq!(AnalysisRequest::new(vec![], "pdf").content_kind, ContentKind::Text);
    }

    #[test]
    fn test_non_ascii_pdf_name_stays_pdf() {
        let request = AnalysisRequest::new(b"%PDF-1.4".to_vec(), "点検報告.pdf");
        assert_eq!(request.content_kind, ContentKind::Pdf);
        assert_eq!(request.filename, "document.pdf");
    }
}
