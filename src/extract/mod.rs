pub mod pdf;

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::models::{AnalysisRequest, ContentKind};

/// Plain text for an uploaded document.
///
/// PDF failures do not fail the call: the failure description becomes the
/// document text and flows into the prompts unchanged. Text uploads that are
/// not valid UTF-8 are rejected.
pub async fn extract(request: AnalysisRequest) -> Result<String> {
    match request.content_kind {
        ContentKind::Pdf => {
            let filename = request.filename.clone();
            let bytes = request.raw_bytes;
            let outcome = tokio::task::spawn_blocking(move || pdf::extract_pages(&bytes))
                .await
                .map_err(|e| Error::Extraction(format!("extraction task failed: {}", e)))
                .and_then(|r| r);

            Ok(match outcome {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("PDF extraction failed for {}: {}", filename, e);
                    degraded_text(&e)
                }
            })
        }
        ContentKind::Text => Ok(String::from_utf8(request.raw_bytes)?),
    }
}

fn degraded_text(error: &Error) -> String {
    match error {
        Error::Extraction(reason) => format!("Error extracting text from PDF: {}", reason),
        other => format!("Error extracting text from PDF: {}", other),
    }
}

/// Reduces a client-supplied filename to a safe ASCII basename.
///
/// Accented letters are folded to their base letter. When nothing of the
/// stem survives, the extension is kept on a `document` stem.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        return "document".to_string();
    }

    // Only the extension survived, e.g. "点検報告.pdf" -> "pdf".
    let stem_stripped = !cleaned.contains('.')
        && base.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.trim_start_matches('.').is_empty() && ext.eq_ignore_ascii_case(cleaned)
        });
    if stem_stripped {
        return format!("document.{}", cleaned);
    }

    cleaned.to_string()
}
