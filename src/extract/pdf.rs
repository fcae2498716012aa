use crate::error::{Error, Result};

/// Page-by-page text, each page followed by a newline.
///
/// pdf-extract can panic on malformed fonts, so the call is wrapped in
/// `catch_unwind` and a panic is reported as an extraction error.
pub fn extract_pages(bytes: &[u8]) -> Result<String> {
    tracing::debug!("PDF size: {} bytes", bytes.len());

    let pages = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    })) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(Error::Extraction(e.to_string())),
        Err(_panic) => {
            return Err(Error::Extraction(
                "PDF parser panicked, the file likely contains malformed fonts".to_string(),
            ))
        }
    };

    let mut text = String::new();
    for page in &pages {
        text.push_str(page);
        text.push('\n');
    }

    tracing::info!("Extracted {} pages, {} characters", pages.len(), text.chars().count());
    Ok(text)
}
