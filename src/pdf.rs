use anyhow::Result;

/// Extract the text of every page of a PDF held in memory.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed documents instead of returning an error.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| anyhow::anyhow!("Error extracting text from PDF: malformed document"))?
        .map_err(|e| anyhow::anyhow!("Error extracting text from PDF: {e}"))?;
    if text.trim().is_empty() {
        anyhow::bail!("No text extracted from PDF");
    }
    tracing::info!("Extracted {} characters from PDF", text.len());
    Ok(text)
}

/// Uploaded file names must carry a `.pdf` extension.
pub fn is_pdf_filename(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}
