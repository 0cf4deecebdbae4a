// src/services/chunker.rs
//! Splits extracted document text into fixed-size word windows for the
//! knowledge store. Pure functions, no state.

use anyhow::{Context, Result};
use lopdf::Document;

/// Approximate words per chunk.
pub const CHUNK_WORDS: usize = 200;

/// Extract per-page text from raw PDF bytes. Pages that yield no text are
/// kept as empty strings so page ordering stays intact; the chunker drops
/// them later.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(bytes).context("failed to parse PDF")?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        let text = doc.extract_text(&[*page_number]).unwrap_or_default();
        pages.push(text);
    }
    Ok(pages)
}

/// Chunk each page into windows of [`CHUNK_WORDS`] words. No window ever
/// crosses a page boundary and empty windows are dropped.
pub fn chunk_pages(pages: &[String]) -> Vec<String> {
    pages
        .iter()
        .flat_map(|page| chunk_words(page, CHUNK_WORDS))
        .collect()
}

fn chunk_words(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    words
        .chunks(chunk_size)
        .map(|window| window.join(" "))
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_pages(&[]).is_empty());
        assert!(chunk_pages(&["".to_string(), "   \n ".to_string()]).is_empty());
    }

    #[test]
    fn short_page_is_one_chunk() {
        let pages = vec!["one two three".to_string()];
        let chunks = chunk_pages(&pages);
        assert_eq!(chunks, vec!["one two three".to_string()]);
    }

    #[test]
    fn windows_never_cross_pages() {
        // Two pages of 150 words each: a 200-word window would merge them
        // if pages were concatenated.
        let page = vec!["w"; 150].join(" ");
        let chunks = chunk_pages(&[page.clone(), page]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].split_whitespace().count(), 150);
    }
}
