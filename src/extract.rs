use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Convert an uploaded file into plain text.
///
/// Behavior:
/// - `.docx`: unzip, pull the `<w:t>` runs out of `word/document.xml`,
///   paragraphs separated by blank lines.
/// - `.pdf`: per-page text extraction, pages joined with blank lines.
/// - anything else: raw UTF-8 read.
///
/// Content that is empty after trimming is an error.
pub fn extract_text(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let text = match ext.as_deref() {
        Some("docx") => extract_docx(path)?,
        Some("pdf") => extract_pdf(path)?,
        _ => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
    };

    if text.trim().is_empty() {
        bail!(
            "no text could be extracted from {} (file appears to be empty)",
            path.display()
        );
    }
    Ok(text)
}

fn extract_docx(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a valid .docx archive", path.display()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .context("docx archive has no word/document.xml")?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("failed to read word/document.xml")?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event().context("malformed word/document.xml")? {
            Event::Start(e) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = true;
                }
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" => out.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    out.push_str(&t.unescape().context("malformed text run")?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}

fn extract_pdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    // get_pages is keyed by 1-based page number.
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut out = String::new();
    for page in pages {
        let text = doc
            .extract_text(&[page])
            .with_context(|| format!("failed to extract text from page {page}"))?;
        out.push_str(text.trim_end());
        out.push_str("\n\n");
    }

    Ok(out.trim_end().to_string())
}
