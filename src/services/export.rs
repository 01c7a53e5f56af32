//! Renders an assembled HTML fragment into a downloadable EPUB.

use crate::error::EbookError;
use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use html_escape::{decode_html_entities, encode_text};
use regex::Regex;
use std::sync::LazyLock;

// Older fragments closed headings with </h2>
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h1>(.*?)</h[12]>").expect("heading pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    heading: String,
    body: String,
}

pub struct ExportedEbook {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export_epub(
    ebook_content: &str,
    file_name: &str,
    title: Option<&str>,
) -> Result<ExportedEbook, EbookError> {
    let file_name = export_file_name(file_name);
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| file_name.trim_end_matches(".epub").replace('_', " "));

    let sections = split_sections(ebook_content, &title);
    if sections.is_empty() {
        return Err(EbookError::Export("ebook content is empty".into()));
    }

    let mut builder = EpubBuilder::new(ZipLibrary::new().map_err(epub_error)?).map_err(epub_error)?;
    builder.metadata("title", title.as_str()).map_err(epub_error)?;
    builder.inline_toc();

    for (i, section) in sections.iter().enumerate() {
        let heading = decode_html_entities(&section.heading).into_owned();
        builder
            .add_content(
                EpubContent::new(format!("chapter_{}.xhtml", i + 1), xhtml(section).as_bytes())
                    .title(heading)
                    .reftype(ReferenceType::Text),
            )
            .map_err(epub_error)?;
    }

    let mut bytes = Vec::new();
    builder.generate(&mut bytes).map_err(epub_error)?;

    tracing::info!(
        file_name = %file_name,
        chapters = sections.len(),
        bytes = bytes.len(),
        "exported epub"
    );

    Ok(ExportedEbook { file_name, bytes })
}

fn epub_error(e: impl std::fmt::Display) -> EbookError {
    EbookError::Export(e.to_string())
}

/// Trims the requested name, swaps spaces for underscores and ensures an
/// `.epub` extension.
pub fn export_file_name(requested: &str) -> String {
    let stem: String = requested
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | '"' => '_',
            c => c,
        })
        .collect();
    let stem = if stem.is_empty() {
        "ebook".to_string()
    } else {
        stem
    };

    if stem.to_ascii_lowercase().ends_with(".epub") {
        stem
    } else {
        format!("{}.epub", stem)
    }
}

fn split_sections(content: &str, fallback_heading: &str) -> Vec<Section> {
    let headings: Vec<_> = HEADING.captures_iter(content).collect();

    if headings.is_empty() {
        let body = clean_body(content);
        if body.is_empty() {
            return Vec::new();
        }
        return vec![Section {
            heading: encode_text(fallback_heading).into_owned(),
            body,
        }];
    }

    headings
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let whole = caps.get(0).expect("match has a whole group");
            let end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(content.len());
            Section {
                heading: caps[1].trim().to_string(),
                body: clean_body(&content[whole.end()..end]),
            }
        })
        .collect()
}

fn clean_body(body: &str) -> String {
    let mut body = body.trim();
    while let Some(rest) = body.strip_suffix("<br/>") {
        body = rest.trim_end();
    }
    body.to_string()
}

fn xhtml(section: &Section) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n\
<head><title>{heading}</title></head>\n\
<body>\n<h1>{heading}</h1>\n{body}\n</body>\n</html>\n",
        heading = section.heading,
        body = section.body,
    )
}
