//! HTML fragment assembly for drafted chapters.

use crate::models::ChapterDraft;
use html_escape::encode_text;

/// The assembled ebook. Chapters can only be appended.
#[derive(Debug, Default, Clone)]
pub struct EbookDocument {
    html: String,
}

impl EbookDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chapter(&mut self, chapter: &ChapterDraft) {
        self.html.push_str(&format!(
            "<h1>Chapter {}: {}</h1> \n\n",
            chapter.index,
            encode_text(&chapter.name)
        ));
        self.html.push_str("<p>");
        self.html
            .push_str(&encode_text(&chapter.text).replace('\n', "</p><p>"));
        self.html.push_str("</p><br/><br/><br/>");
    }

    pub fn into_html(self) -> String {
        self.html
    }
}
