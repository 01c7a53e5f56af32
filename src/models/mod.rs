use crate::error::EbookError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Job submission as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct EbookRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub number_of_chapters: i64,
    pub words_per_chapter: i64,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Backend selection threaded through every completion call.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub model: String,
    pub credential: Option<String>,
}

impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A validated request, immutable for the lifetime of the job.
#[derive(Debug, Clone)]
pub struct EbookJob {
    pub title: String,
    pub description: Option<String>,
    pub chapter_count: usize,
    pub words_per_chapter: u32,
    pub settings: GenerationSettings,
}

impl EbookRequest {
    pub fn validate(self, default_model: &str) -> Result<EbookJob, EbookError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(EbookError::Validation("title must not be empty".into()));
        }

        let chapter_count = usize::try_from(self.number_of_chapters)
            .ok()
            .filter(|count| *count > 0)
            .ok_or_else(|| {
                EbookError::Validation(format!(
                    "number_of_chapters must be a positive integer, got {}",
                    self.number_of_chapters
                ))
            })?;

        let words_per_chapter = u32::try_from(self.words_per_chapter)
            .ok()
            .filter(|words| *words > 0)
            .ok_or_else(|| {
                EbookError::Validation(format!(
                    "words_per_chapter must be a positive integer, got {}",
                    self.words_per_chapter
                ))
            })?;

        let model = self
            .model
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| default_model.to_string());

        Ok(EbookJob {
            title,
            description: self
                .description
                .map(|description| description.trim().to_string())
                .filter(|description| !description.is_empty()),
            chapter_count,
            words_per_chapter,
            settings: GenerationSettings {
                model,
                credential: self.api_key.filter(|key| !key.trim().is_empty()),
            },
        })
    }
}

/// One drafted chapter, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDraft {
    pub index: usize,
    pub name: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EbookResponse {
    pub ebook_content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub ebook_content: String,
    pub file_name: String,
    #[serde(default)]
    pub title: Option<String>,
}
