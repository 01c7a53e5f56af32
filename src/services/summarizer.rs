use crate::error::GenerationError;
use crate::models::GenerationSettings;
use crate::services::llm::CompletionClient;
use crate::services::prompts::{SUMMARY, SummaryParams};

/// Rolling summaries longer than this are recompacted.
pub const COMPACTION_THRESHOLD_WORDS: usize = 1200;
/// Target length of a recompacted rolling summary.
pub const COMPACTED_SUMMARY_WORDS: u32 = 600;

const MIN_CHAPTER_SUMMARY_WORDS: u32 = 50;
const MAX_CHAPTER_SUMMARY_WORDS: u32 = 100;

pub async fn summarize(
    llm_client: &dyn CompletionClient,
    text: &str,
    target_words: u32,
    settings: &GenerationSettings,
) -> Result<String, GenerationError> {
    let prompt = SUMMARY.render(&SummaryParams {
        input: text,
        target_words,
    });

    llm_client
        .complete(
            &prompt.system,
            &prompt.user,
            &settings.model,
            settings.credential.as_deref(),
        )
        .await
}

/// About a seventh of the chapter length, kept within 50..=100 words.
pub fn summary_target_words(words_per_chapter: u32) -> u32 {
    let scaled = (f64::from(words_per_chapter) / 7.0).round() as u32;
    scaled.clamp(MIN_CHAPTER_SUMMARY_WORDS, MAX_CHAPTER_SUMMARY_WORDS)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn needs_compaction(rolling_summary: &str) -> bool {
    word_count(rolling_summary) > COMPACTION_THRESHOLD_WORDS
}
