//! The chapter-generation pipeline.
//!
//! Drafts chapters strictly in outline order. Every draft sees a rolling
//! summary of the chapters before it, and that summary is recompacted once
//! it grows past [`COMPACTION_THRESHOLD_WORDS`].

use crate::error::{EbookError, Stage};
use crate::models::{ChapterDraft, EbookJob};
use crate::services::document::EbookDocument;
use crate::services::llm::CompletionClient;
use crate::services::outline::generate_outline;
use crate::services::prompts::ChapterParams;
use crate::services::summarizer::{
    COMPACTED_SUMMARY_WORDS, COMPACTION_THRESHOLD_WORDS, needs_compaction, summarize,
    summary_target_words, word_count,
};
use crate::services::writer::draft_chapter;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Outlining,
    Drafting(usize),
    Summarizing(usize),
    Done,
    Failed,
}

#[derive(Debug)]
pub struct EbookOutput {
    pub chapter_names: Vec<String>,
    pub ebook_content: String,
}

pub struct EbookPipeline<'a> {
    job: &'a EbookJob,
    llm_client: &'a dyn CompletionClient,
    job_id: Uuid,
    state: PipelineState,
    rolling_summary: String,
    document: EbookDocument,
}

impl<'a> EbookPipeline<'a> {
    pub fn new(job: &'a EbookJob, llm_client: &'a dyn CompletionClient) -> Self {
        Self {
            job,
            llm_client,
            job_id: Uuid::new_v4(),
            state: PipelineState::Outlining,
            rolling_summary: String::new(),
            document: EbookDocument::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the job to completion. Any failed call aborts the whole job and
    /// nothing drafted so far is returned.
    pub async fn run(&mut self) -> Result<EbookOutput, EbookError> {
        tracing::info!(
            job_id = %self.job_id,
            title = %self.job.title,
            chapters = self.job.chapter_count,
            words_per_chapter = self.job.words_per_chapter,
            model = %self.job.settings.model,
            "starting ebook job"
        );

        match self.execute().await {
            Ok(output) => {
                self.transition(PipelineState::Done);
                tracing::info!(
                    job_id = %self.job_id,
                    chapters = output.chapter_names.len(),
                    "ebook job finished"
                );
                Ok(output)
            }
            Err(e) => {
                let failed_in = self.state();
                self.transition(PipelineState::Failed);
                tracing::error!(
                    job_id = %self.job_id,
                    state = ?failed_in,
                    error = %e,
                    "ebook job failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<EbookOutput, EbookError> {
        let job = self.job;
        let settings = &job.settings;

        let outline = generate_outline(
            self.llm_client,
            job.chapter_count,
            &job.title,
            job.description.as_deref(),
            settings,
        )
        .await
        .map_err(EbookError::generation(Stage::Outline))?;

        tracing::debug!(job_id = %self.job_id, outline = ?outline, "outline ready");

        let target_words = summary_target_words(job.words_per_chapter);

        // The returned outline decides how many chapters get written
        for (position, name) in outline.iter().enumerate() {
            let index = position + 1;

            self.transition(PipelineState::Drafting(index));
            let params = ChapterParams {
                book_title: &job.title,
                book_description: job.description.as_deref(),
                chapter_index: index,
                chapter_name: name,
                summary_so_far: &self.rolling_summary,
                words_per_chapter: job.words_per_chapter,
            };
            let text = draft_chapter(self.llm_client, &params, settings)
                .await
                .map_err(EbookError::generation(Stage::Draft(index)))?;

            let draft = ChapterDraft {
                index,
                name: name.clone(),
                text,
            };
            self.document.push_chapter(&draft);

            self.transition(PipelineState::Summarizing(index));
            let mut summary = summarize(self.llm_client, &draft.text, target_words, settings)
                .await
                .map_err(EbookError::generation(Stage::Summary(index)))?;

            // Checks the summary accumulated through the previous chapter and,
            // when it is too long, its recompaction replaces this chapter's summary.
            if needs_compaction(&self.rolling_summary) {
                tracing::info!(
                    job_id = %self.job_id,
                    chapter = index,
                    words = word_count(&self.rolling_summary),
                    threshold = COMPACTION_THRESHOLD_WORDS,
                    "compacting rolling summary"
                );
                summary = summarize(
                    self.llm_client,
                    &self.rolling_summary,
                    COMPACTED_SUMMARY_WORDS,
                    settings,
                )
                .await
                .map_err(EbookError::generation(Stage::Compaction(index)))?;
            }

            self.rolling_summary
                .push_str(&format!("Chapter {} Summary: {}\n\n", index, summary));

            tracing::debug!(
                job_id = %self.job_id,
                chapter = index,
                chapter_words = word_count(&draft.text),
                summary_words = word_count(&self.rolling_summary),
                "chapter complete"
            );
        }

        Ok(EbookOutput {
            chapter_names: outline,
            ebook_content: std::mem::take(&mut self.document).into_html(),
        })
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(job_id = %self.job_id, from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }
}
