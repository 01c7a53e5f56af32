use crate::error::GenerationError;
use crate::models::GenerationSettings;
use crate::services::llm::CompletionClient;
use crate::services::prompts::ChapterParams;

/// Drafts a single chapter. The word count is a request to the backend and is
/// not checked against the reply.
pub async fn draft_chapter(
    llm_client: &dyn CompletionClient,
    chapter: &ChapterParams<'_>,
    settings: &GenerationSettings,
) -> Result<String, GenerationError> {
    let prompt = chapter.render();

    llm_client
        .complete(
            &prompt.system,
            &prompt.user,
            &settings.model,
            settings.credential.as_deref(),
        )
        .await
}
