use crate::error::GenerationError;
use crate::models::GenerationSettings;
use crate::services::llm::CompletionClient;
use crate::services::prompts::{OUTLINE, OutlineParams};

/// Asks the backend for `chapter_count` chapter names.
///
/// The backend is not held to the requested count: callers must treat the
/// length of the returned outline as authoritative.
pub async fn generate_outline(
    llm_client: &dyn CompletionClient,
    chapter_count: usize,
    title: &str,
    description: Option<&str>,
    settings: &GenerationSettings,
) -> Result<Vec<String>, GenerationError> {
    let prompt = OUTLINE.render(&OutlineParams {
        chapter_count,
        title,
        description,
    });

    let response = llm_client
        .complete(
            &prompt.system,
            &prompt.user,
            &settings.model,
            settings.credential.as_deref(),
        )
        .await?;

    let outline = parse_outline(&response);
    if outline.is_empty() {
        return Err(GenerationError::EmptyOutline);
    }

    if outline.len() != chapter_count {
        tracing::warn!(
            requested = chapter_count,
            returned = outline.len(),
            "outline length differs from the requested chapter count"
        );
    }

    Ok(outline)
}

fn parse_outline(response: &str) -> Vec<String> {
    response
        .replace('\n', " ")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::testing::StubClient;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "gpt-3.5-turbo".into(),
            credential: Some("sk-test".into()),
        }
    }

    #[test]
    fn splits_on_commas_and_trims() {
        assert_eq!(
            parse_outline(" First Light ,The Long Road,\nLast Ember , "),
            vec!["First Light", "The Long Road", "Last Ember"]
        );
    }

    #[tokio::test]
    async fn returns_however_many_names_the_backend_gave() {
        let client = StubClient::by_kind("Dawn, Noon, Dusk, Night");
        let outline = generate_outline(&client, 2, "Atlas", None, &settings())
            .await
            .unwrap();
        assert_eq!(outline, vec!["Dawn", "Noon", "Dusk", "Night"]);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "gpt-3.5-turbo");
        assert_eq!(calls[0].credential.as_deref(), Some("sk-test"));
        assert!(calls[0].system.contains("list of 2 chapters"));
    }

    #[tokio::test]
    async fn blank_reply_is_a_generation_failure() {
        let client = StubClient::by_kind(" , ,\n");
        let err = generate_outline(&client, 3, "Atlas", None, &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutline));
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let client = StubClient::new(|_, _| {
            Err(GenerationError::Backend {
                status: 401,
                body: "invalid api key".into(),
            })
        });
        let err = generate_outline(&client, 3, "Atlas", None, &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Backend { status: 401, .. }));
    }
}
