use crate::config::Config;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sends one system + user prompt pair to a text-generation backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        credential: Option<&str>,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl LLMClient {
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.llm_timeout)
            .build()?;

        Ok(LLMClient {
            client,
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            temperature: config.llm_temperature,
        })
    }
}

#[async_trait]
impl CompletionClient for LLMClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        credential: Option<&str>,
    ) -> Result<String, GenerationError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
        };

        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&request);

        // The job's own key wins over the service-wide one
        if let Some(key) = credential.or(self.api_key.as_deref()) {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = request_builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        parse_completion(&response_text)
    }
}

fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("response has no choices".into()))?
        .message
        .content
        .ok_or_else(|| GenerationError::MalformedResponse("choice has no content".into()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Dawn, Dusk"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Dawn, Dusk");
    }

    #[test]
    fn missing_choices_is_malformed() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));

        let err = parse_completion("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn null_content_is_malformed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    /// Serves `/ok`, `/denied` and `/quota`. Failing routes echo the
    /// `Authorization` header (or `none`) as their body.
    async fn spawn_backend() -> String {
        use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};

        fn authorization(headers: &HeaderMap) -> String {
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string()
        }

        let router = Router::new()
            .route(
                "/ok",
                post(|| async {
                    Json(serde_json::json!({
                        "choices": [{ "message": { "role": "assistant", "content": "Dawn, Dusk" } }]
                    }))
                }),
            )
            .route(
                "/denied",
                post(|headers: HeaderMap| async move {
                    (StatusCode::UNAUTHORIZED, authorization(&headers))
                }),
            )
            .route(
                "/quota",
                post(|headers: HeaderMap| async move {
                    (StatusCode::TOO_MANY_REQUESTS, authorization(&headers))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base: &str, route: &str, api_key: Option<&str>) -> LLMClient {
        let config = Config {
            llm_api_url: format!("{}{}", base, route),
            llm_api_key: api_key.map(str::to_string),
            ..Config::from_lookup(|_| None).unwrap()
        };
        LLMClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn returns_backend_text_on_success() {
        let base = spawn_backend().await;
        let text = client(&base, "/ok", None)
            .complete("system", "user", "gpt-3.5-turbo", None)
            .await
            .unwrap();
        assert_eq!(text, "Dawn, Dusk");
    }

    #[tokio::test]
    async fn job_credential_wins_over_configured_key() {
        let base = spawn_backend().await;
        let err = client(&base, "/denied", Some("env-key"))
            .complete("system", "user", "gpt-3.5-turbo", Some("job-key"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Backend { status: 401, ref body } if body == "Bearer job-key"
        ));
    }

    #[tokio::test]
    async fn falls_back_to_configured_key() {
        let base = spawn_backend().await;
        let err = client(&base, "/denied", Some("env-key"))
            .complete("system", "user", "gpt-3.5-turbo", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Backend { status: 401, ref body } if body == "Bearer env-key"
        ));
    }

    #[tokio::test]
    async fn sends_no_authorization_without_any_key() {
        let base = spawn_backend().await;
        let err = client(&base, "/denied", None)
            .complete("system", "user", "gpt-3.5-turbo", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Backend { status: 401, ref body } if body == "none"
        ));
    }

    #[tokio::test]
    async fn rate_limit_becomes_backend_error() {
        let base = spawn_backend().await;
        let err = client(&base, "/quota", None)
            .complete("system", "user", "gpt-3.5-turbo", Some("job-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Backend { status: 429, .. }));
    }

    #[test]
    fn omits_temperature_when_unset() {
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
