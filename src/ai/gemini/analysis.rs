use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::{mime, AnalysisService};
use crate::models::{AnalysisRequest, Config};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;

const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Gemini implementation of [`AnalysisService`].
pub struct GeminiAnalysisClient {
    http: GeminiHttpClient,
}

impl GeminiAnalysisClient {
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(config, client),
        }
    }

    fn build_request(request: &AnalysisRequest) -> GenerateContentRequest {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&request.image);

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: request.prompt_text.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime::detect_image_mime(&request.image).to_string(),
                            data: encoded,
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            }),
        }
    }
}

#[async_trait]
impl AnalysisService for GeminiAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        tracing::debug!(
            request_id = %request.request_id,
            model = %request.model_id,
            "Sending label image ({} bytes) to Gemini",
            request.image.len()
        );

        let payload = Self::build_request(request);
        let response: GenerateContentResponse = self
            .http
            .generate_content(&request.model_id, &payload)
            .await?;

        if let Some(text) = response.text() {
            return Ok(text);
        }

        let reason = response
            .block_reason()
            .map(|r| format!("prompt blocked by Gemini ({})", r))
            .or_else(|| {
                response
                    .finish_reason()
                    .map(|r| format!("Gemini returned no text (finish reason {})", r))
            })
            .unwrap_or_else(|| "No text in Gemini response".to_string());

        tracing::error!(request_id = %request.request_id, "{}", reason);
        Err(Error::RemoteInvocation(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::models::ApiKey;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

    fn make_client(server: &MockServer, api_key: &str) -> GeminiAnalysisClient {
        let mut config = Config::new(ApiKey::new(api_key).unwrap());
        config.base_url = server.uri();
        GeminiAnalysisClient::new(&config)
    }

    fn request(model: &str) -> AnalysisRequest {
        AnalysisRequest::new(PNG.to_vec(), "라벨을 분석하세요".to_string(), model.to_string())
    }

    #[tokio::test]
    async fn test_analyze_returns_reply_text() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("\"inlineData\""))
            .and(body_string_contains("\"mimeType\":\"image/png\""))
            .and(body_string_contains("라벨을 분석하세요"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_reply("이름: 샤또 마고")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let text = client.analyze(&request("gemini-1.5-flash")).await.unwrap();
        assert_eq!(text, "이름: 샤또 마고");
    }

    #[tokio::test]
    async fn test_analyze_joins_split_text_parts() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "이름: 샤또 " }, { "text": "마고" }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let text = client.analyze(&request("gemini-1.5-flash")).await.unwrap();
        assert_eq!(text, "이름: 샤또 마고");
    }

    #[tokio::test]
    async fn test_api_error_is_remote_invocation_with_service_message() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client
            .analyze(&request("gemini-1.5-flash"))
            .await
            .unwrap_err();

        match err {
            Error::RemoteInvocation(message) => {
                assert!(message.contains("429"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_remote_invocation() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client
            .analyze(&request("gemini-1.5-flash"))
            .await
            .unwrap_err();

        match err {
            Error::RemoteInvocation(message) => assert!(message.contains("SAFETY")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_rejected() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client
            .analyze(&request("gemini-1.5-flash"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RemoteInvocation(_)));
    }

    #[tokio::test]
    async fn test_models_prefix_is_stripped_from_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(test_support::text_reply("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        client
            .analyze(&request("models/gemini-2.0-flash"))
            .await
            .unwrap();
    }
}
