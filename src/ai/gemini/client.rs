use crate::models::{strip_model_prefix, ApiKey, Config};
use crate::{Error, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Largest page the listing endpoint accepts. One page is one listing call.
const LIST_PAGE_SIZE: u32 = 1000;

/// Lightweight Gemini REST client shared by the analysis and catalog modules.
///
/// Holding an [`ApiKey`] is required to build one, so every request it sends
/// is authenticated.
#[derive(Clone)]
pub struct GeminiHttpClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiHttpClient {
    pub fn new_with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        builder.header("x-goog-api-key", self.api_key.expose())
    }

    async fn send<Resp: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Resp> {
        let response = self.authorized(builder).send().await.map_err(|e| {
            tracing::error!("Failed to send request to Gemini: {}", e);
            Error::RemoteInvocation(format!("request to Gemini failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = read_body(response).await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::RemoteInvocation(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let body = read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::RemoteInvocation(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls `generateContent` on `model` (bare ID or `models/...` path).
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            strip_model_prefix(model)
        );
        self.send(self.client.post(&url).json(request)).await
    }

    /// Calls the model listing endpoint once.
    pub async fn list_models<Resp: DeserializeOwned>(&self) -> Result<Resp> {
        let url = format!("{}/v1beta/models", self.base_url);
        self.send(
            self.client
                .get(&url)
                .query(&[("pageSize", LIST_PAGE_SIZE)]),
        )
        .await
    }
}

async fn read_body(response: Response) -> Result<String> {
    response.text().await.map_err(|e| {
        tracing::error!("Failed to read Gemini response body: {}", e);
        Error::RemoteInvocation(format!("reading Gemini response failed: {}", e))
    })
}
