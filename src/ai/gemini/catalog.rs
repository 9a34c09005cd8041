use super::client::GeminiHttpClient;
use super::types::ListModelsResponse;
use crate::ai::ModelCatalog;
use crate::models::{Config, ModelInfo};
use crate::Result;
use async_trait::async_trait;

/// Gemini implementation of [`ModelCatalog`].
pub struct GeminiModelCatalog {
    http: GeminiHttpClient,
}

impl GeminiModelCatalog {
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(config, client),
        }
    }
}

#[async_trait]
impl ModelCatalog for GeminiModelCatalog {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        tracing::debug!("Listing models from {}", self.http.base_url());

        let response: ListModelsResponse = self.http.list_models().await?;

        if response.next_page_token.is_some() {
            tracing::warn!(
                "Model listing was truncated after {} entries",
                response.models.len()
            );
        }

        let models: Vec<ModelInfo> = response.models.into_iter().map(ModelInfo::from).collect();
        tracing::info!("Model listing returned {} models", models.len());

        Ok(models)
    }
}
