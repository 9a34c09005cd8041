//! Application orchestration: one image in, one interpreted analysis out.

use crate::ai::{AnalysisService, GeminiAnalysisClient, GeminiModelCatalog, ModelCatalog};
use crate::interpret::interpret;
use crate::models::{AnalysisReport, AnalysisRequest, Config, ModelInfo};
use crate::prompts::{compose_analysis_prompt, PromptOptions};
use crate::resolver::{ModelResolver, DEFAULT_MODEL};
use crate::{Error, Result};
use chrono::Utc;
use std::path::Path;
use tracing::{error, info, warn};

/// Coordinates model resolution, the single analysis call, and
/// interpretation of the reply.
pub struct App {
    analysis: Box<dyn AnalysisService>,
    resolver: ModelResolver,
    prompt_options: PromptOptions,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub analysis: Box<dyn AnalysisService>,
    pub catalog: Box<dyn ModelCatalog>,
}

/// Result of a model listing, as shown by the `models` command.
#[derive(Debug, Clone)]
pub struct ModelOverview {
    pub models: Vec<ModelInfo>,
    pub default_available: bool,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, config: &Config) -> Self {
        Self {
            analysis: services.analysis,
            resolver: ModelResolver::new(services.catalog, config),
            prompt_options: PromptOptions {
                price_multiplier: config.price_multiplier,
                ..PromptOptions::default()
            },
        }
    }

    /// Construct an app talking to Gemini. Both clients share one connection
    /// pool.
    pub fn new(config: &Config) -> Self {
        let http_client = reqwest::Client::new();
        info!("Gemini endpoint: {}", config.base_url);

        Self::with_services(
            AppServices {
                analysis: Box::new(GeminiAnalysisClient::new_with_client(
                    config,
                    http_client.clone(),
                )),
                catalog: Box::new(GeminiModelCatalog::new_with_client(config, http_client)),
            },
            config,
        )
    }

    pub fn prompt_options(&self) -> &PromptOptions {
        &self.prompt_options
    }

    /// Read an image file and analyze it.
    pub async fn analyze_file(
        &self,
        path: &Path,
        requested_model: Option<&str>,
    ) -> Result<AnalysisReport> {
        let image = tokio::fs::read(path).await?;
        info!("Read {} ({} bytes)", path.display(), image.len());
        self.analyze_image(image, requested_model).await
    }

    /// Analyze one label photo: resolve model, compose prompt, make exactly one
    /// remote call, interpret the reply.
    pub async fn analyze_image(
        &self,
        image: Vec<u8>,
        requested_model: Option<&str>,
    ) -> Result<AnalysisReport> {
        if image.is_empty() {
            return Err(Error::InvalidImage("image is empty".to_string()));
        }

        let model = self.resolver.resolve(requested_model).await?;
        let prompt = compose_analysis_prompt(&self.prompt_options);
        let request = AnalysisRequest::new(image, prompt, model.id);

        info!(
            request_id = %request.request_id,
            "Analyzing label with {}",
            request.model_id
        );

        let raw_text = self.analysis.analyze(&request).await.map_err(|e| {
            error!(request_id = %request.request_id, "Analysis failed: {}", e);
            e
        })?;

        let result = interpret(&raw_text);
        if result.is_degraded() {
            warn!(
                request_id = %request.request_id,
                "Reply did not match the expected layout; showing raw text"
            );
        }

        Ok(AnalysisReport {
            request_id: request.request_id,
            model_id: request.model_id,
            analyzed_at: Utc::now(),
            result,
        })
    }

    /// List models visible to the credential. `refresh` bypasses the cache.
    pub async fn list_models(&self, refresh: bool) -> Result<ModelOverview> {
        let listing = if refresh {
            self.resolver.refresh().await?
        } else {
            self.resolver.listing().await?
        };

        Ok(ModelOverview {
            default_available: listing.contains_capable(DEFAULT_MODEL),
            models: listing.models().to_vec(),
        })
    }
}
