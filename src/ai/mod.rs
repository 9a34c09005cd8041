//! Hosted model service integration
//!
//! Two seams: one `generateContent` call per analysis, and one listing call
//! to discover which models accept an image plus text prompt.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiAnalysisClient, GeminiModelCatalog};
pub use mock::{MockAnalysisClient, MockModelCatalog};

use crate::models::{AnalysisRequest, ModelInfo};
use crate::Result;
use async_trait::async_trait;

/// Sends one (prompt, image) pair to the model named in the request and
/// returns its text reply. Implementations must not retry.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String>;
}

/// Enumerates the models visible to the configured credential in a single
/// listing call.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}
