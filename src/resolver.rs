//! Model Resolver
//!
//! Picks the model identifier for a session from an explicit request, the
//! configured default, or the service's own listing. The listing is cached
//! for a configurable time and can be refreshed on demand.

use crate::ai::ModelCatalog;
use crate::models::{strip_model_prefix, Config, ModelInfo};
use crate::{Error, Result};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Used when nothing else names a model, and when the listing has no
/// capable entries.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Snapshot of one listing call. Cheap to clone; iterate as often as needed.
#[derive(Debug, Clone)]
pub struct ModelListing {
    models: Arc<[ModelInfo]>,
    fetched_at: Instant,
}

impl ModelListing {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self {
            models: models.into(),
            fetched_at: Instant::now(),
        }
    }

    /// Every listed model, capable or not.
    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Lazily yields the IDs of models that accept image plus text input.
    pub fn capable_ids(&self) -> CapableIds<'_> {
        CapableIds {
            inner: self.models.iter(),
        }
    }

    pub fn contains_capable(&self, id: &str) -> bool {
        let id = strip_model_prefix(id);
        self.capable_ids().any(|candidate| candidate == id)
    }

    pub fn has_capable(&self) -> bool {
        self.capable_ids().next().is_some()
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

pub struct CapableIds<'a> {
    inner: std::slice::Iter<'a, ModelInfo>,
}

impl<'a> Iterator for CapableIds<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|m| m.accepts_image_and_text())
            .map(|m| m.id.as_str())
    }
}

/// Time-bounded cache for the model listing.
///
/// Refreshes are idempotent, so two callers racing on an expired entry may
/// both fetch; the last store wins.
pub struct ModelCache {
    ttl: Duration,
    entry: RwLock<Option<ModelListing>>,
}

impl ModelCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// The cached listing if it is younger than the TTL.
    pub fn get(&self) -> Option<ModelListing> {
        let guard = self.entry.read().unwrap_or_else(|p| p.into_inner());
        guard
            .as_ref()
            .filter(|listing| listing.age() < self.ttl)
            .cloned()
    }

    pub fn store(&self, listing: ModelListing) {
        *self.entry.write().unwrap_or_else(|p| p.into_inner()) = Some(listing);
    }

    pub fn invalidate(&self) {
        *self.entry.write().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

/// Where the resolved identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Named by the caller for this request.
    Requested,
    /// `GEMINI_MODEL` from configuration.
    Configured,
    /// [`DEFAULT_MODEL`], found in the listing.
    PreferredDefault,
    /// First capable model in the listing.
    FirstAvailable,
    /// [`DEFAULT_MODEL`], used blind because the listing had no capable model.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub id: String,
    pub source: ModelSource,
}

pub struct ModelResolver {
    catalog: Box<dyn ModelCatalog>,
    cache: ModelCache,
    configured: Option<String>,
}

impl ModelResolver {
    pub fn new(catalog: Box<dyn ModelCatalog>, config: &Config) -> Self {
        Self {
            catalog,
            cache: ModelCache::new(config.model_cache_ttl),
            configured: config.model.clone(),
        }
    }

    /// Cached listing, fetched when missing or expired.
    pub async fn listing(&self) -> Result<ModelListing> {
        if let Some(listing) = self.cache.get() {
            debug!("Using cached model listing ({:?} old)", listing.age());
            return Ok(listing);
        }
        self.fetch().await
    }

    /// Drop the cached listing and fetch a new one.
    pub async fn refresh(&self) -> Result<ModelListing> {
        self.cache.invalidate();
        self.fetch().await
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    async fn fetch(&self) -> Result<ModelListing> {
        let listing = ModelListing::new(self.catalog.list_models().await?);
        self.cache.store(listing.clone());
        Ok(listing)
    }

    /// Decide which model to use.
    ///
    /// Precedence: `requested`, then the configured model, then
    /// [`DEFAULT_MODEL`] if listed, then the first capable listed model, then
    /// [`DEFAULT_MODEL`] unconditionally. A named model that is missing from a
    /// non-empty capable listing is a configuration error.
    pub async fn resolve(&self, requested: Option<&str>) -> Result<ResolvedModel> {
        let listing = self.listing().await?;

        let named = requested
            .map(|id| (id, ModelSource::Requested))
            .or_else(|| {
                self.configured
                    .as_deref()
                    .map(|id| (id, ModelSource::Configured))
            });

        if let Some((id, source)) = named {
            let id = strip_model_prefix(id.trim());
            if id.is_empty() {
                return Err(Error::Config("model name is empty".to_string()));
            }
            if listing.has_capable() && !listing.contains_capable(id) {
                let available: Vec<&str> = listing.capable_ids().collect();
                return Err(Error::Config(format!(
                    "model '{}' is not available for this API key (available: {})",
                    id,
                    available.join(", ")
                )));
            }
            if !listing.has_capable() {
                warn!("Model listing is empty; using '{}' unchecked", id);
            }
            info!("Using model {} ({:?})", id, source);
            return Ok(ResolvedModel {
                id: id.to_string(),
                source,
            });
        }

        let resolved = if listing.contains_capable(DEFAULT_MODEL) {
            ResolvedModel {
                id: DEFAULT_MODEL.to_string(),
                source: ModelSource::PreferredDefault,
            }
        } else if let Some(first) = listing.capable_ids().next() {
            ResolvedModel {
                id: first.to_string(),
                source: ModelSource::FirstAvailable,
            }
        } else {
            warn!(
                "No listed model accepts image input; falling back to {}",
                DEFAULT_MODEL
            );
            ResolvedModel {
                id: DEFAULT_MODEL.to_string(),
                source: ModelSource::Fallback,
            }
        };

        info!("Using model {} ({:?})", resolved.id, resolved.source);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockModelCatalog;
    use crate::models::ApiKey;

    fn config() -> Config {
        Config::new(ApiKey::new("k").unwrap())
    }

    fn vision(id: &str) -> ModelInfo {
        ModelInfo::new(id, ["generateContent", "countTokens"])
    }

    fn embedding(id: &str) -> ModelInfo {
        ModelInfo::new(id, ["embedContent"])
    }

    fn resolver_with(catalog: MockModelCatalog, config: &Config) -> ModelResolver {
        ModelResolver::new(Box::new(catalog), config)
    }

    #[test]
    fn test_capable_ids_is_lazy_filtered_and_restartable() {
        let listing = ModelListing::new(vec![
            embedding("models/text-embedding-004"),
            vision("models/gemini-1.5-pro"),
            vision("models/gemini-1.5-flash"),
        ]);

        let first: Vec<&str> = listing.capable_ids().collect();
        let second: Vec<&str> = listing.capable_ids().collect();
        assert_eq!(first, vec!["gemini-1.5-pro", "gemini-1.5-flash"]);
        assert_eq!(first, second);
        assert!(listing.contains_capable("models/gemini-1.5-flash"));
        assert!(!listing.contains_capable("text-embedding-004"));
    }

    #[test]
    fn test_cache_expires_and_invalidates() {
        let cache = ModelCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());

        cache.store(ModelListing::new(vec![vision("a")]));
        assert!(cache.get().is_some());

        cache.invalidate();
        assert!(cache.get().is_none());

        let expired = ModelCache::new(Duration::ZERO);
        expired.store(ModelListing::new(vec![vision("a")]));
        assert!(expired.get().is_none());
    }

    #[tokio::test]
    async fn test_prefers_default_model_when_listed() {
        let catalog = MockModelCatalog::new()
            .with_model(vision("gemini-1.5-pro"))
            .with_model(vision(DEFAULT_MODEL));
        let resolver = resolver_with(catalog, &config());

        let resolved = resolver.resolve(None).await.unwrap();
        assert_eq!(resolved.id, DEFAULT_MODEL);
        assert_eq!(resolved.source, ModelSource::PreferredDefault);
    }

    #[tokio::test]
    async fn test_first_capable_model_when_default_missing() {
        let catalog = MockModelCatalog::new()
            .with_model(embedding("text-embedding-004"))
            .with_model(vision("gemini-2.0-flash"));
        let resolver = resolver_with(catalog, &config());

        let resolved = resolver.resolve(None).await.unwrap();
        assert_eq!(resolved.id, "gemini-2.0-flash");
        assert_eq!(resolved.source, ModelSource::FirstAvailable);
    }

    #[tokio::test]
    async fn test_empty_listing_falls_back_to_default() {
        let catalog = MockModelCatalog::new().with_model(embedding("text-embedding-004"));
        let resolver = resolver_with(catalog, &config());

        let resolved = resolver.resolve(None).await.unwrap();
        assert_eq!(resolved.id, DEFAULT_MODEL);
        assert_eq!(resolved.source, ModelSource::Fallback);
    }

    #[tokio::test]
    async fn test_requested_model_beats_configured() {
        let mut config = config();
        config.model = Some("gemini-1.5-pro".to_string());
        let catalog = MockModelCatalog::new()
            .with_model(vision("gemini-1.5-pro"))
            .with_model(vision("gemini-2.0-flash"));
        let resolver = resolver_with(catalog, &config);

        let resolved = resolver.resolve(Some("models/gemini-2.0-flash")).await.unwrap();
        assert_eq!(resolved.id, "gemini-2.0-flash");
        assert_eq!(resolved.source, ModelSource::Requested);

        let resolved = resolver.resolve(None).await.unwrap();
        assert_eq!(resolved.id, "gemini-1.5-pro");
        assert_eq!(resolved.source, ModelSource::Configured);
    }

    #[tokio::test]
    async fn test_unlisted_requested_model_is_config_error() {
        let catalog = MockModelCatalog::new().with_model(vision("gemini-2.0-flash"));
        let resolver = resolver_with(catalog, &config());

        let err = resolver.resolve(Some("gemini-1.5-flash")).await.unwrap_err();
        match err {
            Error::Config(message) => assert!(message.contains("gemini-2.0-flash")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unlisted_configured_model_is_config_error() {
        let mut config = config();
        config.model = Some("gemini-1.5-flash".to_string());
        let catalog = MockModelCatalog::new().with_model(vision("gemini-2.0-flash"));
        let resolver = resolver_with(catalog, &config);

        let err = resolver.resolve(None).await.unwrap_err();
        match err {
            Error::Config(message) => {
                assert!(message.contains("gemini-1.5-flash"));
                assert!(message.contains("gemini-2.0-flash"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_named_model_used_unchecked_when_listing_empty() {
        let mut config = config();
        config.model = Some("gemini-1.5-pro".to_string());
        let catalog = MockModelCatalog::new().with_model(embedding("text-embedding-004"));
        let resolver = resolver_with(catalog, &config);

        let resolved = resolver.resolve(Some("gemini-exp")).await.unwrap();
        assert_eq!(resolved.id, "gemini-exp");
        assert_eq!(resolved.source, ModelSource::Requested);

        let resolved = resolver.resolve(None).await.unwrap();
        assert_eq!(resolved.id, "gemini-1.5-pro");
        assert_eq!(resolved.source, ModelSource::Configured);
    }

    #[tokio::test]
    async fn test_listing_failure_is_reported_not_retried() {
        let catalog = MockModelCatalog::new().failing_with("API key not valid");
        let calls = catalog.clone();
        let resolver = resolver_with(catalog, &config());

        let err = resolver.resolve(None).await.unwrap_err();
        assert!(matches!(err, Error::RemoteInvocation(_)));
        assert_eq!(calls.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_refresh() {
        let catalog = MockModelCatalog::new().with_model(vision(DEFAULT_MODEL));
        let calls = catalog.clone();
        let resolver = resolver_with(catalog, &config());

        resolver.resolve(None).await.unwrap();
        resolver.resolve(None).await.unwrap();
        assert_eq!(calls.get_call_count(), 1);

        resolver.refresh().await.unwrap();
        assert_eq!(calls.get_call_count(), 2);

        resolver.invalidate();
        resolver.listing().await.unwrap();
        assert_eq!(calls.get_call_count(), 3);
    }
}
