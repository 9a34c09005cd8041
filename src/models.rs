//! Data models and structures
//!
//! Defines the per-request shapes (request, interpreted result, report), the
//! model catalog entries returned by the listing call, and the process-wide
//! configuration.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PRICE_MULTIPLIER: f64 = 1.8;
pub const DEFAULT_MODEL_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Capability a model must advertise to accept an image plus text prompt and
/// answer with text.
pub const GENERATE_CONTENT: &str = "generateContent";

/// Identity, rating and price lines scraped from the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WineField {
    Name,
    EnglishName,
    Region,
    Grape,
    Vintage,
    Rating,
    PriceUsd,
    PriceKrw,
}

impl WineField {
    pub const ALL: [WineField; 8] = [
        WineField::Name,
        WineField::EnglishName,
        WineField::Region,
        WineField::Grape,
        WineField::Vintage,
        WineField::Rating,
        WineField::PriceUsd,
        WineField::PriceKrw,
    ];

    /// Line prefix the model is asked to emit for this field.
    pub fn prefix(self) -> &'static str {
        match self {
            WineField::Name => "이름:",
            WineField::EnglishName => "영문:",
            WineField::Region => "생산지:",
            WineField::Grape => "품종:",
            WineField::Vintage => "빈티지:",
            WineField::Rating => "평점:",
            WineField::PriceUsd => "미국:",
            WineField::PriceKrw => "한국:",
        }
    }

    pub fn label(self) -> &'static str {
        self.prefix().trim_end_matches(':')
    }
}

/// The four tasting scores, asked for on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TasteAttribute {
    Body,
    Tannin,
    Acidity,
    Sweetness,
}

impl TasteAttribute {
    pub const ALL: [TasteAttribute; 4] = [
        TasteAttribute::Body,
        TasteAttribute::Tannin,
        TasteAttribute::Acidity,
        TasteAttribute::Sweetness,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            TasteAttribute::Body => "바디:",
            TasteAttribute::Tannin => "타닌:",
            TasteAttribute::Acidity => "산도:",
            TasteAttribute::Sweetness => "당도:",
        }
    }

    pub fn label(self) -> &'static str {
        self.prefix().trim_end_matches(':')
    }
}

/// How the reply was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Labelled lines were scraped; any subset of fields may be present.
    Structured,
    /// Scraping failed; only the raw reply is available.
    Degraded,
}

/// One image submission. Built fresh per call and dropped once it returns.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub request_id: Uuid,
    pub image: Vec<u8>,
    pub prompt_text: String,
    pub model_id: String,
}

impl AnalysisRequest {
    pub fn new(image: Vec<u8>, prompt_text: String, model_id: String) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            image,
            prompt_text,
            model_id,
        }
    }
}

/// Interpreted model reply.
///
/// Every field is optional. A degraded result never carries fields or taste
/// scores, and its review text is the whole raw reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    raw_text: String,
    outcome: Extraction,
    fields: BTreeMap<WineField, String>,
    taste_profile: BTreeMap<TasteAttribute, i64>,
    review_text: String,
}

impl AnalysisResult {
    pub(crate) fn structured(
        raw_text: String,
        fields: BTreeMap<WineField, String>,
        taste_profile: BTreeMap<TasteAttribute, i64>,
        review_text: String,
    ) -> Self {
        Self {
            raw_text,
            outcome: Extraction::Structured,
            fields,
            taste_profile,
            review_text,
        }
    }

    pub(crate) fn degraded(raw_text: String) -> Self {
        Self {
            review_text: raw_text.clone(),
            raw_text,
            outcome: Extraction::Degraded,
            fields: BTreeMap::new(),
            taste_profile: BTreeMap::new(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn outcome(&self) -> Extraction {
        self.outcome
    }

    pub fn is_degraded(&self) -> bool {
        self.outcome == Extraction::Degraded
    }

    pub fn field(&self, field: WineField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<WineField, String> {
        &self.fields
    }

    pub fn taste(&self, attribute: TasteAttribute) -> Option<i64> {
        self.taste_profile.get(&attribute).copied()
    }

    pub fn taste_profile(&self) -> &BTreeMap<TasteAttribute, i64> {
        &self.taste_profile
    }

    pub fn review_text(&self) -> &str {
        &self.review_text
    }
}

/// What the CLI prints for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub model_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub result: AnalysisResult,
}

/// One entry from the model listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Bare model ID, without the `models/` prefix.
    pub id: String,
    pub display_name: Option<String>,
    pub capabilities: BTreeSet<String>,
}

impl ModelInfo {
    pub fn new<I, S>(id: &str, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: strip_model_prefix(id).to_string(),
            display_name: None,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn accepts_image_and_text(&self) -> bool {
        self.supports(GENERATE_CONTENT)
    }
}

pub fn strip_model_prefix(id: &str) -> &str {
    id.strip_prefix("models/").unwrap_or(id)
}

/// API credential. Never empty; redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(Error::Config("API key is empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    pub model: Option<String>,
    pub base_url: String,
    pub price_multiplier: f64,
    pub model_cache_ttl: Duration,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            model: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            price_multiplier: DEFAULT_PRICE_MULTIPLIER,
            model_cache_ttl: DEFAULT_MODEL_CACHE_TTL,
            request_timeout: None,
        }
    }

    /// Load `.env` (if present) and then read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_key = lookup("GOOGLE_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup("GEMINI_API_KEY"))
            .ok_or_else(|| {
                Error::Config("GOOGLE_API_KEY not set (GEMINI_API_KEY also accepted)".to_string())
            })?;

        let mut config = Self::new(ApiKey::new(raw_key)?);

        config.model = lookup("GEMINI_MODEL")
            .map(|m| strip_model_prefix(m.trim()).to_string())
            .filter(|m| !m.is_empty());

        if let Some(base_url) = lookup("GEMINI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("WINE_PRICE_MULTIPLIER") {
            let multiplier: f64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("WINE_PRICE_MULTIPLIER is not a number: '{}'", raw))
            })?;
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(Error::Config(format!(
                    "WINE_PRICE_MULTIPLIER must be positive (got {})",
                    multiplier
                )));
            }
            config.price_multiplier = multiplier;
        }

        if let Some(secs) = parse_secs(&lookup, "MODEL_CACHE_TTL_SECS")? {
            config.model_cache_ttl = secs;
        }

        config.request_timeout = parse_secs(&lookup, "REQUEST_TIMEOUT_SECS")?;

        Ok(config)
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| Error::Config(format!("{} is not a whole number: '{}'", key, raw)))
        })
        .transpose()
}
