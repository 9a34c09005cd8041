//! Prompt Composer
//!
//! The instruction text is a static template. Pricing policy (tax/margin
//! multiplier, exchange rate) is substituted into it as literal text.

use crate::models::DEFAULT_PRICE_MULTIPLIER;

pub const WINE_ANALYSIS: &str = include_str!("../data/prompts/wine_analysis.txt");

/// KRW per USD quoted in the prompt.
pub const DEFAULT_EXCHANGE_RATE: u32 = 1400;

/// Section marker that introduces the free-text recommendation.
pub const REVIEW_MARKER: &str = "[리뷰]";

#[derive(Debug, Clone, PartialEq)]
pub struct PromptOptions {
    pub price_multiplier: f64,
    pub exchange_rate: u32,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            price_multiplier: DEFAULT_PRICE_MULTIPLIER,
            exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }
}

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

pub fn compose_analysis_prompt(options: &PromptOptions) -> String {
    let multiplier = format_multiplier(options.price_multiplier);
    let exchange_rate = options.exchange_rate.to_string();

    render(
        WINE_ANALYSIS,
        &[
            ("multiplier", &multiplier),
            ("exchange_rate", &exchange_rate),
        ],
    )
}

// 2.0 -> "2", 1.8 -> "1.8"
fn format_multiplier(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
