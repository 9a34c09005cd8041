//! Response Interpreter
//!
//! Best-effort scraping of labelled lines out of the model's free-text reply.
//! The reply has no grammar; each line is checked for known `label:`
//! substrings and the text after the line's first colon becomes the value.
//!
//! Extraction is all-or-nothing for the taste scores: if any of them is not
//! an integer the whole result degrades to the raw reply.

use crate::models::{AnalysisResult, TasteAttribute, WineField};
use crate::prompts::REVIEW_MARKER;
use std::collections::BTreeMap;

const RATING_SUFFIX: &str = "점";

#[derive(Debug, Clone, Copy)]
enum Slot {
    Field(WineField),
    Taste(TasteAttribute),
}

/// Prefixes in match order. Within one line the first entry found wins.
const SLOTS: [Slot; 12] = [
    Slot::Field(WineField::Name),
    Slot::Field(WineField::EnglishName),
    Slot::Field(WineField::Region),
    Slot::Field(WineField::Grape),
    Slot::Field(WineField::Vintage),
    Slot::Field(WineField::Rating),
    Slot::Field(WineField::PriceUsd),
    Slot::Field(WineField::PriceKrw),
    Slot::Taste(TasteAttribute::Body),
    Slot::Taste(TasteAttribute::Tannin),
    Slot::Taste(TasteAttribute::Acidity),
    Slot::Taste(TasteAttribute::Sweetness),
];

impl Slot {
    fn prefix(self) -> &'static str {
        match self {
            Slot::Field(field) => field.prefix(),
            Slot::Taste(attribute) => attribute.prefix(),
        }
    }
}

/// Interpret a raw model reply.
pub fn interpret(raw_text: &str) -> AnalysisResult {
    let mut fields = BTreeMap::new();
    let mut taste_profile = BTreeMap::new();

    for line in raw_text.lines() {
        let Some(slot) = SLOTS.iter().copied().find(|s| line.contains(s.prefix())) else {
            continue;
        };
        let value = value_after_first_colon(line);

        match slot {
            Slot::Field(WineField::Rating) => {
                fields.insert(WineField::Rating, strip_rating_suffix(value).to_string());
            }
            Slot::Field(field) => {
                fields.insert(field, value.to_string());
            }
            Slot::Taste(attribute) => match value.parse::<i64>() {
                Ok(score) => {
                    taste_profile.insert(attribute, score);
                }
                Err(_) => {
                    tracing::debug!(
                        "Taste value for {} is not an integer ('{}'); falling back to raw text",
                        attribute.label(),
                        value
                    );
                    return AnalysisResult::degraded(raw_text.to_string());
                }
            },
        }
    }

    let review_text = extract_review(raw_text).to_string();

    tracing::debug!(
        "Extracted {} fields and {} taste scores",
        fields.len(),
        taste_profile.len()
    );

    AnalysisResult::structured(raw_text.to_string(), fields, taste_profile, review_text)
}

/// Text after the first review marker, trimmed. Without a marker the whole
/// input is returned untouched.
pub fn extract_review(raw_text: &str) -> &str {
    match raw_text.find(REVIEW_MARKER) {
        Some(pos) => raw_text[pos + REVIEW_MARKER.len()..].trim(),
        None => raw_text,
    }
}

fn value_after_first_colon(line: &str) -> &str {
    line.split_once(':').map(|(_, rest)| rest).unwrap_or("").trim()
}

fn strip_rating_suffix(value: &str) -> &str {
    value
        .strip_suffix(RATING_SUFFIX)
        .map(str::trim_end)
        .unwrap_or(value)
}
