//! Wine label analyzer - photograph a label, get a tasting summary
//!
//! Sends the photo and a fixed Korean-language instruction to a hosted Gemini
//! model, then scrapes the labelled lines of the reply into fields, a 1-5
//! taste profile, and a free-text review.

pub mod ai;
pub mod app;
pub mod error;
pub mod interpret;
pub mod models;
pub mod prompts;
pub mod render;
pub mod resolver;

pub use error::{Error, Result};
