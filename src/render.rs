//! Terminal rendering of an analysis.
//!
//! Layout: header, metric tiles (rating and the two price estimates), one
//! 1-5 bar per taste attribute, then the notes. A degraded result is shown
//! as the raw reply only.

use crate::models::{AnalysisReport, AnalysisResult, TasteAttribute, WineField};
use std::fmt::Write as _;

const BAR_WIDTH: u8 = 5;
const MISSING: &str = "-";

pub fn render_text(report: &AnalysisReport) -> String {
    let result = &report.result;
    let mut out = String::new();

    if result.is_degraded() || (result.fields().is_empty() && result.taste_profile().is_empty())
    {
        out.push_str(result.review_text());
        out.push('\n');
        return out;
    }

    render_header(&mut out, result);
    render_metrics(&mut out, result);
    render_taste(&mut out, result);

    out.push_str("\n[리뷰]\n");
    out.push_str(result.review_text());
    out.push('\n');
    out
}

fn render_header(out: &mut String, result: &AnalysisResult) {
    let name = result.field(WineField::Name).unwrap_or("이름 미상");
    let _ = writeln!(out, "🍷 {}", name);

    if let Some(english) = result.field(WineField::EnglishName) {
        let _ = writeln!(out, "   {}", english);
    }

    let details: Vec<&str> = [WineField::Region, WineField::Grape, WineField::Vintage]
        .into_iter()
        .filter_map(|f| result.field(f))
        .collect();
    if !details.is_empty() {
        let _ = writeln!(out, "   {}", details.join(" · "));
    }
    out.push('\n');
}

fn render_metrics(out: &mut String, result: &AnalysisResult) {
    let rating = result
        .field(WineField::Rating)
        .map(|r| format!("{}점", r))
        .unwrap_or_else(|| MISSING.to_string());
    let usd = result
        .field(WineField::PriceUsd)
        .map(|p| format!("${}", p.trim_start_matches('$')))
        .unwrap_or_else(|| MISSING.to_string());
    let krw = result
        .field(WineField::PriceKrw)
        .map(|p| format!("{}원", p.trim_end_matches('원')))
        .unwrap_or_else(|| MISSING.to_string());

    let _ = writeln!(
        out,
        "{} {}  |  {} {}  |  {} {}",
        WineField::Rating.label(),
        rating,
        WineField::PriceUsd.label(),
        usd,
        WineField::PriceKrw.label(),
        krw
    );
    out.push('\n');
}

fn render_taste(out: &mut String, result: &AnalysisResult) {
    if result.taste_profile().is_empty() {
        return;
    }

    for attribute in TasteAttribute::ALL {
        match result.taste(attribute) {
            Some(score) => {
                let _ = writeln!(out, "{}  {} {}/5", attribute.label(), bar(score), score);
            }
            None => {
                let _ = writeln!(out, "{}  {}", attribute.label(), MISSING);
            }
        }
    }
}

/// Five-cell bar. The stored score is never altered; only the drawing is
/// clamped to 1..=5.
pub fn bar(score: i64) -> String {
    let filled = score.clamp(1, i64::from(BAR_WIDTH)) as u8;
    (0..BAR_WIDTH)
        .map(|i| if i < filled { '●' } else { '○' })
        .collect()
}
