/// Canonical text rendering of an evaluation group.
///
/// The same block is the retrieval query and the evaluation data of the violation
/// prompt, so it must be byte-stable: fixed field order, one record per
/// (evaluatee, form item), and an explicit marker for every missing value.
use std::fmt::Write;

use crate::model::{EvaluationGroup, FormItem};

/// Rendered in place of a missing (or blank) field.
pub const MISSING: &str = "없음";

pub fn format_group(group: &EvaluationGroup) -> String {
    let mut records = Vec::new();
    for evaluatee in &group.evaluatees {
        for item in &evaluatee.form_items {
            records.push(format_item(&evaluatee.name, item));
        }
    }
    records.join("\n")
}

fn format_item(evaluatee: &str, item: &FormItem) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "피평가자: {}", evaluatee);
    let _ = writeln!(out, "항목: {}", item.name);
    let _ = writeln!(out, "실적: {}", text_or_missing(item.performance.as_deref()));
    let _ = writeln!(out, "점수: {}", score_or_missing(item.score));
    let _ = writeln!(out, "등급: {}", item.graded_rank().unwrap_or(MISSING));
    let _ = writeln!(out, "코멘트: {}", text_or_missing(item.comment.as_deref()));
    out
}

fn text_or_missing(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

fn score_or_missing(score: Option<f64>) -> String {
    match score {
        Some(s) if s.is_finite() => s.to_string(),
        _ => MISSING.to_string(),
    }
}
