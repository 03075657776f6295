//! Frequency statistics over `-T fields` rows.
//!
//! Each trimmed row counts as one composite value: a multi-field row is
//! compared as a whole tuple, never split per field.

use serde_json::json;
use std::collections::HashMap;

use crate::output_normalization::envelope::{
    FieldStatistics, FieldSummary, Metadata, ResultEnvelope, TopValue,
};

/// Number of ranked entries reported.
pub const TOP_VALUES: usize = 10;

/// `count / total * 100`, rounded to two decimals with exact halves going
/// to the even digit.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0 * 100.0).round_ties_even() / 100.0
}

/// Counts distinct rows and ranks them by descending count, ties keeping
/// first-seen order.
pub fn rank(lines: &[String]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for line in lines {
        match index.get(line.as_str()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(line.as_str(), counts.len());
                counts.push((line.clone(), 1));
            }
        }
    }
    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn aggregate(lines: &[String]) -> (FieldStatistics, Option<FieldSummary>) {
    let total = lines.len();
    let ranked = rank(lines);
    let unique_values = ranked.len();

    let top_values: Vec<TopValue> = ranked
        .into_iter()
        .take(TOP_VALUES)
        .map(|(value, count)| TopValue {
            value,
            count,
            percentage: percentage(count, total),
            frequency: format!("{}/{}", count, total),
        })
        .collect();

    let summary = top_values.first().map(|top| FieldSummary {
        most_common: top.value.clone(),
        most_common_count: top.count,
    });

    (
        FieldStatistics {
            total_values: total,
            unique_values,
            top_values,
        },
        summary,
    )
}

/// Builds the field-extraction envelope from the extracted rows.
pub fn field_envelope(lines: &[String], metadata: Metadata) -> ResultEnvelope {
    let lines: Vec<String> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if lines.is_empty() {
        let details = json!({
            "fields_requested": metadata.context.fields.clone().unwrap_or_default(),
            "filter_applied": metadata.context.filter.clone().unwrap_or_else(|| "none".to_string()),
        });
        return ResultEnvelope::no_data(metadata, "no matching packets found", details);
    }

    let (statistics, summary) = aggregate(&lines);
    ResultEnvelope::field_statistics(metadata, statistics, summary)
}
