use serde::Serialize;
use std::collections::BTreeMap;

use crate::detection::Detection;
use crate::palette::{self, Color};

/// Aggregate counts for a detection list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionStats {
    pub total: usize,
    /// Counts keyed by lower-cased label.
    pub by_type: BTreeMap<String, usize>,
    pub avg_confidence: f64,
}

/// One row of the per-type breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeShare {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    pub color: Color,
}

impl DetectionStats {
    pub fn from_detections<'a, I>(detections: I) -> Self
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        let mut by_type = BTreeMap::new();
        let mut total = 0;
        let mut confidence_sum = 0.0;

        for detection in detections {
            *by_type.entry(detection.label.to_lowercase()).or_insert(0) += 1;
            confidence_sum += detection.confidence;
            total += 1;
        }

        let avg_confidence = if total == 0 {
            0.0
        } else {
            confidence_sum / total as f64
        };

        Self {
            total,
            by_type,
            avg_confidence,
        }
    }

    /// Average confidence as a percentage with one decimal, e.g. `"91.3%"`.
    pub fn avg_confidence_display(&self) -> String {
        format!("{:.1}%", self.avg_confidence * 100.0)
    }

    pub fn shares(&self) -> Vec<TypeShare> {
        self.by_type
            .iter()
            .map(|(label, &count)| TypeShare {
                label: label.clone(),
                count,
                percentage: if self.total == 0 {
                    0.0
                } else {
                    count as f64 / self.total as f64 * 100.0
                },
                color: palette::color_for_label(label),
            })
            .collect()
    }

    /// Labels present, sorted, for building a filter list.
    pub fn labels(&self) -> Vec<&str> {
        self.by_type.keys().map(String::as_str).collect()
    }
}
