//! Records passed between the extraction stages.

use serde::Serialize;

/// One product row read from the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductReference {
    pub display_name: String,
    pub source_url: String,
    /// 1-based row number in the sheet.
    pub row_number: usize,
}

/// A single parsed review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    /// Parsed star rating; `0.0` when the label could not be read.
    pub numeric_rating: f64,
    /// `[<rating label>] <body>`, body cut to the display limit.
    pub display_text: String,
}

/// The highest- and lowest-rated review of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    pub best: ReviewRecord,
    pub worst: ReviewRecord,
}

/// Outcome of ranking: either both extremes or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    extremes: Option<Extremes>,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self { extremes: None }
    }

    pub fn new(best: ReviewRecord, worst: ReviewRecord) -> Self {
        Self {
            extremes: Some(Extremes { best, worst }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extremes.is_none()
    }

    pub fn best(&self) -> Option<&ReviewRecord> {
        self.extremes.as_ref().map(|e| &e.best)
    }

    pub fn worst(&self) -> Option<&ReviewRecord> {
        self.extremes.as_ref().map(|e| &e.worst)
    }

    pub fn extremes(&self) -> Option<&Extremes> {
        self.extremes.as_ref()
    }

    pub fn into_extremes(self) -> Option<Extremes> {
        self.extremes
    }
}
