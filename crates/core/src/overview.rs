//! Presentation-level summary.

use crate::error::ResolutionWarning;
use crate::types::{Presentation, Section, SlideSize};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSummary {
    pub slide_number: usize,
    pub title: Option<String>,
    pub layout_name: Option<String>,
    pub section: Option<String>,
    pub has_tables: bool,
    pub has_notes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationOverview {
    pub slide_count: usize,
    pub slide_size: Option<SlideSize>,
    pub sections: Vec<Section>,
    pub slides: Vec<SlideSummary>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Summarise a built presentation.
pub fn overview(presentation: &Presentation) -> PresentationOverview {
    PresentationOverview {
        slide_count: presentation.slide_count(),
        slide_size: presentation.slide_size,
        sections: presentation.sections.clone(),
        slides: presentation
            .slides
            .iter()
            .map(|s| SlideSummary {
                slide_number: s.number,
                title: s.title.clone(),
                layout_name: s.layout_name.clone(),
                section: s.section.clone(),
                has_tables: !s.tables.is_empty(),
                has_notes: !s.notes_text().trim().is_empty(),
            })
            .collect(),
        warnings: presentation.warnings.clone(),
    }
}
