//! Character-accurate formatting spans over text elements.
//!
//! Runs are walked in document order with a running codepoint offset.
//! Consecutive runs that carry the requested kind with the same value are
//! coalesced into one segment, so segments of a kind never overlap and are
//! maximal.

use crate::error::ValidationError;
use crate::types::{Hyperlink, LinkType, Presentation, Run, TextElement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A formatting property that can be extracted as segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingKind {
    Bold,
    Italic,
    Underlined,
    Highlighted,
    Strikethrough,
    Hyperlinks,
    FontSizes,
    FontColors,
}

impl FormattingKind {
    /// Every supported kind, in reporting order.
    pub const ALL: [FormattingKind; 8] = [
        FormattingKind::Bold,
        FormattingKind::Italic,
        FormattingKind::Underlined,
        FormattingKind::Highlighted,
        FormattingKind::Strikethrough,
        FormattingKind::Hyperlinks,
        FormattingKind::FontSizes,
        FormattingKind::FontColors,
    ];

    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormattingKind::Bold => "bold",
            FormattingKind::Italic => "italic",
            FormattingKind::Underlined => "underlined",
            FormattingKind::Highlighted => "highlighted",
            FormattingKind::Strikethrough => "strikethrough",
            FormattingKind::Hyperlinks => "hyperlinks",
            FormattingKind::FontSizes => "font_sizes",
            FormattingKind::FontColors => "font_colors",
        }
    }

    fn allowed_names() -> String {
        Self::ALL
            .iter()
            .map(FormattingKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FormattingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormattingKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownFormattingKind {
                kind: s.to_string(),
                allowed: Self::allowed_names(),
            })
    }
}

/// Link details attached to a hyperlink segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperlinkTarget {
    /// Resolved URL, or `null` when the relationship could not be resolved.
    pub url: Option<String>,
    pub link_type: LinkType,
}

/// A maximal span of `complete_text` carrying one formatting kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedSegment {
    pub text: String,
    /// Codepoint offset of the first character.
    pub start: usize,
    /// Codepoint offset one past the last character.
    pub end: usize,
    pub kind: FormattingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<HyperlinkTarget>,
}

/// What a run contributes for one kind; equal keys on adjacent runs merge.
#[derive(Debug, Clone, PartialEq)]
enum SegmentKey<'a> {
    Flag,
    FontSize(f64),
    FontColor(&'a str),
    Link(LinkKey<'a>),
}

/// Links merge on where they point, not on which relationship names the
/// target. Unresolved links fall back to the relationship id.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LinkKey<'a> {
    target: Option<&'a str>,
    unresolved_rel: Option<&'a str>,
    link_type: LinkType,
}

impl<'a> LinkKey<'a> {
    fn of(link: &'a Hyperlink) -> Self {
        Self {
            target: link.target.as_deref(),
            unresolved_rel: link
                .target
                .is_none()
                .then(|| link.rel_id.as_deref())
                .flatten(),
            link_type: link.link_type,
        }
    }
}

fn segment_key(run: &Run, kind: FormattingKind) -> Option<SegmentKey<'_>> {
    let f = &run.formatting;
    match kind {
        FormattingKind::Bold => f.bold.then_some(SegmentKey::Flag),
        FormattingKind::Italic => f.italic.then_some(SegmentKey::Flag),
        FormattingKind::Underlined => f.underline.then_some(SegmentKey::Flag),
        FormattingKind::Highlighted => f.highlighted.then_some(SegmentKey::Flag),
        FormattingKind::Strikethrough => f.strikethrough.then_some(SegmentKey::Flag),
        FormattingKind::Hyperlinks => f.hyperlink.as_ref().map(|h| SegmentKey::Link(LinkKey::of(h))),
        FormattingKind::FontSizes => f.font_size.map(SegmentKey::FontSize),
        FormattingKind::FontColors => f.font_color.as_deref().map(SegmentKey::FontColor),
    }
}

struct OpenSegment<'a> {
    key: SegmentKey<'a>,
    text: String,
    start: usize,
    end: usize,
}

impl OpenSegment<'_> {
    fn close(self, kind: FormattingKind) -> FormattedSegment {
        let mut segment = FormattedSegment {
            text: self.text,
            start: self.start,
            end: self.end,
            kind,
            font_size: None,
            color: None,
            hyperlink: None,
        };
        match self.key {
            SegmentKey::Flag => {}
            SegmentKey::FontSize(size) => segment.font_size = Some(size),
            SegmentKey::FontColor(color) => segment.color = Some(color.to_string()),
            SegmentKey::Link(link) => {
                segment.hyperlink = Some(HyperlinkTarget {
                    url: link.target.map(str::to_string),
                    link_type: link.link_type,
                })
            }
        }
        segment
    }
}

/// Compute `(complete_text, segments)` for one element and kind.
pub fn extract_segments(element: &TextElement, kind: FormattingKind) -> (String, Vec<FormattedSegment>) {
    let mut complete_text = String::new();
    let mut segments = Vec::new();
    let mut open: Option<OpenSegment<'_>> = None;
    let mut offset = 0;

    for run in &element.runs {
        complete_text.push_str(&run.text);
        let len = run.char_len();
        if len == 0 {
            continue;
        }

        match segment_key(run, kind) {
            Some(key) => match open.as_mut() {
                Some(current) if current.key == key && current.end == offset => {
                    current.text.push_str(&run.text);
                    current.end += len;
                }
                _ => {
                    if let Some(done) = open.take() {
                        segments.push(done.close(kind));
                    }
                    open = Some(OpenSegment {
                        key,
                        text: run.text.clone(),
                        start: offset,
                        end: offset + len,
                    });
                }
            },
            None => {
                if let Some(done) = open.take() {
                    segments.push(done.close(kind));
                }
            }
        }

        offset += len;
    }

    if let Some(done) = open.take() {
        segments.push(done.close(kind));
    }

    (complete_text, segments)
}

/// Segments of several kinds for one element, omitting kinds with no segments.
pub fn segments_by_kind(
    element: &TextElement,
    kinds: &[FormattingKind],
) -> BTreeMap<FormattingKind, Vec<FormattedSegment>> {
    kinds
        .iter()
        .filter_map(|&kind| {
            let (_, segments) = extract_segments(element, kind);
            (!segments.is_empty()).then_some((kind, segments))
        })
        .collect()
}

/// Formatting found in one text element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementFormatting {
    pub element_index: usize,
    pub complete_text: String,
    pub segments: Vec<FormattedSegment>,
}

/// Formatting found on one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideFormatting {
    pub slide_number: usize,
    pub title: Option<String>,
    /// Only elements with at least one segment.
    pub elements: Vec<ElementFormatting>,
}

impl SlideFormatting {
    fn segment_count(&self) -> usize {
        self.elements.iter().map(|e| e.segments.len()).sum()
    }
}

/// Totals for a formatting extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FormattingSummary {
    pub total_slides_analyzed: usize,
    pub slides_with_formatting: usize,
    pub total_formatted_segments: usize,
}

/// Result of extracting one formatting kind across slides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattingReport {
    pub formatting_type: FormattingKind,
    pub summary: FormattingSummary,
    pub results_by_slide: Vec<SlideFormatting>,
}

/// Extract one formatting kind from the given slides.
///
/// `slides` should come from a resolved slide selection.
pub fn extract_formatting(
    presentation: &Presentation,
    slides: &[usize],
    kind: FormattingKind,
) -> FormattingReport {
    let mut summary = FormattingSummary::default();
    let mut results_by_slide = Vec::new();

    for slide in presentation.slides_in(slides) {
        summary.total_slides_analyzed += 1;

        let elements: Vec<ElementFormatting> = slide
            .text_elements
            .iter()
            .enumerate()
            .filter_map(|(element_index, element)| {
                let (complete_text, segments) = extract_segments(element, kind);
                (!segments.is_empty()).then_some(ElementFormatting {
                    element_index,
                    complete_text,
                    segments,
                })
            })
            .collect();

        let result = SlideFormatting {
            slide_number: slide.number,
            title: slide.title.clone(),
            elements,
        };

        let count = result.segment_count();
        if count > 0 {
            summary.slides_with_formatting += 1;
            summary.total_formatted_segments += count;
        }
        results_by_slide.push(result);
    }

    log::debug!(
        "Extracted {} {} segments from {} slides",
        summary.total_formatted_segments,
        kind,
        summary.total_slides_analyzed
    );

    FormattingReport {
        formatting_type: kind,
        summary,
        results_by_slide,
    }
}

/// Overview of all formatting in use on a set of slides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattingAnalysis {
    pub slides_analyzed: usize,
    /// Segment count per kind; every kind is present.
    pub segment_counts: BTreeMap<FormattingKind, usize>,
    /// Distinct explicit font sizes, ascending.
    pub font_sizes: Vec<f64>,
    /// Distinct explicit font colours, sorted.
    pub font_colors: Vec<String>,
}

/// Count segments of every kind and collect the sizes and colours in use.
pub fn analyze_formatting(presentation: &Presentation, slides: &[usize]) -> FormattingAnalysis {
    let mut segment_counts: BTreeMap<FormattingKind, usize> =
        FormattingKind::ALL.iter().map(|&k| (k, 0)).collect();
    let mut font_sizes: Vec<f64> = Vec::new();
    let mut font_colors: Vec<String> = Vec::new();
    let mut slides_analyzed = 0;

    for slide in presentation.slides_in(slides) {
        slides_analyzed += 1;
        for element in &slide.text_elements {
            for (kind, segments) in segments_by_kind(element, &FormattingKind::ALL) {
                *segment_counts.entry(kind).or_default() += segments.len();
            }
            for run in element.runs.iter().filter(|r| !r.text.is_empty()) {
                if let Some(size) = run.formatting.font_size {
                    if !font_sizes.contains(&size) {
                        font_sizes.push(size);
                    }
                }
                if let Some(color) = &run.formatting.font_color {
                    if !font_colors.contains(color) {
                        font_colors.push(color.clone());
                    }
                }
            }
        }
    }

    font_sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    font_colors.sort();

    FormattingAnalysis {
        slides_analyzed,
        segment_counts,
        font_sizes,
        font_colors,
    }
}
