//! Domain types for representing an extracted presentation.
//!
//! Everything here is built once by a parser backend and read-only afterwards.
//! Re-extraction produces a whole new [`Presentation`].

use crate::error::ResolutionWarning;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// EMUs per inch in OOXML drawing units.
const EMU_PER_INCH: f64 = 914_400.0;

/// An entire presentation with its extracted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Slides in external numbering order; `slides[i].number == i + 1`.
    pub slides: Vec<Slide>,

    /// Named slide groups, in declaration order.
    pub sections: Vec<Section>,

    /// Slide dimensions, if the presentation declares them.
    pub slide_size: Option<SlideSize>,

    /// Non-fatal problems found while building.
    pub warnings: Vec<ResolutionWarning>,

    /// SHA-256 of the source bytes, lowercase hex.
    pub fingerprint: String,
}

impl Presentation {
    /// Create an empty presentation for the given content fingerprint.
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            slides: Vec::new(),
            sections: Vec::new(),
            slide_size: None,
            warnings: Vec::new(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Look up a slide by its 1-based external number.
    pub fn slide(&self, number: usize) -> Option<&Slide> {
        number
            .checked_sub(1)
            .and_then(|idx| self.slides.get(idx))
            .filter(|s| s.number == number)
    }

    /// Iterate the slides with the given numbers, skipping unknown ones.
    pub fn slides_in<'a>(&'a self, numbers: &'a [usize]) -> impl Iterator<Item = &'a Slide> + 'a {
        numbers.iter().filter_map(move |&n| self.slide(n))
    }

    /// Warnings that belong to one slide.
    pub fn warnings_for(&self, number: usize) -> impl Iterator<Item = &ResolutionWarning> {
        self.warnings
            .iter()
            .filter(move |w| w.slide_number == Some(number))
    }
}

/// A named, ordered grouping of slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub id: String,
    /// External numbers of the member slides, in section order.
    pub slide_numbers: Vec<usize>,
}

/// Slide dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width_emu: i64,
    pub height_emu: i64,
    pub width_inches: f64,
    pub height_inches: f64,
    pub aspect_ratio: f64,
}

impl SlideSize {
    /// Derive the readable measures from raw EMU values.
    pub fn from_emu(width_emu: i64, height_emu: i64) -> Self {
        let width_inches = width_emu as f64 / EMU_PER_INCH;
        let height_inches = height_emu as f64 / EMU_PER_INCH;
        let aspect_ratio = if height_inches > 0.0 {
            round2(width_inches / height_inches)
        } else {
            0.0
        };
        Self {
            width_emu,
            height_emu,
            width_inches: round2(width_inches),
            height_inches: round2(height_inches),
            aspect_ratio,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A single slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Stable 1-based external slide number.
    pub number: usize,

    /// Archive part the slide was read from.
    pub part_name: String,

    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub layout_name: Option<String>,
    pub layout_type: Option<String>,

    /// Text-bearing shapes in document order.
    pub text_elements: Vec<TextElement>,

    /// Tables in document order.
    pub tables: Vec<Table>,

    /// Speaker notes, if the slide has a notes part.
    pub notes: Option<String>,

    /// Name of the owning section, if any.
    pub section: Option<String>,

    pub object_counts: ObjectCounts,
}

impl Slide {
    /// Create a new empty slide with the given number and source part.
    pub fn new(number: usize, part_name: impl Into<String>) -> Self {
        Self {
            number,
            part_name: part_name.into(),
            title: None,
            subtitle: None,
            layout_name: None,
            layout_type: None,
            text_elements: Vec::new(),
            tables: Vec::new(),
            notes: None,
            section: None,
            object_counts: ObjectCounts::default(),
        }
    }

    /// Speaker notes, with missing notes read as empty.
    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    /// All extracted text on the slide: text elements then table cells, newline separated.
    pub fn full_text(&self) -> String {
        let mut parts: Vec<String> = self
            .text_elements
            .iter()
            .map(TextElement::complete_text)
            .filter(|t| !t.trim().is_empty())
            .collect();

        for table in &self.tables {
            for cell in table.content_cells() {
                let text = cell.text();
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
        }

        parts.join("\n")
    }
}

/// Counts of drawing objects on a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCounts {
    pub shapes: usize,
    pub text_boxes: usize,
    pub images: usize,
    pub tables: usize,
    pub charts: usize,
    pub media: usize,
    pub connectors: usize,
    pub groups: usize,
}

impl ObjectCounts {
    /// Sum of all counted objects.
    pub fn total(&self) -> usize {
        self.shapes
            + self.images
            + self.tables
            + self.charts
            + self.media
            + self.connectors
            + self.groups
    }
}

/// An ordered sequence of runs from one text body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    /// Shape name from the non-visual properties, if present.
    pub shape_name: Option<String>,

    /// Placeholder type (`title`, `body`, ...) if the shape is a placeholder.
    pub placeholder: Option<String>,

    pub runs: Vec<Run>,
}

impl TextElement {
    /// Create a text element from runs.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Concatenation of all run texts in order.
    pub fn complete_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Codepoint offset of each run within [`complete_text`](Self::complete_text).
    pub fn run_offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.runs
            .iter()
            .map(|run| {
                let start = offset;
                offset += run.char_len();
                start
            })
            .collect()
    }

    /// Whether the element contains no visible text.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

/// A span of text sharing one formatting attribute set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub formatting: RunFormatting,
}

impl Run {
    /// Create an unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatting: RunFormatting::default(),
        }
    }

    /// Create a run with the given formatting.
    pub fn formatted(text: impl Into<String>, formatting: RunFormatting) -> Self {
        Self {
            text: text.into(),
            formatting,
        }
    }

    /// Length in Unicode scalar values.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Explicit formatting carried by a run.
///
/// Only properties set on the run or its paragraph are recorded; theme and
/// master defaults are not resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub highlighted: bool,
    pub highlight_color: Option<String>,
    /// Size in points.
    pub font_size: Option<f64>,
    /// `#RRGGBB` for literal colours, the scheme name for theme colours.
    pub font_color: Option<String>,
    pub hyperlink: Option<Hyperlink>,
}

impl RunFormatting {
    /// Builder: set bold.
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set italic.
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Builder: set font size in points.
    pub fn with_font_size(mut self, points: f64) -> Self {
        self.font_size = Some(points);
        self
    }

    /// Builder: set font colour.
    pub fn with_font_color(mut self, color: impl Into<String>) -> Self {
        self.font_color = Some(color.into());
        self
    }

    /// Builder: set hyperlink.
    pub fn with_hyperlink(mut self, hyperlink: Hyperlink) -> Self {
        self.hyperlink = Some(hyperlink);
        self
    }
}

/// A resolved (or unresolvable) hyperlink on a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Relationship id from the run, if the link used one.
    pub rel_id: Option<String>,
    /// Target URL; `None` when the relationship could not be resolved.
    pub target: Option<String>,
    pub link_type: LinkType,
}

impl Hyperlink {
    /// Build a hyperlink, classifying the target.
    pub fn new(rel_id: Option<String>, target: Option<String>, internal: bool) -> Self {
        let link_type = match target.as_deref() {
            Some(t) if t.starts_with("mailto:") => LinkType::Email,
            Some(t) if t.starts_with('#') || t.starts_with("ppaction://") => LinkType::Internal,
            _ if internal => LinkType::Internal,
            _ => LinkType::External,
        };
        Self {
            rel_id,
            target,
            link_type,
        }
    }
}

/// Where a hyperlink points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    External,
    Internal,
    Email,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_offsets_are_codepoint_based() {
        let element = TextElement::from_runs(vec![
            Run::plain("héllo "),
            Run::plain("wörld"),
            Run::plain(""),
            Run::plain("!"),
        ]);
        assert_eq!(element.run_offsets(), vec![0, 6, 11, 11]);
        assert_eq!(element.complete_text(), "héllo wörld!");
    }

    #[test]
    fn test_slide_lookup_by_number() {
        let mut presentation = Presentation::new("abc");
        presentation.add_slide(Slide::new(1, "ppt/slides/slide1.xml"));
        presentation.add_slide(Slide::new(2, "ppt/slides/slide2.xml"));

        assert_eq!(presentation.slide(2).map(|s| s.part_name.as_str()), Some("ppt/slides/slide2.xml"));
        assert!(presentation.slide(0).is_none());
        assert!(presentation.slide(3).is_none());
    }

    #[test]
    fn test_hyperlink_classification() {
        assert_eq!(
            Hyperlink::new(None, Some("mailto:a@b.c".into()), false).link_type,
            LinkType::Email
        );
        assert_eq!(
            Hyperlink::new(None, Some("https://example.com".into()), false).link_type,
            LinkType::External
        );
        assert_eq!(
            Hyperlink::new(Some("rId2".into()), Some("slide3.xml".into()), true).link_type,
            LinkType::Internal
        );
        assert_eq!(Hyperlink::new(Some("rId9".into()), None, false).link_type, LinkType::External);
    }

    #[test]
    fn test_slide_size_conversion() {
        let size = SlideSize::from_emu(12_192_000, 6_858_000);
        assert_eq!(size.width_inches, 13.33);
        assert_eq!(size.height_inches, 7.5);
        assert_eq!(size.aspect_ratio, 1.78);
    }

    #[test]
    fn test_notes_text_defaults_to_empty() {
        let slide = Slide::new(1, "ppt/slides/slide1.xml");
        assert_eq!(slide.notes_text(), "");
    }
}
