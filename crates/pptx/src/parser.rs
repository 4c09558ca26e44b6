//! PPTX file parser implementation.

use crate::archive::Package;
use crate::numbering::ordered_slide_parts;
use crate::rels::{rels_part_for, Relationships, RT_NOTES_SLIDE, RT_SLIDE_LAYOUT};
use crate::sections::read_sections;
use crate::slide::{read_slide_content, shape_texts};
use crate::text::{plain_text, TextContext};
use crate::xml::XmlElement;
use deck_core::{fingerprint, Presentation, ResolutionWarning, Result, Slide, SlideSize, WarningKind};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Notes placeholders that carry no speaker text.
const NOTES_SKIPPED_PLACEHOLDERS: &[&str] = &["sldImg", "sldNum", "dt", "ftr", "hdr"];

/// Layout name and type, as read from a slide layout part.
#[derive(Debug, Clone, Default)]
struct LayoutInfo {
    name: Option<String>,
    layout_type: Option<String>,
}

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Build a presentation from the bytes of a PPTX file.
    ///
    /// The build either completes or fails with a format error; no partial
    /// presentation is returned.
    pub fn parse(&self, bytes: &[u8]) -> Result<Presentation> {
        self.parse_reader(Cursor::new(bytes), fingerprint(bytes))
    }

    /// Build a presentation from a reader, recording the given content fingerprint.
    pub fn parse_reader<R: Read + Seek>(&self, reader: R, fingerprint: String) -> Result<Presentation> {
        let mut package = Package::open(reader)?;
        let root = package.required_xml_part(PRESENTATION_PART)?;
        let pres_rels = read_rels(&mut package, PRESENTATION_PART)?;

        let mut presentation = Presentation::new(fingerprint);
        presentation.slide_size = root.child("sldSz").and_then(|sz| {
            let cx = sz.attr("cx")?.parse().ok()?;
            let cy = sz.attr("cy")?.parse().ok()?;
            Some(SlideSize::from_emu(cx, cy))
        });

        // External slide N is the N-th slide part by numeric index.
        let slide_parts = ordered_slide_parts(package.part_names());
        let numbers: HashMap<String, usize> = slide_parts
            .iter()
            .enumerate()
            .map(|(i, part)| (part.clone(), i + 1))
            .collect();

        let mut warnings = Vec::new();
        let sections = read_sections(&root, &pres_rels, &numbers, &mut warnings);
        let mut layouts: HashMap<String, Option<LayoutInfo>> = HashMap::new();

        for (idx, part) in slide_parts.iter().enumerate() {
            let mut slide = self.parse_slide(&mut package, part, idx + 1, &mut layouts, &mut warnings)?;
            slide.section = sections.by_slide.get(&slide.number).cloned();
            presentation.add_slide(slide);
        }

        presentation.sections = sections.sections;
        presentation.warnings = warnings;

        log::info!(
            "Built presentation with {} slides ({} warnings)",
            presentation.slide_count(),
            presentation.warnings.len()
        );
        Ok(presentation)
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        package: &mut Package<R>,
        part: &str,
        slide_number: usize,
        layouts: &mut HashMap<String, Option<LayoutInfo>>,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> Result<Slide> {
        let root = package.required_xml_part(part)?;
        let rels = read_rels(package, part)?;
        let mut slide = Slide::new(slide_number, part);

        {
            let mut ctx = TextContext {
                slide_number,
                rels: &rels,
                warnings: &mut *warnings,
            };
            read_slide_content(&mut slide, &root, &mut ctx);
        }

        if let Some(layout_part) = rels.first_of_type(RT_SLIDE_LAYOUT).and_then(|r| r.part.clone()) {
            if !layouts.contains_key(&layout_part) {
                let info = read_layout(package, &layout_part)?;
                layouts.insert(layout_part.clone(), info);
            }
            match layouts.get(&layout_part).cloned().flatten() {
                Some(info) => {
                    slide.layout_name = info.name;
                    slide.layout_type = info.layout_type;
                }
                None => {
                    log::warn!("Slide {}: layout part {} not found", slide_number, layout_part);
                    warnings.push(ResolutionWarning::for_slide(
                        slide_number,
                        WarningKind::MissingLayout,
                        format!("Layout part '{}' is missing", layout_part),
                    ));
                }
            }
        }

        if let Some(notes_part) = rels.first_of_type(RT_NOTES_SLIDE).and_then(|r| r.part.clone()) {
            match package.xml_part(&notes_part)? {
                Some(notes_root) => slide.notes = Some(notes_text(&notes_root)),
                None => {
                    log::warn!("Slide {}: notes part {} not found", slide_number, notes_part);
                    warnings.push(ResolutionWarning::for_slide(
                        slide_number,
                        WarningKind::MissingNotes,
                        format!("Notes part '{}' is missing", notes_part),
                    ));
                }
            }
        }

        log::debug!(
            "Parsed slide {} from {}: {} text elements, {} tables",
            slide_number,
            part,
            slide.text_elements.len(),
            slide.tables.len()
        );
        Ok(slide)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Relationships of a part; a part without a rels part has none.
fn read_rels<R: Read + Seek>(package: &mut Package<R>, part: &str) -> Result<Relationships> {
    Ok(package
        .xml_part(&rels_part_for(part))?
        .map(|root| Relationships::from_xml(part, &root))
        .unwrap_or_default())
}

fn read_layout<R: Read + Seek>(package: &mut Package<R>, part: &str) -> Result<Option<LayoutInfo>> {
    Ok(package.xml_part(part)?.map(|root| LayoutInfo {
        name: root
            .child("cSld")
            .and_then(|c| c.attr("name"))
            .map(str::to_string),
        layout_type: root.attr("type").map(str::to_string),
    }))
}

/// Speaker text of a notes part: paragraphs joined by newlines, shapes by a blank line.
fn notes_text(root: &XmlElement) -> String {
    let mut bodies = Vec::new();
    if let Some(tree) = root.path(&["cSld", "spTree"]) {
        shape_texts(tree, NOTES_SKIPPED_PLACEHOLDERS, &mut bodies);
    }
    bodies
        .into_iter()
        .map(|body| plain_text(body).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn test_notes_text_skips_slide_placeholders() {
        let xml = r#"<p:notes xmlns:p="urn:p" xmlns:a="urn:a"><p:cSld><p:spTree>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>
<p:txBody><a:p><a:r><a:t>First point</a:t></a:r></a:p><a:p><a:r><a:t>Second point</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="4" name="Slide Number"/><p:cNvSpPr/><p:nvPr><p:ph type="sldNum"/></p:nvPr></p:nvSpPr>
<p:txBody><a:p><a:fld type="slidenum"><a:t>2</a:t></a:fld></a:p></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="5" name="Extra"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
<p:txBody><a:p><a:r><a:t>Aside</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:notes>"#;
        let root = parse_document("ppt/notesSlides/notesSlide1.xml", xml).unwrap();
        assert_eq!(notes_text(&root), "First point\nSecond point\n\nAside");
    }

    #[test]
    fn test_invalid_archive() {
        let err = PptxParser::new().parse(b"not a zip").unwrap_err();
        assert!(matches!(err, deck_core::Error::Format(deck_core::FormatError::InvalidArchive(_))));
    }
}
