//! In-memory PPTX packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One relationship of a part.
pub struct Rel {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
    pub external: bool,
}

impl Rel {
    pub fn internal(id: &str, kind: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            kind,
            target: target.into(),
            external: false,
        }
    }

    pub fn external(id: &str, kind: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            kind,
            target: target.into(),
            external: true,
        }
    }
}

pub fn rels_xml(rels: &[Rel]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let mode = if rel.external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"{}/>"#,
            rel.id, REL_BASE, rel.kind, rel.target, mode
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// A slide part wrapping the given shape tree content.
pub fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sld>"#
    )
}

/// A text shape; `ph` is the placeholder type, `paragraphs` raw `<a:p>` content.
pub fn shape(name: &str, ph: Option<&str>, paragraphs: &str) -> String {
    let ph = ph.map(|t| format!(r#"<p:ph type="{t}"/>"#)).unwrap_or_default();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="{name}"/><p:cNvSpPr/><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>{paragraphs}</p:txBody></p:sp>"#
    )
}

pub fn title(text: &str) -> String {
    shape("Title 1", Some("title"), &format!("<a:p><a:r><a:t>{text}</a:t></a:r></a:p>"))
}

/// A table frame from rows of raw `<a:tc>` content.
pub fn table(columns: usize, rows: &[&str]) -> String {
    let grid: String = (0..columns).map(|_| r#"<a:gridCol w="914400"/>"#).collect();
    let rows: String = rows.iter().map(|r| format!("<a:tr h=\"370840\">{r}</a:tr>")).collect();
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table 3"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid>{grid}</a:tblGrid>{rows}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#
    )
}

/// A table cell with plain text and optional merge attributes.
pub fn cell(text: &str, attrs: &str) -> String {
    format!(r#"<a:tc {attrs}><a:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#)
}

pub fn notes_xml(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:notes {NS}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld></p:notes>"#,
        shape("Slide Image 1", Some("sldImg"), ""),
        shape("Notes 2", Some("body"), &format!("<a:p><a:r><a:t>{text}</a:t></a:r></a:p>")),
    )
}

pub fn layout_xml(name: &str, kind: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout {NS} type="{kind}" preserve="1"><p:cSld name="{name}"><p:spTree/></p:cSld></p:sldLayout>"#
    )
}

struct SlideEntry {
    index: usize,
    xml: String,
    rels: Vec<Rel>,
}

/// Builder for a complete package.
#[derive(Default)]
pub struct Deck {
    slides: Vec<SlideEntry>,
    parts: Vec<(String, String)>,
    sections: Vec<(&'static str, Vec<usize>)>,
    skip_presentation: bool,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ppt/slides/slide{index}.xml`.
    pub fn slide(mut self, index: usize, shapes: &str, rels: Vec<Rel>) -> Self {
        self.slides.push(SlideEntry {
            index,
            xml: slide_xml(shapes),
            rels,
        });
        self
    }

    /// Add a slide part with raw content.
    pub fn raw_slide(mut self, index: usize, xml: &str) -> Self {
        self.slides.push(SlideEntry {
            index,
            xml: xml.to_string(),
            rels: Vec::new(),
        });
        self
    }

    pub fn part(mut self, name: &str, xml: String) -> Self {
        self.parts.push((name.to_string(), xml));
        self
    }

    /// Declare a section over slide part indices.
    pub fn section(mut self, name: &'static str, slide_indices: Vec<usize>) -> Self {
        self.sections.push((name, slide_indices));
        self
    }

    pub fn without_presentation(mut self) -> Self {
        self.skip_presentation = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut files: Vec<(String, String)> = Vec::new();

        let mut pres_rels = Vec::new();
        let mut sld_ids = String::new();
        for (i, slide) in self.slides.iter().enumerate() {
            let rid = format!("rId{}", 100 + i);
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + slide.index, rid));
            pres_rels.push((rid, format!("slides/slide{}.xml", slide.index)));
        }

        let mut section_xml = String::new();
        if !self.sections.is_empty() {
            section_xml.push_str(r#"<p:extLst><p:ext uri="{521415D9-36F7-43E2-AB2F-B90AF26B5E84}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main">"#);
            for (i, (name, indices)) in self.sections.iter().enumerate() {
                let ids: String = indices
                    .iter()
                    .map(|idx| format!(r#"<p14:sldId id="{}"/>"#, 256 + idx))
                    .collect();
                section_xml.push_str(&format!(
                    r#"<p14:section name="{name}" id="{{S{i}}}"><p14:sldIdLst>{ids}</p14:sldIdLst></p14:section>"#
                ));
            }
            section_xml.push_str("</p14:sectionLst></p:ext></p:extLst>");
        }

        if !self.skip_presentation {
            files.push((
                "ppt/presentation.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldIdLst>{sld_ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/>{section_xml}</p:presentation>"#
                ),
            ));
        }
        let rels: Vec<Rel> = pres_rels
            .into_iter()
            .map(|(id, target)| Rel::internal(&id, "slide", target))
            .collect();
        files.push(("ppt/_rels/presentation.xml.rels".to_string(), rels_xml(&rels)));

        for slide in self.slides {
            files.push((format!("ppt/slides/slide{}.xml", slide.index), slide.xml));
            if !slide.rels.is_empty() {
                files.push((
                    format!("ppt/slides/_rels/slide{}.xml.rels", slide.index),
                    rels_xml(&slide.rels),
                ));
            }
        }
        files.extend(self.parts);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
