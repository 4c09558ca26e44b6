//! Slide parts: shape tree walk, text elements, tables and object counts.

use crate::text::{color_of, text_body_runs, TextContext};
use crate::xml::XmlElement;
use deck_core::{RawCell, RawTable, ResolutionWarning, Slide, Table, TextElement, WarningKind};

const TITLE_PLACEHOLDERS: &[&str] = &["title", "ctrTitle"];
const SUBTITLE_PLACEHOLDER: &str = "subTitle";

/// Fill a slide's text, tables and counts from its parsed part.
pub fn read_slide_content(slide: &mut Slide, root: &XmlElement, ctx: &mut TextContext<'_>) {
    let Some(tree) = root.path(&["cSld", "spTree"]) else {
        return;
    };
    ShapeTreeReader { slide, ctx }.walk(tree);
}

struct ShapeTreeReader<'s, 'c, 'a> {
    slide: &'s mut Slide,
    ctx: &'c mut TextContext<'a>,
}

impl ShapeTreeReader<'_, '_, '_> {
    fn walk(&mut self, tree: &XmlElement) {
        for shape in tree.elements() {
            match shape.name.as_str() {
                "sp" => self.shape(shape),
                "grpSp" => {
                    self.slide.object_counts.groups += 1;
                    self.walk(shape);
                }
                "graphicFrame" => self.graphic_frame(shape),
                "pic" => {
                    if is_media(shape) {
                        self.slide.object_counts.media += 1;
                    } else {
                        self.slide.object_counts.images += 1;
                    }
                }
                "cxnSp" => self.slide.object_counts.connectors += 1,
                "AlternateContent" => {
                    if let Some(branch) = shape.child("Choice").or_else(|| shape.child("Fallback")) {
                        self.walk(branch);
                    }
                }
                _ => {}
            }
        }
    }

    fn shape(&mut self, sp: &XmlElement) {
        let counts = &mut self.slide.object_counts;
        counts.shapes += 1;
        if sp.path(&["nvSpPr", "cNvSpPr"]).and_then(|e| e.attr("txBox")) == Some("1") {
            counts.text_boxes += 1;
        }

        let Some(tx_body) = sp.child("txBody") else {
            return;
        };
        let placeholder = placeholder_type(sp, "nvSpPr");
        let element = TextElement {
            shape_name: sp
                .path(&["nvSpPr", "cNvPr"])
                .and_then(|e| e.attr("name"))
                .map(str::to_string),
            placeholder: placeholder.clone(),
            runs: text_body_runs(tx_body, self.ctx),
        };
        if element.runs.is_empty() {
            return;
        }

        let text = element.complete_text().trim().to_string();
        if !text.is_empty() {
            match placeholder.as_deref() {
                Some(p) if TITLE_PLACEHOLDERS.contains(&p) && self.slide.title.is_none() => {
                    self.slide.title = Some(text)
                }
                Some(SUBTITLE_PLACEHOLDER) if self.slide.subtitle.is_none() => {
                    self.slide.subtitle = Some(text)
                }
                _ => {}
            }
        }
        self.slide.text_elements.push(element);
    }

    fn graphic_frame(&mut self, frame: &XmlElement) {
        let Some(data) = frame.path(&["graphic", "graphicData"]) else {
            self.slide.object_counts.shapes += 1;
            return;
        };
        let uri = data.attr("uri").unwrap_or_default();
        if let Some(tbl) = data.child("tbl") {
            self.slide.object_counts.tables += 1;
            let (table, orphans) = Table::from_raw(raw_table(tbl, self.ctx));
            for (row, col) in orphans {
                log::warn!(
                    "Slide {}: merged cell at row {}, column {} has no origin",
                    self.slide.number,
                    row,
                    col
                );
                self.ctx.warnings.push(ResolutionWarning::for_slide(
                    self.slide.number,
                    WarningKind::OrphanMergedCell,
                    format!(
                        "Table {}: merge continuation at row {}, column {} has no spanning cell",
                        self.slide.tables.len(),
                        row,
                        col
                    ),
                ));
            }
            self.slide.tables.push(table);
        } else if uri.ends_with("/chart") || data.child("chart").is_some() {
            self.slide.object_counts.charts += 1;
        } else {
            self.slide.object_counts.shapes += 1;
        }
    }
}

/// Placeholder type of a shape; a placeholder without a type is `obj`.
fn placeholder_type(shape: &XmlElement, nv_props: &str) -> Option<String> {
    shape
        .path(&[nv_props, "nvPr", "ph"])
        .map(|ph| ph.attr("type").unwrap_or("obj").to_string())
}

fn is_media(pic: &XmlElement) -> bool {
    pic.path(&["nvPicPr", "nvPr"]).map_or(false, |nv| {
        nv.elements()
            .any(|e| matches!(e.name.as_str(), "videoFile" | "audioFile" | "quickTimeFile"))
            || !nv.descendants("media").is_empty()
    })
}

/// Cells as declared, with merge attributes.
fn raw_table(tbl: &XmlElement, ctx: &mut TextContext<'_>) -> RawTable {
    let column_count = tbl
        .child("tblGrid")
        .map_or(0, |grid| grid.children_named("gridCol").count());

    let rows = tbl
        .children_named("tr")
        .map(|tr| {
            tr.children_named("tc")
                .map(|tc| RawCell {
                    content: TextElement::from_runs(
                        tc.child("txBody")
                            .map(|body| text_body_runs(body, ctx))
                            .unwrap_or_default(),
                    ),
                    row_span: span(tc, "rowSpan"),
                    col_span: span(tc, "gridSpan"),
                    h_merge: flag(tc, "hMerge"),
                    v_merge: flag(tc, "vMerge"),
                    background: tc
                        .path(&["tcPr", "solidFill"])
                        .and_then(color_of),
                })
                .collect()
        })
        .collect();

    RawTable { rows, column_count }
}

fn span(tc: &XmlElement, attr: &str) -> usize {
    tc.attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

fn flag(tc: &XmlElement, attr: &str) -> bool {
    matches!(tc.attr(attr), Some("1" | "true"))
}

/// Text bodies of a shape tree in document order, groups included.
///
/// Shapes whose placeholder type is in `skip` are ignored.
pub fn shape_texts<'x>(tree: &'x XmlElement, skip: &[&str], out: &mut Vec<&'x XmlElement>) {
    for shape in tree.elements() {
        match shape.name.as_str() {
            "sp" => {
                let ph = placeholder_type(shape, "nvSpPr");
                if ph.as_deref().map_or(false, |p| skip.contains(&p)) {
                    continue;
                }
                if let Some(body) = shape.child("txBody") {
                    out.push(body);
                }
            }
            "grpSp" => shape_texts(shape, skip, out),
            _ => {}
        }
    }
}
