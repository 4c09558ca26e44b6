//! Text bodies: paragraphs, runs and their explicit formatting.
//!
//! Each boolean property may be written as an attribute on the run
//! properties (`<a:rPr b="1"/>`) or as a child element (`<a:rPr><a:b/></a:rPr>`,
//! optionally with a `val`). Both forms are read and combined with a logical
//! OR. Properties missing on a run fall back to the paragraph's `defRPr`.

use crate::rels::Relationships;
use crate::xml::XmlElement;
use deck_core::{Hyperlink, ResolutionWarning, Run, RunFormatting, WarningKind};

/// Where text is being read from, for hyperlink resolution and warnings.
pub struct TextContext<'a> {
    pub slide_number: usize,
    pub rels: &'a Relationships,
    pub warnings: &'a mut Vec<ResolutionWarning>,
}

/// Explicit properties before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq)]
struct Props {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    strike: Option<bool>,
    highlight: Option<Option<String>>,
    size: Option<f64>,
    color: Option<String>,
}

impl Props {
    fn read(rpr: &XmlElement) -> Self {
        Self {
            bold: combine(
                rpr.attr("b").map(is_on),
                rpr.child("b").map(|e| is_on(e.attr("val").unwrap_or("1"))),
            ),
            italic: combine(
                rpr.attr("i").map(is_on),
                rpr.child("i").map(|e| is_on(e.attr("val").unwrap_or("1"))),
            ),
            underline: combine(
                rpr.attr("u").map(|v| v != "none"),
                rpr.child("u").map(|e| e.attr("val").unwrap_or("sng") != "none"),
            ),
            strike: combine(
                rpr.attr("strike").map(|v| v != "noStrike"),
                rpr.child("strike")
                    .map(|e| e.attr("val").unwrap_or("sngStrike") != "noStrike"),
            ),
            highlight: rpr.child("highlight").map(color_of),
            size: parse_hundredths(rpr.attr("sz"))
                .or_else(|| parse_hundredths(rpr.child("sz").and_then(|e| e.attr("val")))),
            color: rpr.child("solidFill").and_then(color_of),
        }
    }

    /// Fill unset properties from `defaults`.
    fn or(self, defaults: &Props) -> Self {
        Self {
            bold: self.bold.or(defaults.bold),
            italic: self.italic.or(defaults.italic),
            underline: self.underline.or(defaults.underline),
            strike: self.strike.or(defaults.strike),
            highlight: self.highlight.or_else(|| defaults.highlight.clone()),
            size: self.size.or(defaults.size),
            color: self.color.or_else(|| defaults.color.clone()),
        }
    }

    fn into_formatting(self, hyperlink: Option<Hyperlink>) -> RunFormatting {
        RunFormatting {
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            underline: self.underline.unwrap_or(false),
            strikethrough: self.strike.unwrap_or(false),
            highlighted: self.highlight.is_some(),
            highlight_color: self.highlight.flatten(),
            font_size: self.size,
            font_color: self.color,
            hyperlink,
        }
    }
}

/// Font size in points from a value in hundredths of a point.
fn parse_hundredths(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|hundredths| hundredths / 100.0)
}

/// Either detection form alone is enough to turn a property on.
fn combine(attribute: Option<bool>, element: Option<bool>) -> Option<bool> {
    match (attribute, element) {
        (None, None) => None,
        (a, e) => Some(a == Some(true) || e == Some(true)),
    }
}

fn is_on(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "on")
}

/// Colour of the first colour child: `#RRGGBB` for literal colours, the
/// scheme or preset name otherwise.
pub fn color_of(el: &XmlElement) -> Option<String> {
    el.elements().find_map(|c| match c.name.as_str() {
        "srgbClr" => c.attr("val").map(|v| format!("#{}", v.to_uppercase())),
        "sysClr" => c
            .attr("lastClr")
            .map(|v| format!("#{}", v.to_uppercase()))
            .or_else(|| c.attr("val").map(str::to_string)),
        "schemeClr" | "prstClr" => c.attr("val").map(str::to_string),
        _ => None,
    })
}

/// Resolve the `hlinkClick` of a run's properties.
fn hyperlink(rpr: &XmlElement, ctx: &mut TextContext<'_>) -> Option<Hyperlink> {
    let click = rpr.child("hlinkClick")?;
    let rel_id = click.prefixed_attr("id").filter(|id| !id.is_empty());
    let action = click.attr("action").filter(|a| !a.is_empty());

    match rel_id {
        Some(id) => match ctx.rels.get(id) {
            Some(rel) if rel.external => Some(Hyperlink::new(
                Some(id.to_string()),
                Some(rel.target.clone()),
                false,
            )),
            Some(rel) => Some(Hyperlink::new(
                Some(id.to_string()),
                Some(rel.part.clone().unwrap_or_else(|| rel.target.clone())),
                true,
            )),
            None => {
                log::warn!(
                    "Slide {}: hyperlink relationship {} not found",
                    ctx.slide_number,
                    id
                );
                ctx.warnings.push(ResolutionWarning::for_slide(
                    ctx.slide_number,
                    WarningKind::UnresolvedHyperlink,
                    format!("Hyperlink relationship '{}' has no target", id),
                ));
                Some(Hyperlink::new(Some(id.to_string()), None, false))
            }
        },
        None => action.map(|a| Hyperlink::new(None, Some(a.to_string()), true)),
    }
}

fn run_from(el: &XmlElement, text: String, defaults: &Props, ctx: &mut TextContext<'_>) -> Run {
    let (props, link) = match el.child("rPr") {
        Some(rpr) => (Props::read(rpr), hyperlink(rpr, ctx)),
        None => (Props::default(), None),
    };
    Run::formatted(text, props.or(defaults).into_formatting(link))
}

/// Runs of a text body. Paragraphs are separated by an unformatted `"\n"` run.
pub fn text_body_runs(tx_body: &XmlElement, ctx: &mut TextContext<'_>) -> Vec<Run> {
    let mut runs = Vec::new();
    for (i, paragraph) in tx_body.children_named("p").enumerate() {
        if i > 0 {
            runs.push(Run::plain("\n"));
        }
        let defaults = paragraph
            .path(&["pPr", "defRPr"])
            .map(Props::read)
            .unwrap_or_default();

        for child in paragraph.elements() {
            match child.name.as_str() {
                "r" | "fld" => {
                    let text = child.child("t").map(|t| t.text()).unwrap_or_default();
                    runs.push(run_from(child, text, &defaults, ctx));
                }
                "br" => runs.push(run_from(child, "\n".to_string(), &defaults, ctx)),
                _ => {}
            }
        }
    }
    runs
}

/// Plain text of a text body without formatting.
pub fn plain_text(tx_body: &XmlElement) -> String {
    tx_body
        .children_named("p")
        .map(|p| {
            p.elements()
                .map(|c| match c.name.as_str() {
                    "r" | "fld" => c.child("t").map(|t| t.text()).unwrap_or_default(),
                    "br" => "\n".to_string(),
                    _ => String::new(),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
