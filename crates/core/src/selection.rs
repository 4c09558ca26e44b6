//! Slide selection: which slides an operation should look at.
//!
//! Accepted forms are "everything", a single number, a list of numbers, or an
//! expression such as `"1,3,5:7"`, `"[2:]"` or `":4"`. Explicit numbers
//! outside the presentation are rejected; open or overlong ranges are clipped
//! to the presentation and the clipping is reported as a note.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// A caller's slide selection, before it is checked against a presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideSelection {
    #[default]
    All,
    Single(i64),
    List(Vec<i64>),
    Expression(String),
}

/// Concrete slide numbers, ascending and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSelection {
    pub slides: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl SlideSelection {
    /// Resolve against a presentation with `total` slides.
    pub fn resolve(&self, total: usize) -> Result<ResolvedSelection, ValidationError> {
        let mut resolved = ResolvedSelection::default();
        match self {
            SlideSelection::All => resolved.slides = (1..=total).collect(),
            SlideSelection::Single(n) => resolved.slides.push(check_number(*n, total)?),
            SlideSelection::List(numbers) => {
                for &n in numbers {
                    resolved.slides.push(check_number(n, total)?);
                }
            }
            SlideSelection::Expression(expr) => parse_expression(expr, total, &mut resolved)?,
        }
        resolved.slides.sort_unstable();
        resolved.slides.dedup();
        Ok(resolved)
    }
}

impl From<Option<SlideSelection>> for SlideSelection {
    fn from(value: Option<SlideSelection>) -> Self {
        value.unwrap_or_default()
    }
}

fn check_number(n: i64, total: usize) -> Result<usize, ValidationError> {
    match usize::try_from(n) {
        Ok(v) if (1..=total).contains(&v) => Ok(v),
        _ => Err(ValidationError::SlideOutOfRange { number: n, total }),
    }
}

fn parse_expression(
    expr: &str,
    total: usize,
    resolved: &mut ResolvedSelection,
) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidSlideSelection {
        selection: expr.to_string(),
        reason: reason.to_string(),
    };

    let mut body = expr.trim();
    if let Some(inner) = body.strip_prefix('[') {
        body = inner
            .strip_suffix(']')
            .ok_or_else(|| invalid("unbalanced brackets"))?
            .trim();
    }
    if body.is_empty() {
        return Err(invalid("empty selection"));
    }

    for part in body.split(',').map(str::trim) {
        if part.is_empty() {
            return Err(invalid("empty item"));
        }

        let Some((start, end)) = part.split_once(':') else {
            let n = parse_number(part).ok_or_else(|| invalid("not a slide number"))?;
            resolved.slides.push(check_number(n, total)?);
            continue;
        };

        let start = match start.trim() {
            "" => 1,
            s => parse_number(s).ok_or_else(|| invalid("range start is not a number"))?,
        };
        let end = match end.trim() {
            "" => None,
            s => Some(parse_number(s).ok_or_else(|| invalid("range end is not a number"))?),
        };

        if start < 1 {
            return Err(invalid("slide numbers start at 1"));
        }
        if matches!(end, Some(e) if e < start) {
            return Err(invalid("range start is after range end"));
        }

        // start >= 1 was checked above
        let start = start as usize;
        if start > total {
            resolved.notes.push(format!(
                "Range '{part}' starts after the last slide ({total}); no slides selected"
            ));
            continue;
        }
        let end = match end {
            Some(e) if e as usize > total => {
                resolved
                    .notes
                    .push(format!("Range '{part}' clipped to the last slide ({total})"));
                total
            }
            Some(e) => e as usize,
            None => total,
        };
        resolved.slides.extend(start..=end);
    }
    Ok(())
}

fn parse_number(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}
