//! Slide number resolution.
//!
//! External slide number N is the N-th slide part when slide parts are
//! ordered by the number embedded in their file name, compared numerically.
//! The mapping is computed once per build.

use std::cmp::Ordering;

const SLIDE_DIR: &str = "ppt/slides/";
const SLIDE_PREFIX: &str = "slide";
const XML_SUFFIX: &str = ".xml";

/// Extract a part number from a string like "rId2" or "slide3.xml".
pub fn extract_part_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".rels").trim_end_matches(XML_SUFFIX);
    let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    s[s.len() - digits..].parse().ok()
}

/// Whether a part name is a slide part (`ppt/slides/slideN.xml`).
pub fn is_slide_part(name: &str) -> bool {
    name.strip_prefix(SLIDE_DIR)
        .and_then(|file| file.strip_prefix(SLIDE_PREFIX))
        .and_then(|rest| rest.strip_suffix(XML_SUFFIX))
        .map_or(false, |digits| {
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Numeric comparison of two part names by embedded index.
pub fn compare_parts(a: &str, b: &str) -> Ordering {
    match (extract_part_number(a), extract_part_number(b)) {
        (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Slide parts in external numbering order; index 0 is slide 1.
pub fn ordered_slide_parts<'a, I>(part_names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut slides: Vec<String> = part_names
        .into_iter()
        .filter(|n| is_slide_part(n))
        .cloned()
        .collect();
    slides.sort_by(|a, b| compare_parts(a, b));
    slides
}
