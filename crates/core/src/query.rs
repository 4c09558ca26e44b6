//! Slide query engine: validate criteria, evaluate per slide, project fields.
//!
//! Criteria arrive as untrusted JSON. [`ValidatedCriteria::parse`] is the only
//! way to obtain a value evaluation accepts, so a criteria tree that violates
//! the grammar can never be evaluated, let alone match every slide.

use crate::error::{json_type_name, ValidationError};
use crate::table::Table;
use crate::types::{ObjectCounts, Presentation, Slide, TextElement};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const GROUPS: &[&str] = &["title", "content", "section", "notes", "layout", "slide_numbers"];
const TITLE_OPS: &[&str] = &[
    "equals",
    "contains",
    "starts_with",
    "ends_with",
    "regex",
    "one_of",
    "exists",
];
const CONTENT_OPS: &[&str] = &[
    "contains_text",
    "has_tables",
    "has_charts",
    "has_images",
    "object_count",
];
const SECTION_OPS: &[&str] = &["equals", "contains", "one_of"];
const NOTES_OPS: &[&str] = &["contains", "regex", "is_empty"];
const LAYOUT_OPS: &[&str] = &["name", "type"];
const COUNT_OPS: &[&str] = &["min", "max"];

/// Default number of matches returned.
pub const DEFAULT_LIMIT: usize = 50;

/// A string test. Comparisons are case-insensitive; needles are stored lowercased.
#[derive(Debug, Clone)]
enum TextPredicate {
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Regex(Regex),
    OneOf(Vec<String>),
}

impl TextPredicate {
    fn matches(&self, value: &str) -> bool {
        let lower = value.to_lowercase();
        match self {
            TextPredicate::Equals(s) => lower == *s,
            TextPredicate::Contains(s) => lower.contains(s.as_str()),
            TextPredicate::StartsWith(s) => lower.starts_with(s.as_str()),
            TextPredicate::EndsWith(s) => lower.ends_with(s.as_str()),
            TextPredicate::Regex(re) => re.is_match(value),
            TextPredicate::OneOf(options) => options.iter().any(|o| *o == lower),
        }
    }
}

#[derive(Debug, Clone)]
enum TitlePredicate {
    Text(TextPredicate),
    Exists(bool),
}

#[derive(Debug, Clone)]
enum ContentPredicate {
    ContainsText(String),
    HasTables(bool),
    HasCharts(bool),
    HasImages(bool),
    ObjectCount { min: Option<usize>, max: Option<usize> },
}

#[derive(Debug, Clone)]
enum NotesPredicate {
    Text(TextPredicate),
    IsEmpty(bool),
}

#[derive(Debug, Clone)]
enum LayoutPredicate {
    Name(String),
    Type(String),
}

/// Criteria that passed validation. Only [`ValidatedCriteria::parse`] builds one.
#[derive(Debug, Clone, Default)]
pub struct ValidatedCriteria {
    title: Vec<TitlePredicate>,
    content: Vec<ContentPredicate>,
    section: Vec<TextPredicate>,
    notes: Vec<NotesPredicate>,
    layout: Vec<LayoutPredicate>,
    slide_numbers: Option<Vec<i64>>,
}

impl ValidatedCriteria {
    /// Check a criteria tree against the grammar.
    ///
    /// The first violation rejects the whole tree.
    pub fn parse(criteria: &Value) -> Result<Self, ValidationError> {
        let groups = criteria
            .as_object()
            .ok_or_else(|| ValidationError::CriteriaNotObject {
                found: json_type_name(criteria),
            })?;

        let mut validated = Self::default();
        for (group, value) in groups {
            match group.as_str() {
                "title" => {
                    for (op, v) in operators(group, value)? {
                        let predicate = match op.as_str() {
                            "exists" => TitlePredicate::Exists(expect_bool(group, op, v)?),
                            _ => TitlePredicate::Text(text_predicate(group, op, v, TITLE_OPS)?),
                        };
                        validated.title.push(predicate);
                    }
                }
                "content" => {
                    for (op, v) in operators(group, value)? {
                        validated.content.push(content_predicate(group, op, v)?);
                    }
                }
                "section" => match value {
                    Value::String(name) => validated
                        .section
                        .push(TextPredicate::Equals(name.to_lowercase())),
                    _ => {
                        for (op, v) in operators(group, value)? {
                            validated
                                .section
                                .push(text_predicate(group, op, v, SECTION_OPS)?);
                        }
                    }
                },
                "notes" => {
                    for (op, v) in operators(group, value)? {
                        let predicate = match op.as_str() {
                            "is_empty" => NotesPredicate::IsEmpty(expect_bool(group, op, v)?),
                            _ => NotesPredicate::Text(text_predicate(group, op, v, NOTES_OPS)?),
                        };
                        validated.notes.push(predicate);
                    }
                }
                "layout" => {
                    for (op, v) in operators(group, value)? {
                        let needle = expect_str(group, op, v)?.to_lowercase();
                        let predicate = match op.as_str() {
                            "name" => LayoutPredicate::Name(needle),
                            "type" => LayoutPredicate::Type(needle),
                            _ => return Err(unknown_operator(group, op, LAYOUT_OPS)),
                        };
                        validated.layout.push(predicate);
                    }
                }
                "slide_numbers" => {
                    validated.slide_numbers = Some(slide_numbers(value)?);
                }
                _ => {
                    return Err(ValidationError::UnknownGroup {
                        group: group.clone(),
                        allowed: GROUPS.join(", "),
                    })
                }
            }
        }
        Ok(validated)
    }

    fn matches(&self, slide: &Slide) -> bool {
        let title = slide.title.as_deref();
        let title_ok = self.title.iter().all(|p| match p {
            TitlePredicate::Exists(expected) => title.is_some() == *expected,
            TitlePredicate::Text(t) => title.map_or(false, |s| t.matches(s)),
        });
        if !title_ok {
            return false;
        }

        if !self.content.is_empty() {
            let full_text = slide.full_text().to_lowercase();
            let content_ok = self.content.iter().all(|p| match p {
                ContentPredicate::ContainsText(s) => full_text.contains(s.as_str()),
                ContentPredicate::HasTables(b) => has_tables(slide) == *b,
                ContentPredicate::HasCharts(b) => (slide.object_counts.charts > 0) == *b,
                ContentPredicate::HasImages(b) => (slide.object_counts.images > 0) == *b,
                ContentPredicate::ObjectCount { min, max } => {
                    let total = slide.object_counts.total();
                    min.map_or(true, |m| total >= m) && max.map_or(true, |m| total <= m)
                }
            });
            if !content_ok {
                return false;
            }
        }

        let section = slide.section.as_deref();
        if !self
            .section
            .iter()
            .all(|p| section.map_or(false, |s| p.matches(s)))
        {
            return false;
        }

        let notes = slide.notes_text();
        if !self.notes.iter().all(|p| match p {
            NotesPredicate::IsEmpty(expected) => notes.trim().is_empty() == *expected,
            NotesPredicate::Text(t) => t.matches(notes),
        }) {
            return false;
        }

        let layout_ok = self.layout.iter().all(|p| match p {
            LayoutPredicate::Name(s) => slide
                .layout_name
                .as_deref()
                .map_or(false, |n| n.to_lowercase().contains(s.as_str())),
            LayoutPredicate::Type(s) => slide
                .layout_type
                .as_deref()
                .map_or(false, |t| t.to_lowercase() == *s),
        });
        if !layout_ok {
            return false;
        }

        self.slide_numbers
            .as_ref()
            .map_or(true, |numbers| numbers.contains(&(slide.number as i64)))
    }
}

fn operators<'a>(group: &str, value: &'a Value) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| ValidationError::InvalidValue {
        group: group.to_string(),
        operator: String::new(),
        expected: "object".to_string(),
        found: json_type_name(value),
    })
}

fn unknown_operator(group: &str, op: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::UnknownOperator {
        group: group.to_string(),
        operator: op.to_string(),
        allowed: allowed.join(", "),
    }
}

fn invalid_value(group: &str, op: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::InvalidValue {
        group: group.to_string(),
        operator: op.to_string(),
        expected: expected.to_string(),
        found: json_type_name(value),
    }
}

fn expect_str<'a>(group: &str, op: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| invalid_value(group, op, "string", value))
}

fn expect_bool(group: &str, op: &str, value: &Value) -> Result<bool, ValidationError> {
    value
        .as_bool()
        .ok_or_else(|| invalid_value(group, op, "boolean", value))
}

fn expect_count(group: &str, op: &str, value: &Value) -> Result<usize, ValidationError> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| invalid_value(group, op, "non-negative integer", value))
}

fn compile_regex(group: &str, pattern: &str) -> Result<Regex, ValidationError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ValidationError::InvalidRegex {
            context: format!("{group}.regex"),
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn text_predicate(
    group: &str,
    op: &str,
    value: &Value,
    allowed: &[&str],
) -> Result<TextPredicate, ValidationError> {
    if !allowed.contains(&op) {
        return Err(unknown_operator(group, op, allowed));
    }
    if op == "one_of" {
        let items = value
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| invalid_value(group, op, "non-empty array of strings", value))?;
        let options = items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_lowercase)
                    .ok_or_else(|| invalid_value(group, op, "non-empty array of strings", value))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TextPredicate::OneOf(options));
    }

    let s = expect_str(group, op, value)?;
    Ok(match op {
        "equals" => TextPredicate::Equals(s.to_lowercase()),
        "contains" => TextPredicate::Contains(s.to_lowercase()),
        "starts_with" => TextPredicate::StartsWith(s.to_lowercase()),
        "ends_with" => TextPredicate::EndsWith(s.to_lowercase()),
        "regex" => TextPredicate::Regex(compile_regex(group, s)?),
        _ => return Err(unknown_operator(group, op, allowed)),
    })
}

fn content_predicate(group: &str, op: &str, value: &Value) -> Result<ContentPredicate, ValidationError> {
    Ok(match op {
        "contains_text" => ContentPredicate::ContainsText(expect_str(group, op, value)?.to_lowercase()),
        "has_tables" => ContentPredicate::HasTables(expect_bool(group, op, value)?),
        "has_charts" => ContentPredicate::HasCharts(expect_bool(group, op, value)?),
        "has_images" => ContentPredicate::HasImages(expect_bool(group, op, value)?),
        "object_count" => {
            let bounds = value
                .as_object()
                .ok_or_else(|| invalid_value(group, op, "object", value))?;
            let sub_group = format!("{group}.{op}");
            let mut min = None;
            let mut max = None;
            for (bound, v) in bounds {
                match bound.as_str() {
                    "min" => min = Some(expect_count(&sub_group, bound, v)?),
                    "max" => max = Some(expect_count(&sub_group, bound, v)?),
                    _ => return Err(unknown_operator(&sub_group, bound, COUNT_OPS)),
                }
            }
            ContentPredicate::ObjectCount { min, max }
        }
        _ => return Err(unknown_operator(group, op, CONTENT_OPS)),
    })
}

fn slide_numbers(value: &Value) -> Result<Vec<i64>, ValidationError> {
    let expected = "array of positive integers";
    let items = value
        .as_array()
        .ok_or_else(|| invalid_value("slide_numbers", "", expected, value))?;
    items
        .iter()
        .map(|item| {
            item.as_i64()
                .filter(|n| *n >= 1)
                .ok_or_else(|| invalid_value("slide_numbers", "", expected, item))
        })
        .collect()
}

fn has_tables(slide: &Slide) -> bool {
    !slide.tables.is_empty() || slide.object_counts.tables > 0
}

/// Fields a query can project per matching slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnField {
    SlideNumber,
    Title,
    Subtitle,
    Layout,
    Section,
    Notes,
    ObjectCounts,
    PreviewText,
    TableInfo,
    FullContent,
}

impl ReturnField {
    pub const ALL: [ReturnField; 10] = [
        ReturnField::SlideNumber,
        ReturnField::Title,
        ReturnField::Subtitle,
        ReturnField::Layout,
        ReturnField::Section,
        ReturnField::Notes,
        ReturnField::ObjectCounts,
        ReturnField::PreviewText,
        ReturnField::TableInfo,
        ReturnField::FullContent,
    ];

    pub const DEFAULT: [ReturnField; 3] = [
        ReturnField::SlideNumber,
        ReturnField::Title,
        ReturnField::ObjectCounts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnField::SlideNumber => "slide_number",
            ReturnField::Title => "title",
            ReturnField::Subtitle => "subtitle",
            ReturnField::Layout => "layout",
            ReturnField::Section => "section",
            ReturnField::Notes => "notes",
            ReturnField::ObjectCounts => "object_counts",
            ReturnField::PreviewText => "preview_text",
            ReturnField::TableInfo => "table_info",
            ReturnField::FullContent => "full_content",
        }
    }

    /// Parse requested names; `None` yields the default projection.
    pub fn parse_list<S: AsRef<str>>(names: Option<&[S]>) -> Result<Vec<ReturnField>, ValidationError> {
        match names {
            None => Ok(Self::DEFAULT.to_vec()),
            Some(names) => {
                let mut fields = Vec::new();
                for name in names {
                    let field: ReturnField = name.as_ref().parse()?;
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                Ok(fields)
            }
        }
    }
}

impl fmt::Display for ReturnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownReturnField {
                field: s.to_string(),
                allowed: Self::ALL.map(|f| f.as_str()).join(", "),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub layout_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub table_index: usize,
    pub rows: usize,
    pub columns: usize,
    pub headers: Vec<String>,
}

impl TableInfo {
    fn from_table(table_index: usize, table: &Table) -> Self {
        Self {
            table_index,
            rows: table.rows,
            columns: table.columns,
            headers: if table.rows > 0 {
                table.header_names()
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub layout_name: Option<String>,
    pub layout_type: Option<String>,
    pub text_elements: Vec<TextElement>,
    pub tables: Vec<Table>,
    pub object_counts: ObjectCounts,
}

/// One matching slide, carrying only the requested fields.
///
/// A requested but absent value serializes as `null`; an unrequested one is omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideMatch {
    pub slide_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_counts: Option<ObjectCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_info: Option<Vec<TableInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<FullContent>,
}

impl SlideMatch {
    fn project(slide: &Slide, fields: &[ReturnField]) -> Self {
        let mut m = SlideMatch {
            slide_number: slide.number,
            title: None,
            subtitle: None,
            layout: None,
            section: None,
            notes: None,
            object_counts: None,
            preview_text: None,
            table_info: None,
            full_content: None,
        };
        for field in fields {
            match field {
                ReturnField::SlideNumber => {}
                ReturnField::Title => m.title = Some(slide.title.clone()),
                ReturnField::Subtitle => m.subtitle = Some(slide.subtitle.clone()),
                ReturnField::Layout => {
                    m.layout = Some(LayoutInfo {
                        name: slide.layout_name.clone(),
                        layout_type: slide.layout_type.clone(),
                    })
                }
                ReturnField::Section => m.section = Some(slide.section.clone()),
                ReturnField::Notes => m.notes = Some(slide.notes.clone()),
                ReturnField::ObjectCounts => m.object_counts = Some(slide.object_counts),
                ReturnField::PreviewText => m.preview_text = Some(preview_text(slide)),
                ReturnField::TableInfo => {
                    m.table_info = Some(
                        slide
                            .tables
                            .iter()
                            .enumerate()
                            .map(|(i, t)| TableInfo::from_table(i, t))
                            .collect(),
                    )
                }
                ReturnField::FullContent => {
                    m.full_content = Some(FullContent {
                        title: slide.title.clone(),
                        subtitle: slide.subtitle.clone(),
                        layout_name: slide.layout_name.clone(),
                        layout_type: slide.layout_type.clone(),
                        text_elements: slide.text_elements.clone(),
                        tables: slide.tables.clone(),
                        object_counts: slide.object_counts,
                    })
                }
            }
        }
        m
    }
}

const PREVIEW_ELEMENTS: usize = 3;
const PREVIEW_CHARS: usize = 100;

/// Title plus the first few body text elements, each shortened.
fn preview_text(slide: &Slide) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &slide.title {
        parts.push(format!("Title: {title}"));
    }
    let body = slide
        .text_elements
        .iter()
        .filter(|e| !matches!(e.placeholder.as_deref(), Some("title" | "ctrTitle")))
        .map(|e| e.complete_text().trim().to_string())
        .filter(|t| !t.is_empty())
        .take(PREVIEW_ELEMENTS);
    for (i, text) in body.enumerate() {
        let text = if text.chars().count() > PREVIEW_CHARS {
            let cut: String = text.chars().take(PREVIEW_CHARS - 3).collect();
            format!("{cut}...")
        } else {
            text
        };
        parts.push(format!("Text {}: {}", i + 1, text));
    }
    parts.join(" | ")
}

/// Matching slides in ascending slide order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub matches: Vec<SlideMatch>,
    /// Matches before the limit was applied.
    pub total_matches: usize,
}

/// Evaluate validated criteria over `slides` and project `fields`.
///
/// `slide_numbers` in the criteria are range-checked against the
/// presentation before any slide is evaluated. A `limit` of 0 means no limit.
pub fn query(
    presentation: &Presentation,
    criteria: &ValidatedCriteria,
    fields: &[ReturnField],
    slides: &[usize],
    limit: usize,
) -> Result<QueryResult, ValidationError> {
    let total = presentation.slide_count();
    if let Some(numbers) = &criteria.slide_numbers {
        if let Some(&n) = numbers.iter().find(|&&n| n as usize > total) {
            return Err(ValidationError::SlideOutOfRange { number: n, total });
        }
    }

    let matching: Vec<&Slide> = presentation
        .slides_in(slides)
        .filter(|slide| criteria.matches(slide))
        .collect();
    let total_matches = matching.len();
    let take = if limit == 0 { total_matches } else { limit };

    log::debug!("Query matched {} of {} slides", total_matches, slides.len());

    Ok(QueryResult {
        matches: matching
            .into_iter()
            .take(take)
            .map(|slide| SlideMatch::project(slide, fields))
            .collect(),
        total_matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{RawCell, RawTable};
    use crate::types::Run;
    use serde_json::json;

    fn slide(number: usize, title: Option<&str>) -> Slide {
        let mut slide = Slide::new(number, format!("ppt/slides/slide{number}.xml"));
        slide.title = title.map(str::to_string);
        slide
    }

    fn with_table(mut slide: Slide) -> Slide {
        let raw = RawTable {
            rows: vec![vec![RawCell::new(TextElement::from_runs(vec![Run::plain("Metric")]))]],
            column_count: 1,
        };
        slide.tables.push(Table::from_raw(raw).0);
        slide.object_counts.tables = 1;
        slide
    }

    /// Slide 1 "Q1 Preview" without table, 2 "Agenda" with table, 3 "Q1 Review" with table.
    fn deck() -> Presentation {
        let mut p = Presentation::new("fp");
        let mut first = slide(1, Some("Q1 Preview"));
        first.notes = Some("Remember the budget".to_string());
        first.section = Some("Intro".to_string());
        p.add_slide(first);
        let mut second = with_table(slide(2, Some("Agenda")));
        second.layout_name = Some("Title and Content".to_string());
        second.layout_type = Some("obj".to_string());
        p.add_slide(second);
        p.add_slide(with_table(slide(3, Some("Q1 Review"))));
        p.add_slide(slide(4, None));
        p
    }

    fn run(criteria: Value) -> Result<Vec<usize>, ValidationError> {
        let p = deck();
        let criteria = ValidatedCriteria::parse(&criteria)?;
        let all: Vec<usize> = (1..=p.slide_count()).collect();
        let result = query(&p, &criteria, &ReturnField::DEFAULT, &all, 0)?;
        Ok(result.matches.iter().map(|m| m.slide_number).collect())
    }

    #[test]
    fn test_title_and_tables_scenario() {
        let matches = run(json!({"title": {"contains": "Q1"}, "content": {"has_tables": true}}));
        assert_eq!(matches.unwrap(), vec![3]);
    }

    #[test]
    fn test_empty_criteria_matches_everything() {
        assert_eq!(run(json!({})).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_malformed_criteria_is_rejected() {
        let cases = [
            json!("title"),
            json!({"titel": {"contains": "Q1"}}),
            json!({"title": {"containz": "Q1"}}),
            json!({"title": {"contains": 5}}),
            json!({"title": {"regex": "(unclosed"}}),
            json!({"title": {"one_of": []}}),
            json!({"content": {"has_tables": "yes"}}),
            json!({"content": {"object_count": {"least": 1}}}),
            json!({"notes": "budget"}),
            json!({"slide_numbers": [0]}),
            json!({"title": {"contains": "Q1"}, "bogus": true}),
        ];
        for criteria in cases {
            assert!(run(criteria.clone()).is_err(), "accepted {criteria}");
        }
    }

    #[test]
    fn test_absent_title_only_matches_exists_false() {
        assert_eq!(run(json!({"title": {"exists": false}})).unwrap(), vec![4]);
        assert_eq!(run(json!({"title": {"ends_with": "w"}})).unwrap(), vec![1, 3]);
        assert_eq!(
            run(json!({"title": {"one_of": ["agenda", "nothing"]}})).unwrap(),
            vec![2]
        );
        assert_eq!(run(json!({"title": {"regex": "^q\\d re"}})).unwrap(), vec![3]);
    }

    #[test]
    fn test_section_notes_and_layout() {
        assert_eq!(run(json!({"section": "intro"})).unwrap(), vec![1]);
        assert_eq!(run(json!({"section": {"contains": "TR"}})).unwrap(), vec![1]);
        assert_eq!(run(json!({"notes": {"contains": "BUDGET"}})).unwrap(), vec![1]);
        assert_eq!(run(json!({"notes": {"is_empty": true}})).unwrap(), vec![2, 3, 4]);
        assert_eq!(run(json!({"layout": {"name": "content", "type": "OBJ"}})).unwrap(), vec![2]);
    }

    #[test]
    fn test_slide_numbers_group() {
        assert_eq!(run(json!({"slide_numbers": [2, 4]})).unwrap(), vec![2, 4]);
        assert_eq!(
            run(json!({"slide_numbers": [7]})),
            Err(ValidationError::SlideOutOfRange { number: 7, total: 4 })
        );
    }

    #[test]
    fn test_limit_and_total() {
        let p = deck();
        let criteria = ValidatedCriteria::parse(&json!({})).unwrap();
        let result = query(&p, &criteria, &[ReturnField::Title], &[1, 2, 3, 4], 2).unwrap();
        assert_eq!(result.total_matches, 4);
        assert_eq!(result.matches.len(), 2);
    }

    #[test]
    fn test_projection_includes_only_requested_fields() {
        let p = deck();
        let criteria = ValidatedCriteria::parse(&json!({"slide_numbers": [4]})).unwrap();
        let fields = ReturnField::parse_list(Some(&["title", "table_info"][..])).unwrap();
        let result = query(&p, &criteria, &fields, &[1, 2, 3, 4], 0).unwrap();

        let json = serde_json::to_value(&result.matches[0]).unwrap();
        assert_eq!(json["slide_number"], 4);
        assert!(json["title"].is_null());
        assert!(json.get("title").is_some());
        assert_eq!(json["table_info"], json!([]));
        assert!(json.get("object_counts").is_none());
    }

    #[test]
    fn test_unknown_return_field() {
        let err = ReturnField::parse_list(Some(&["title", "colour"][..])).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownReturnField { .. }));
        assert_eq!(ReturnField::parse_list::<&str>(None).unwrap(), ReturnField::DEFAULT.to_vec());
    }

    #[test]
    fn test_preview_text_truncates() {
        let mut s = slide(1, Some("Intro"));
        s.text_elements
            .push(TextElement::from_runs(vec![Run::plain("x".repeat(150))]));
        let preview = preview_text(&s);
        assert!(preview.starts_with("Title: Intro | Text 1: "));
        assert!(preview.ends_with("..."));
    }
}
