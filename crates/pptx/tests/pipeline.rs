//! Build real packages in memory and drive extraction and queries end to end.

mod common;

use common::{cell, layout_xml, notes_xml, shape, table, title, Deck, Rel};
use deck_core::{
    extract_formatting, extract_tables, query, Error, FormatError, FormattingKind, LinkType,
    ReturnField, SlideSelection, TableRequest, ValidatedCriteria, ValidationError,
    WarningKind,
};
use deck_pptx::PptxParser;
use serde_json::json;

fn parse(bytes: &[u8]) -> deck_core::Presentation {
    PptxParser::new().parse(bytes).unwrap()
}

#[test]
fn test_slide_numbers_follow_numeric_part_order() {
    let bytes = Deck::new()
        .slide(10, &title("Ten"), vec![])
        .slide(2, &title("Two"), vec![])
        .slide(1, &title("One"), vec![])
        .slide(11, &title("Eleven"), vec![])
        .slide(3, &title("Three"), vec![])
        .build();

    let p = parse(&bytes);

    let titles: Vec<&str> = p.slides.iter().filter_map(|s| s.title.as_deref()).collect();
    assert_eq!(titles, vec!["One", "Two", "Three", "Ten", "Eleven"]);
    assert_eq!(p.slide(4).unwrap().part_name, "ppt/slides/slide10.xml");
    for (i, slide) in p.slides.iter().enumerate() {
        assert_eq!(slide.number, i + 1);
    }
}

#[test]
fn test_build_is_idempotent() {
    let bytes = Deck::new()
        .slide(1, &title("Same"), vec![])
        .slide(2, &table(1, &[&cell("x", "")]), vec![])
        .build();

    assert_eq!(parse(&bytes), parse(&bytes));
}

#[test]
fn test_query_title_and_table_scenario() {
    let table_xml = table(2, &[&format!("{}{}", cell("Metric", ""), cell("Value", ""))]);
    let bytes = Deck::new()
        .slide(1, &title("Q1 Preview"), vec![])
        .slide(2, &format!("{}{}", title("Agenda"), table_xml), vec![])
        .slide(3, &format!("{}{}", title("Q1 Review"), table_xml), vec![])
        .build();
    let p = parse(&bytes);

    let criteria =
        ValidatedCriteria::parse(&json!({"title": {"contains": "Q1"}, "content": {"has_tables": true}}))
            .unwrap();
    let slides = SlideSelection::All.resolve(p.slide_count()).unwrap().slides;
    let result = query(&p, &criteria, &ReturnField::DEFAULT, &slides, 50).unwrap();

    let numbers: Vec<usize> = result.matches.iter().map(|m| m.slide_number).collect();
    assert_eq!(numbers, vec![3]);
    assert_eq!(result.total_matches, 1);
}

#[test]
fn test_invalid_criteria_never_matches_everything() {
    let bytes = Deck::new().slide(1, &title("Only"), vec![]).build();
    let p = parse(&bytes);

    let err = ValidatedCriteria::parse(&json!({"title": {"contians": "x"}})).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownOperator { .. }));

    let criteria = ValidatedCriteria::parse(&json!({"slide_numbers": [2]})).unwrap();
    assert!(query(&p, &criteria, &ReturnField::DEFAULT, &[1], 0).is_err());
}

#[test]
fn test_formatting_offsets_and_unresolved_hyperlink() {
    let paragraph = r#"<a:p>
<a:r><a:rPr lang="en-US"/><a:t>Hello </a:t></a:r>
<a:r><a:rPr lang="en-US" b="1"/><a:t>world</a:t></a:r>
<a:r><a:rPr lang="en-US"/><a:t>, visit </a:t></a:r>
<a:r><a:rPr lang="en-US"><a:hlinkClick r:id="rId9"/></a:rPr><a:t>us</a:t></a:r>
</a:p>"#;
    let bytes = Deck::new()
        .slide(1, &shape("Body", None, paragraph), vec![])
        .build();
    let p = parse(&bytes);

    let bold = extract_formatting(&p, &[1], FormattingKind::Bold);
    let element = &bold.results_by_slide[0].elements[0];
    assert_eq!(element.complete_text, "Hello world, visit us");
    let segment = &element.segments[0];
    assert_eq!((segment.start, segment.end, segment.text.as_str()), (6, 11, "world"));

    let links = extract_formatting(&p, &[1], FormattingKind::Hyperlinks);
    let segment = &links.results_by_slide[0].elements[0].segments[0];
    assert_eq!((segment.start, segment.end), (19, 21));
    let target = segment.hyperlink.as_ref().unwrap();
    assert_eq!(target.url, None);

    assert_eq!(p.warnings.len(), 1);
    assert_eq!(p.warnings[0].kind, WarningKind::UnresolvedHyperlink);
    assert_eq!(p.warnings[0].slide_number, Some(1));
}

#[test]
fn test_external_hyperlink_resolves() {
    let paragraph = r#"<a:p><a:r><a:rPr><a:hlinkClick r:id="rId2"/></a:rPr><a:t>docs</a:t></a:r></a:p>"#;
    let bytes = Deck::new()
        .slide(
            1,
            &shape("Body", None, paragraph),
            vec![Rel::external("rId2", "hyperlink", "https://example.com/docs")],
        )
        .build();
    let p = parse(&bytes);

    let links = extract_formatting(&p, &[1], FormattingKind::Hyperlinks);
    let target = links.results_by_slide[0].elements[0].segments[0]
        .hyperlink
        .clone()
        .unwrap();
    assert_eq!(target.url.as_deref(), Some("https://example.com/docs"));
    assert_eq!(target.link_type, LinkType::External);
    assert!(p.warnings.is_empty());
}

#[test]
fn test_one_url_through_two_relationships_is_one_segment() {
    let paragraph = r#"<a:p>
<a:r><a:rPr><a:hlinkClick r:id="rId2"/></a:rPr><a:t>click </a:t></a:r>
<a:r><a:rPr><a:hlinkClick r:id="rId3"/></a:rPr><a:t>here</a:t></a:r>
<a:r><a:rPr/><a:t> now</a:t></a:r>
</a:p>"#;
    let bytes = Deck::new()
        .slide(
            1,
            &shape("Body", None, paragraph),
            vec![
                Rel::external("rId2", "hyperlink", "https://example.com/docs"),
                Rel::external("rId3", "hyperlink", "https://example.com/docs"),
            ],
        )
        .build();
    let p = parse(&bytes);

    let links = extract_formatting(&p, &[1], FormattingKind::Hyperlinks);
    let segments = &links.results_by_slide[0].elements[0].segments;
    assert_eq!(segments.len(), 1);
    assert_eq!((segments[0].start, segments[0].end), (0, 10));
    assert_eq!(segments[0].text, "click here");
    assert_eq!(
        segments[0].hyperlink.as_ref().unwrap().url.as_deref(),
        Some("https://example.com/docs")
    );
}

#[test]
fn test_notes_follow_relationship_not_index() {
    let bytes = Deck::new()
        .slide(
            1,
            &title("With notes"),
            vec![Rel::internal("rId2", "notesSlide", "../notesSlides/notesSlide7.xml")],
        )
        .slide(2, &title("Without notes"), vec![])
        .part("ppt/notesSlides/notesSlide7.xml", notes_xml("Speak slowly"))
        .part("ppt/notesSlides/notesSlide2.xml", notes_xml("Wrong slide"))
        .build();
    let p = parse(&bytes);

    assert_eq!(p.slide(1).unwrap().notes.as_deref(), Some("Speak slowly"));
    assert_eq!(p.slide(2).unwrap().notes, None);

    let criteria = ValidatedCriteria::parse(&json!({"notes": {"is_empty": true}})).unwrap();
    let result = query(&p, &criteria, &[ReturnField::Notes], &[1, 2], 0).unwrap();
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].slide_number, 2);
}

#[test]
fn test_layout_and_missing_parts_warn() {
    let bytes = Deck::new()
        .slide(
            1,
            &title("Laid out"),
            vec![Rel::internal("rId1", "slideLayout", "../slideLayouts/slideLayout2.xml")],
        )
        .slide(
            2,
            &title("Dangling"),
            vec![
                Rel::internal("rId1", "slideLayout", "../slideLayouts/slideLayout9.xml"),
                Rel::internal("rId2", "notesSlide", "../notesSlides/notesSlide9.xml"),
            ],
        )
        .part("ppt/slideLayouts/slideLayout2.xml", layout_xml("Title and Content", "obj"))
        .build();
    let p = parse(&bytes);

    let first = p.slide(1).unwrap();
    assert_eq!(first.layout_name.as_deref(), Some("Title and Content"));
    assert_eq!(first.layout_type.as_deref(), Some("obj"));

    let kinds: Vec<WarningKind> = p.warnings_for(2).map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::MissingLayout, WarningKind::MissingNotes]);
    assert_eq!(p.slide(2).unwrap().layout_name, None);
}

#[test]
fn test_sections_assign_slides() {
    let bytes = Deck::new()
        .slide(1, &title("a"), vec![])
        .slide(2, &title("b"), vec![])
        .slide(3, &title("c"), vec![])
        .section("Opening", vec![1])
        .section("Details", vec![2, 3])
        .build();
    let p = parse(&bytes);

    assert_eq!(p.sections.len(), 2);
    assert_eq!(p.sections[1].slide_numbers, vec![2, 3]);
    assert_eq!(p.slide(3).unwrap().section.as_deref(), Some("Details"));

    let criteria = ValidatedCriteria::parse(&json!({"section": "details"})).unwrap();
    let result = query(&p, &criteria, &ReturnField::DEFAULT, &[1, 2, 3], 0).unwrap();
    assert_eq!(result.total_matches, 2);
}

#[test]
fn test_merged_table_extraction() {
    let rows = [
        format!("{}{}", cell("Region", ""), cell("Sales", "")),
        format!("{}{}", cell("North", r#"rowSpan="2""#), cell("10", "")),
        format!("{}{}", cell("", r#"vMerge="1""#), cell("20", "")),
    ];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let bytes = Deck::new().slide(1, &table(2, &rows), vec![]).build();
    let p = parse(&bytes);

    let grid = &p.slide(1).unwrap().tables[0];
    let content = grid.content_cells().count();
    assert_eq!((grid.rows, grid.columns), (3, 2));
    assert_eq!(content + 1, grid.rows * grid.columns);

    let request = TableRequest::default().validate().unwrap();
    let extraction = extract_tables(&p, &[1], &request);
    let values: Vec<(usize, usize, String)> = extraction.tables[0]
        .data
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| (c.row, c.col, c.value.clone()))
        .collect();
    assert_eq!(
        values,
        vec![
            (1, 0, "North".to_string()),
            (1, 1, "10".to_string()),
            (2, 1, "20".to_string()),
        ]
    );

    let html_request = TableRequest {
        output_format: Some("html".to_string()),
        ..TableRequest::default()
    }
    .validate()
    .unwrap();
    let html = extract_tables(&p, &[1], &html_request).tables[0].html.clone().unwrap();
    assert!(html.contains(r#"<td rowspan="2">North</td>"#));
}

#[test]
fn test_column_and_row_spans_together() {
    let rows = [
        format!("{}{}{}", cell("Region", ""), cell("Q1", ""), cell("Q2", "")),
        format!(
            "{}{}{}",
            cell("Total", r#"gridSpan="2""#),
            cell("", r#"hMerge="1""#),
            cell("9", "")
        ),
        format!(
            "{}{}{}",
            cell("North", r#"gridSpan="2" rowSpan="2""#),
            cell("", r#"hMerge="1""#),
            cell("5", "")
        ),
        format!(
            "{}{}{}",
            cell("", r#"vMerge="1""#),
            cell("", r#"hMerge="1" vMerge="1""#),
            cell("6", "")
        ),
    ];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let bytes = Deck::new().slide(1, &table(3, &rows), vec![]).build();
    let p = parse(&bytes);

    let grid = &p.slide(1).unwrap().tables[0];
    assert_eq!((grid.rows, grid.columns), (4, 3));
    assert_eq!(grid.content_cells().count(), 8);
    assert!(p.warnings.is_empty());

    let request = TableRequest::default().validate().unwrap();
    let extraction = extract_tables(&p, &[1], &request);
    let values: Vec<(usize, usize, String)> = extraction.tables[0]
        .data
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| (c.row, c.col, c.value.clone()))
        .collect();
    assert_eq!(
        values,
        vec![
            (1, 0, "Total".to_string()),
            (1, 2, "9".to_string()),
            (2, 0, "North".to_string()),
            (2, 2, "5".to_string()),
            (3, 2, "6".to_string()),
        ]
    );

    let html_request = TableRequest {
        output_format: Some("html".to_string()),
        ..TableRequest::default()
    }
    .validate()
    .unwrap();
    let html = extract_tables(&p, &[1], &html_request).tables[0].html.clone().unwrap();
    assert!(html.contains(r#"<tr><td colspan="2">Total</td><td>9</td></tr>"#));
    assert!(html.contains(r#"<td rowspan="2" colspan="2">North</td><td>5</td>"#));
    assert!(html.contains("<tr><td>6</td></tr>"));
}

#[test]
fn test_unknown_table_options_fail_validation() {
    let err = TableRequest {
        formatting: vec!["bold".to_string(), "sparkly".to_string()],
        ..TableRequest::default()
    }
    .validate()
    .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownFormattingKind { ref kind, .. } if kind == "sparkly"));

    let err = TableRequest {
        output_format: Some("csv".to_string()),
        ..TableRequest::default()
    }
    .validate()
    .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownOutputFormat { ref format, .. } if format == "csv"));
}

#[test]
fn test_slide_selection_against_built_deck() {
    let bytes = Deck::new()
        .slide(1, &title("a"), vec![])
        .slide(2, &title("b"), vec![])
        .slide(3, &title("c"), vec![])
        .build();
    let p = parse(&bytes);

    let past_end = SlideSelection::Expression("5:".into()).resolve(p.slide_count()).unwrap();
    assert!(past_end.slides.is_empty());
    assert!(!past_end.notes.is_empty());

    assert_eq!(
        SlideSelection::Single(4).resolve(p.slide_count()),
        Err(ValidationError::SlideOutOfRange { number: 4, total: 3 })
    );
}

#[test]
fn test_slide_size_is_read() {
    let bytes = Deck::new().slide(1, &title("a"), vec![]).build();
    let size = parse(&bytes).slide_size.unwrap();
    assert_eq!((size.width_emu, size.height_emu), (12_192_000, 6_858_000));
    assert_eq!(size.aspect_ratio, 1.78);
}

#[test]
fn test_missing_presentation_part() {
    let bytes = Deck::new()
        .slide(1, &title("a"), vec![])
        .without_presentation()
        .build();
    let err = PptxParser::new().parse(&bytes).unwrap_err();
    assert!(matches!(err, Error::Format(FormatError::MissingPart(ref p)) if p == "ppt/presentation.xml"));
}

#[test]
fn test_malformed_slide_fails_whole_build() {
    let bytes = Deck::new()
        .slide(1, &title("fine"), vec![])
        .raw_slide(2, "<p:sld><p:cSld>")
        .build();
    let err = PptxParser::new().parse(&bytes).unwrap_err();
    assert!(matches!(
        err,
        Error::Format(FormatError::MalformedXml { ref part, .. }) if part == "ppt/slides/slide2.xml"
    ));
}
