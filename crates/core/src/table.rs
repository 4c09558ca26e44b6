//! Table grids with merged-cell handling, column selection and rendering.
//!
//! A parser backend hands over [`RawTable`]s exactly as declared in the
//! source markup. [`Table::from_raw`] lays them out into a dense grid where
//! every position is either a content cell or a placeholder covered by a
//! spanning cell above or to the left. Both output renderings are produced
//! from the same selected view of that grid.

use crate::error::ValidationError;
use crate::formatting::{segments_by_kind, FormattedSegment, FormattingKind};
use crate::types::{Presentation, TextElement};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Range;
use std::str::FromStr;

/// A cell definition as declared in the source markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCell {
    pub content: TextElement,
    pub row_span: usize,
    pub col_span: usize,
    /// Continuation of a horizontal merge from the left.
    pub h_merge: bool,
    /// Continuation of a vertical merge from above.
    pub v_merge: bool,
    pub background: Option<String>,
}

impl RawCell {
    /// A plain single-position cell.
    pub fn new(content: TextElement) -> Self {
        Self {
            content,
            row_span: 1,
            col_span: 1,
            ..Self::default()
        }
    }

    /// Builder: set spans.
    pub fn with_span(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }

    /// A merge-continuation placeholder.
    pub fn continuation(horizontal: bool) -> Self {
        Self {
            row_span: 1,
            col_span: 1,
            h_merge: horizontal,
            v_merge: !horizontal,
            ..Self::default()
        }
    }

    fn is_continuation(&self) -> bool {
        self.h_merge || self.v_merge
    }
}

/// A table as declared: rows of cells plus the declared column count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<RawCell>>,
    /// Number of grid columns declared by the table, 0 if unknown.
    pub column_count: usize,
}

/// A content cell in the logical grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub content: TextElement,
    pub row_span: usize,
    pub col_span: usize,
    pub background: Option<String>,
}

impl TableCell {
    fn empty() -> Self {
        Self {
            content: TextElement::default(),
            row_span: 1,
            col_span: 1,
            background: None,
        }
    }

    /// Plain cell text.
    pub fn text(&self) -> String {
        self.content.complete_text()
    }
}

/// One position of the logical grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridCell {
    Content(TableCell),
    /// Covered by the spanning content cell at the origin position.
    Covered { origin_row: usize, origin_col: usize },
}

/// A dense R x C grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: usize,
    pub columns: usize,
    pub grid: Vec<Vec<GridCell>>,
}

impl Table {
    /// Lay out a declared table into a dense grid.
    ///
    /// Returns the grid and the positions of merge-continuation cells that
    /// had no spanning origin; those are kept as plain content cells.
    pub fn from_raw(raw: RawTable) -> (Self, Vec<(usize, usize)>) {
        let row_count = raw.rows.len();
        let mut slots: Vec<Vec<Option<GridCell>>> = vec![Vec::new(); row_count];
        let mut orphans = Vec::new();

        for (r, row) in raw.rows.into_iter().enumerate() {
            let mut c = 0;
            for cell in row {
                if cell.is_continuation() {
                    match slot(&slots, r, c) {
                        Some(GridCell::Covered { .. }) => {
                            c += 1;
                            continue;
                        }
                        _ => orphans.push((r, c)),
                    }
                }

                while slot(&slots, r, c).is_some() {
                    c += 1;
                }

                let row_span = cell.row_span.max(1).min(row_count - r);
                let col_span = cell.col_span.max(1);
                for dr in 0..row_span {
                    for dc in 0..col_span {
                        if (dr, dc) != (0, 0) && slot(&slots, r + dr, c + dc).is_none() {
                            put(
                                &mut slots,
                                r + dr,
                                c + dc,
                                GridCell::Covered {
                                    origin_row: r,
                                    origin_col: c,
                                },
                            );
                        }
                    }
                }
                put(
                    &mut slots,
                    r,
                    c,
                    GridCell::Content(TableCell {
                        content: cell.content,
                        row_span,
                        col_span,
                        background: cell.background,
                    }),
                );
                c += 1;
            }
        }

        let columns = slots
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(raw.column_count);

        // Ragged rows are padded with empty cells so every position is owned.
        let grid = slots
            .into_iter()
            .map(|row| {
                let mut row: Vec<GridCell> = row
                    .into_iter()
                    .map(|s| s.unwrap_or_else(|| GridCell::Content(TableCell::empty())))
                    .collect();
                row.resize_with(columns, || GridCell::Content(TableCell::empty()));
                row
            })
            .collect();

        (
            Self {
                rows: row_count,
                columns,
                grid,
            },
            orphans,
        )
    }

    /// The grid position, if inside the table.
    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.grid.get(row).and_then(|r| r.get(col))
    }

    /// The content cell owning a position and that cell's origin.
    pub fn owner(&self, row: usize, col: usize) -> Option<(&TableCell, (usize, usize))> {
        match self.cell(row, col)? {
            GridCell::Content(cell) => Some((cell, (row, col))),
            GridCell::Covered {
                origin_row,
                origin_col,
            } => match self.cell(*origin_row, *origin_col)? {
                GridCell::Content(cell) => Some((cell, (*origin_row, *origin_col))),
                GridCell::Covered { .. } => None,
            },
        }
    }

    /// All content cells in row-major order.
    pub fn content_cells(&self) -> impl Iterator<Item = &TableCell> {
        self.grid.iter().flatten().filter_map(|c| match c {
            GridCell::Content(cell) => Some(cell),
            GridCell::Covered { .. } => None,
        })
    }

    /// Column names taken from the first row; covered header positions
    /// inherit their origin's text, blanks become `Column N`.
    pub fn header_names(&self) -> Vec<String> {
        (0..self.columns)
            .map(|col| {
                let text = self
                    .owner(0, col)
                    .map(|(cell, _)| cell.text().trim().to_string())
                    .unwrap_or_default();
                if text.is_empty() {
                    format!("Column {}", col + 1)
                } else {
                    text
                }
            })
            .collect()
    }
}

fn slot(slots: &[Vec<Option<GridCell>>], r: usize, c: usize) -> Option<&GridCell> {
    slots.get(r).and_then(|row| row.get(c)).and_then(Option::as_ref)
}

fn put(slots: &mut [Vec<Option<GridCell>>], r: usize, c: usize, cell: GridCell) {
    let row = &mut slots[r];
    if row.len() <= c {
        row.resize_with(c + 1, || None);
    }
    row[c] = Some(cell);
}

/// Which tables to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableCriteria {
    pub min_rows: Option<usize>,
    pub max_rows: Option<usize>,
    pub min_columns: Option<usize>,
    pub max_columns: Option<usize>,
    /// Each entry must occur (case-insensitively) in some header.
    pub header_contains: Vec<String>,
}

impl TableCriteria {
    fn matches(&self, table: &Table, headers: &[String]) -> bool {
        let within = |value: usize, min: Option<usize>, max: Option<usize>| {
            min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
        };
        within(table.rows, self.min_rows, self.max_rows)
            && within(table.columns, self.min_columns, self.max_columns)
            && self.header_contains.iter().all(|needle| {
                let needle = needle.to_lowercase();
                headers.iter().any(|h| h.to_lowercase().contains(&needle))
            })
    }
}

/// Which columns to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSelection {
    /// Exact header names, case-insensitive.
    pub specific_columns: Vec<String>,
    /// Regular expressions matched case-insensitively against headers.
    pub column_patterns: Vec<String>,
    /// Exact header names to drop, applied last.
    pub exclude_columns: Vec<String>,
}

/// Table rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    RowColValue,
    Html,
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "row_col_value" => Ok(Self::RowColValue),
            "html" => Ok(Self::Html),
            _ => Err(ValidationError::UnknownOutputFormat {
                format: s.to_string(),
                allowed: "row_col_value, html".to_string(),
            }),
        }
    }
}

/// A table extraction request as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableRequest {
    pub criteria: TableCriteria,
    pub columns: ColumnSelection,
    /// Caller-supplied column names; every grid row then counts as data.
    pub column_names: Option<Vec<String>>,
    /// Formatting kinds to detect per cell, by name.
    pub formatting: Vec<String>,
    /// `row_col_value` (default) or `html`.
    pub output_format: Option<String>,
}

/// A request whose kinds, format and patterns have been checked.
#[derive(Debug, Clone)]
pub struct ValidTableRequest {
    request: TableRequest,
    kinds: Vec<FormattingKind>,
    output_format: OutputFormat,
    patterns: Vec<Regex>,
}

impl TableRequest {
    /// Parse formatting kinds and output format and compile column patterns.
    /// The first invalid value rejects the request.
    pub fn validate(self) -> Result<ValidTableRequest, ValidationError> {
        let mut kinds = Vec::new();
        for name in &self.formatting {
            let kind: FormattingKind = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        let output_format = match self.output_format.as_deref() {
            Some(name) => name.parse()?,
            None => OutputFormat::default(),
        };

        let patterns = self
            .columns
            .column_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ValidationError::InvalidRegex {
                        context: "columns.column_patterns".to_string(),
                        pattern: p.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ValidTableRequest {
            request: self,
            kinds,
            output_format,
            patterns,
        })
    }
}

impl ValidTableRequest {
    /// The validated request.
    pub fn request(&self) -> &TableRequest {
        &self.request
    }

    pub fn formatting(&self) -> &[FormattingKind] {
        &self.kinds
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    fn select_columns(&self, headers: &[String]) -> Vec<usize> {
        let selection = &self.request.columns;
        let mut selected: Vec<usize> = if !selection.specific_columns.is_empty() {
            (0..headers.len())
                .filter(|&i| {
                    selection
                        .specific_columns
                        .iter()
                        .any(|name| name.trim().eq_ignore_ascii_case(headers[i].trim()))
                })
                .collect()
        } else if !self.patterns.is_empty() {
            (0..headers.len())
                .filter(|&i| self.patterns.iter().any(|re| re.is_match(&headers[i])))
                .collect()
        } else {
            (0..headers.len()).collect()
        };

        selected.retain(|&i| {
            !selection
                .exclude_columns
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case(headers[i].trim()))
        });
        selected
    }
}

/// A content cell as it appears in a selected view.
struct VisibleCell<'a> {
    row: usize,
    /// Position among the selected columns.
    col: usize,
    cell: &'a TableCell,
    row_span: usize,
    col_span: usize,
}

/// A grid restricted to some rows and selected columns.
struct GridView<'a> {
    table: &'a Table,
    columns: &'a [usize],
}

impl<'a> GridView<'a> {
    /// Content cells visible in `rows`, each emitted once at its first
    /// visible position with spans clipped to the view.
    fn visible_cells(&self, rows: Range<usize>) -> Vec<VisibleCell<'a>> {
        let mut out = Vec::new();
        for r in rows.clone() {
            for (pos, &c) in self.columns.iter().enumerate() {
                let Some((cell, (origin_row, origin_col))) = self.table.owner(r, c) else {
                    continue;
                };
                let first_row = origin_row.max(rows.start);
                let col_range = origin_col..origin_col + cell.col_span;
                let first_col = self.columns.iter().position(|sc| col_range.contains(sc));
                if r != first_row || first_col != Some(pos) {
                    continue;
                }
                let row_end = (origin_row + cell.row_span).min(rows.end);
                out.push(VisibleCell {
                    row: r,
                    col: pos,
                    cell,
                    row_span: row_end - first_row,
                    col_span: self.columns.iter().filter(|sc| col_range.contains(sc)).count(),
                });
            }
        }
        out
    }
}

/// One emitted cell of the triple rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellValue {
    /// Logical grid row.
    pub row: usize,
    /// Position among the selected columns.
    pub col: usize,
    pub value: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub formatting: BTreeMap<FormattingKind, Vec<FormattedSegment>>,
}

/// One extracted table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedTable {
    pub slide_number: usize,
    pub table_index: usize,
    /// Data rows (header row excluded).
    pub rows: usize,
    /// Selected columns.
    pub columns: usize,
    pub headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<CellValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Result of a table extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableExtraction {
    pub total_tables_found: usize,
    pub tables_returned: usize,
    pub tables: Vec<ExtractedTable>,
}

/// Extract tables from the given slides.
///
/// Slide numbers in the output are the slides' stable external numbers.
pub fn extract_tables(
    presentation: &Presentation,
    slides: &[usize],
    request: &ValidTableRequest,
) -> TableExtraction {
    let mut total_tables_found = 0;
    let mut tables = Vec::new();

    for slide in presentation.slides_in(slides) {
        for (table_index, table) in slide.tables.iter().enumerate() {
            total_tables_found += 1;
            if let Some(extracted) = extract_table(table, slide.number, table_index, request) {
                tables.push(extracted);
            }
        }
    }

    log::debug!(
        "Extracted {} of {} tables",
        tables.len(),
        total_tables_found
    );

    TableExtraction {
        total_tables_found,
        tables_returned: tables.len(),
        tables,
    }
}

fn extract_table(
    table: &Table,
    slide_number: usize,
    table_index: usize,
    valid: &ValidTableRequest,
) -> Option<ExtractedTable> {
    let request = valid.request();
    let (all_headers, data_start) = match &request.column_names {
        Some(names) => {
            let headers = (0..table.columns)
                .map(|i| {
                    names
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("Column {}", i + 1))
                })
                .collect::<Vec<_>>();
            (headers, 0)
        }
        None => (table.header_names(), 1.min(table.rows)),
    };

    if !request.criteria.matches(table, &all_headers) {
        return None;
    }

    let columns = valid.select_columns(&all_headers);
    let headers: Vec<String> = columns.iter().map(|&c| all_headers[c].clone()).collect();
    let view = GridView {
        table,
        columns: &columns,
    };
    let data_rows = data_start..table.rows;

    let mut extracted = ExtractedTable {
        slide_number,
        table_index,
        rows: data_rows.len(),
        columns: columns.len(),
        headers,
        data: None,
        html: None,
    };

    match valid.output_format {
        OutputFormat::RowColValue => {
            let data = view
                .visible_cells(data_rows)
                .into_iter()
                .map(|v| CellValue {
                    row: v.row,
                    col: v.col,
                    value: v.cell.text(),
                    formatting: segments_by_kind(&v.cell.content, &valid.kinds),
                })
                .collect();
            extracted.data = Some(data);
        }
        OutputFormat::Html => {
            let header_cells = (data_start > 0).then(|| view.visible_cells(0..data_start));
            extracted.html = Some(render_html(
                &extracted.headers,
                header_cells,
                view.visible_cells(data_rows.clone()),
                data_rows,
                &valid.kinds,
            ));
        }
    }

    Some(extracted)
}

fn render_html(
    headers: &[String],
    header_cells: Option<Vec<VisibleCell<'_>>>,
    data_cells: Vec<VisibleCell<'_>>,
    data_rows: Range<usize>,
    kinds: &[FormattingKind],
) -> String {
    let mut html = String::from("<table>");

    html.push_str("<thead><tr>");
    match header_cells {
        Some(cells) => {
            for v in &cells {
                push_cell_tag(&mut html, "th", v, kinds);
            }
        }
        None => {
            for name in headers {
                let _ = write!(html, "<th>{}</th>", escape_html(name));
            }
        }
    }
    html.push_str("</tr></thead><tbody>");

    for r in data_rows {
        html.push_str("<tr>");
        for v in data_cells.iter().filter(|v| v.row == r) {
            push_cell_tag(&mut html, "td", v, kinds);
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html
}

fn push_cell_tag(html: &mut String, tag: &str, v: &VisibleCell<'_>, kinds: &[FormattingKind]) {
    let _ = write!(html, "<{tag}");
    if v.row_span > 1 {
        let _ = write!(html, " rowspan=\"{}\"", v.row_span);
    }
    if v.col_span > 1 {
        let _ = write!(html, " colspan=\"{}\"", v.col_span);
    }
    if let Some(bg) = &v.cell.background {
        let _ = write!(html, " style=\"background-color: {}\"", escape_html(bg));
    }
    html.push('>');
    html.push_str(&render_cell_content(&v.cell.content, kinds));
    let _ = write!(html, "</{tag}>");
}

/// Cell text as HTML, wrapping runs in tags for the requested kinds only.
fn render_cell_content(content: &TextElement, kinds: &[FormattingKind]) -> String {
    let mut out = String::new();
    for run in &content.runs {
        if run.text.is_empty() {
            continue;
        }
        let f = &run.formatting;
        let mut open = String::new();
        let mut close = Vec::new();
        let mut styles = Vec::new();

        for kind in kinds {
            match kind {
                FormattingKind::Bold if f.bold => wrap(&mut open, &mut close, "strong"),
                FormattingKind::Italic if f.italic => wrap(&mut open, &mut close, "em"),
                FormattingKind::Underlined if f.underline => wrap(&mut open, &mut close, "u"),
                FormattingKind::Strikethrough if f.strikethrough => wrap(&mut open, &mut close, "s"),
                FormattingKind::Highlighted if f.highlighted => wrap(&mut open, &mut close, "mark"),
                FormattingKind::FontSizes => {
                    if let Some(size) = f.font_size {
                        styles.push(format!("font-size: {size}pt"));
                    }
                }
                FormattingKind::FontColors => {
                    if let Some(color) = &f.font_color {
                        styles.push(format!("color: {}", escape_html(color)));
                    }
                }
                FormattingKind::Hyperlinks => {
                    if let Some(url) = f.hyperlink.as_ref().and_then(|h| h.target.as_deref()) {
                        let _ = write!(open, "<a href=\"{}\">", escape_html(url));
                        close.push("</a>".to_string());
                    }
                }
                _ => {}
            }
        }

        if !styles.is_empty() {
            let _ = write!(out, "<span style=\"{}\">", styles.join("; "));
        }
        out.push_str(&open);
        out.push_str(&escape_html(&run.text).replace('\n', "<br>"));
        for tag in close.iter().rev() {
            out.push_str(tag);
        }
        if !styles.is_empty() {
            out.push_str("</span>");
        }
    }
    out
}

fn wrap(open: &mut String, close: &mut Vec<String>, tag: &str) {
    let _ = write!(open, "<{tag}>");
    close.push(format!("</{tag}>"));
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
