//! Core document model, formatting and table extraction, and the slide
//! query engine for presentation decks.
//!
//! This crate knows nothing about archives or XML. A parser backend builds a
//! [`Presentation`]; everything here reads it.

pub mod cache;
pub mod error;
pub mod formatting;
pub mod overview;
pub mod query;
pub mod selection;
pub mod table;
pub mod types;

pub use cache::{fingerprint, CacheStats, PresentationCache};
pub use error::{Error, FormatError, ResolutionWarning, Result, ValidationError, WarningKind};
pub use formatting::{
    analyze_formatting, extract_formatting, extract_segments, segments_by_kind, FormattedSegment,
    FormattingAnalysis, FormattingKind, FormattingReport,
};
pub use overview::{overview, PresentationOverview};
pub use query::{query, QueryResult, ReturnField, SlideMatch, ValidatedCriteria, DEFAULT_LIMIT};
pub use selection::{ResolvedSelection, SlideSelection};
pub use table::{
    extract_tables, CellValue, ColumnSelection, ExtractedTable, GridCell, OutputFormat, RawCell,
    RawTable, Table, TableCell, TableCriteria, TableExtraction, TableRequest, ValidTableRequest,
};
pub use types::{
    Hyperlink, LinkType, ObjectCounts, Presentation, Run, RunFormatting, Section, Slide, SlideSize,
    TextElement,
};
