//! Tool requests and their JSON responses.
//!
//! One-shot subcommands and session lines both end up here as a
//! [`ToolRequest`]; every response is a JSON value, errors included.

use crate::config::{read_presentation_file, Settings};
use anyhow::Context;
use deck_core::{
    analyze_formatting, extract_formatting, extract_tables, overview, query, FormattingKind,
    Presentation, PresentationCache, ReturnField, SlideSelection, TableRequest, ValidatedCriteria,
    ValidationError,
};
use deck_pptx::PptxParser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A single tool invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    GetPresentationOverview {
        file_path: PathBuf,
    },
    GetSlideInfo {
        file_path: PathBuf,
        slide_number: i64,
    },
    ExtractTextFormatting {
        file_path: PathBuf,
        formatting_type: String,
        #[serde(default)]
        slides: SlideSelection,
    },
    AnalyzeTextFormatting {
        file_path: PathBuf,
        #[serde(default)]
        slides: SlideSelection,
    },
    ExtractTableData {
        file_path: PathBuf,
        #[serde(default)]
        slides: SlideSelection,
        #[serde(default)]
        options: TableRequest,
    },
    QuerySlides {
        file_path: PathBuf,
        search_criteria: Value,
        #[serde(default)]
        return_fields: Option<Vec<String>>,
        #[serde(default)]
        slides: SlideSelection,
        #[serde(default)]
        limit: Option<usize>,
    },
    ClearCache {
        #[serde(default)]
        file_path: Option<PathBuf>,
    },
    ReloadFileContent {
        file_path: PathBuf,
    },
    CacheStats,
}

/// Why a request produced no result.
#[derive(Debug)]
pub enum ToolError {
    /// The request itself is invalid; nothing was evaluated.
    Validation(ValidationError),
    /// The file could not be read or built.
    Failed(anyhow::Error),
}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        ToolError::Validation(err)
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        ToolError::Failed(err)
    }
}

impl ToolError {
    pub fn to_json(&self) -> Value {
        match self {
            ToolError::Validation(err) => json!({
                "error": {
                    "type": "validation",
                    "message": err.to_string(),
                    "details": err,
                },
                "matches": [],
            }),
            ToolError::Failed(err) => json!({
                "error": {
                    "type": "failed",
                    "message": format!("{:#}", err),
                },
            }),
        }
    }
}

/// Whether a response is an error object.
pub fn is_error(response: &Value) -> bool {
    response.get("error").is_some()
}

/// Parser, settings and (optionally) a cache of built presentations.
pub struct Workspace {
    settings: Settings,
    parser: PptxParser,
    cache: Option<PresentationCache>,
}

impl Workspace {
    pub fn new(settings: Settings) -> Self {
        let cache = settings.build_cache();
        Self {
            settings,
            parser: PptxParser::new(),
            cache,
        }
    }

    /// Handle a request, folding errors into the response.
    pub fn respond(&self, request: ToolRequest) -> Value {
        match self.handle(request) {
            Ok(value) => value,
            Err(err) => {
                match &err {
                    ToolError::Validation(e) => log::warn!("Rejected request: {}", e),
                    ToolError::Failed(e) => log::error!("Request failed: {:#}", e),
                }
                err.to_json()
            }
        }
    }

    pub fn handle(&self, request: ToolRequest) -> Result<Value, ToolError> {
        match request {
            ToolRequest::GetPresentationOverview { file_path } => {
                let presentation = self.load(&file_path)?;
                to_json(&overview(&presentation))
            }
            ToolRequest::GetSlideInfo {
                file_path,
                slide_number,
            } => {
                let presentation = self.load(&file_path)?;
                let total = presentation.slide_count();
                let slide = SlideSelection::Single(slide_number)
                    .resolve(total)?
                    .slides
                    .first()
                    .and_then(|&n| presentation.slide(n))
                    .ok_or(ValidationError::SlideOutOfRange {
                        number: slide_number,
                        total,
                    })?;
                let warnings: Vec<_> = presentation.warnings_for(slide.number).collect();
                Ok(json!({ "slide": slide, "warnings": warnings }))
            }
            ToolRequest::ExtractTextFormatting {
                file_path,
                formatting_type,
                slides,
            } => {
                let kind: FormattingKind = formatting_type.parse()?;
                let presentation = self.load(&file_path)?;
                let selection = slides.resolve(presentation.slide_count())?;
                let mut response = to_json(&extract_formatting(&presentation, &selection.slides, kind))?;
                attach_notes(&mut response, selection.notes);
                Ok(response)
            }
            ToolRequest::AnalyzeTextFormatting { file_path, slides } => {
                let presentation = self.load(&file_path)?;
                let selection = slides.resolve(presentation.slide_count())?;
                let mut response = to_json(&analyze_formatting(&presentation, &selection.slides))?;
                attach_notes(&mut response, selection.notes);
                Ok(response)
            }
            ToolRequest::ExtractTableData {
                file_path,
                slides,
                options,
            } => {
                let request = options.validate()?;
                let presentation = self.load(&file_path)?;
                let selection = slides.resolve(presentation.slide_count())?;
                let mut response = to_json(&extract_tables(&presentation, &selection.slides, &request))?;
                attach_notes(&mut response, selection.notes);
                Ok(response)
            }
            ToolRequest::QuerySlides {
                file_path,
                search_criteria,
                return_fields,
                slides,
                limit,
            } => {
                let criteria = ValidatedCriteria::parse(&search_criteria)?;
                let fields = ReturnField::parse_list(return_fields.as_deref())?;
                let presentation = self.load(&file_path)?;
                let selection = slides.resolve(presentation.slide_count())?;
                let limit = limit.unwrap_or(self.settings.query_limit);
                let result = query(&presentation, &criteria, &fields, &selection.slides, limit)?;
                let mut response = to_json(&result)?;
                attach_notes(&mut response, selection.notes);
                Ok(response)
            }
            ToolRequest::ClearCache { file_path } => Ok(self.clear_cache(file_path.as_deref())),
            ToolRequest::ReloadFileContent { file_path } => {
                if let Some(cache) = &self.cache {
                    cache.invalidate(&identity(&file_path));
                }
                let presentation = self.load(&file_path)?;
                to_json(&overview(&presentation))
            }
            ToolRequest::CacheStats => match &self.cache {
                Some(cache) => to_json(&cache.stats()),
                None => Ok(json!({ "status": "info", "message": "Cache is disabled" })),
            },
        }
    }

    /// Read and build a presentation, going through the cache when enabled.
    fn load(&self, path: &Path) -> anyhow::Result<Arc<Presentation>> {
        let bytes = read_presentation_file(path, &self.settings)?;
        let build = |bytes: &[u8]| {
            self.parser
                .parse(bytes)
                .with_context(|| format!("Failed to build presentation from {}", path.display()))
        };
        match &self.cache {
            Some(cache) => cache.get_or_build(&identity(path), &bytes, build),
            None => build(&bytes).map(Arc::new),
        }
    }

    fn clear_cache(&self, file_path: Option<&Path>) -> Value {
        let Some(cache) = &self.cache else {
            return json!({ "status": "info", "message": "No cache to clear" });
        };
        match file_path {
            Some(path) if cache.invalidate(&identity(path)) => json!({
                "status": "success",
                "message": format!("Cache cleared for file: {}", path.display()),
            }),
            Some(path) => json!({
                "status": "info",
                "message": format!("File not found in cache: {}", path.display()),
            }),
            None => {
                cache.clear();
                json!({ "status": "success", "message": "All cache cleared" })
            }
        }
    }
}

/// Cache key for a file: its canonical path when it can be resolved.
fn identity(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .context("Failed to serialize response")
        .map_err(ToolError::Failed)
}

/// Record clipped-range notes from slide selection next to the result.
fn attach_notes(response: &mut Value, notes: Vec<String>) {
    if notes.is_empty() {
        return;
    }
    if let Value::Object(map) = response {
        map.insert("selection_notes".to_string(), json!(notes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(Settings::default())
    }

    fn request(line: Value) -> ToolRequest {
        serde_json::from_value(line).unwrap()
    }

    #[test]
    fn test_invalid_criteria_rejected_before_reading_file() {
        let response = workspace().respond(request(json!({
            "tool": "query_slides",
            "file_path": "/no/such/deck.pptx",
            "search_criteria": {"title": {"contians": "Q1"}},
        })));

        assert!(is_error(&response));
        assert_eq!(response["error"]["type"], "validation");
        assert_eq!(response["error"]["details"]["kind"], "unknown_operator");
        assert_eq!(response["matches"], json!([]));
    }

    #[test]
    fn test_unknown_formatting_kind() {
        let response = workspace().respond(request(json!({
            "tool": "extract_text_formatting",
            "file_path": "/no/such/deck.pptx",
            "formatting_type": "sparkly",
        })));
        assert_eq!(response["error"]["details"]["kind"], "unknown_formatting_kind");
    }

    #[test]
    fn test_missing_file_fails() {
        let response = workspace().respond(request(json!({
            "tool": "get_presentation_overview",
            "file_path": "/no/such/deck.pptx",
        })));
        assert_eq!(response["error"]["type"], "failed");
        assert!(response.get("matches").is_none());
    }

    #[test]
    fn test_clear_cache_reports_unknown_file() {
        let ws = workspace();
        let response = ws.respond(request(json!({
            "tool": "clear_cache",
            "file_path": "/no/such/deck.pptx",
        })));
        assert_eq!(response["status"], "info");

        let response = ws.respond(request(json!({"tool": "clear_cache"})));
        assert_eq!(response["status"], "success");

        let stats = ws.respond(request(json!({"tool": "cache_stats"})));
        assert_eq!(stats["entries"], 0);
    }

    #[test]
    fn test_selection_field_accepts_all_forms() {
        let parsed = request(json!({
            "tool": "analyze_text_formatting",
            "file_path": "deck.pptx",
            "slides": "2:4",
        }));
        assert!(matches!(
            parsed,
            ToolRequest::AnalyzeTextFormatting { slides: SlideSelection::Expression(ref e), .. } if e == "2:4"
        ));

        let parsed = request(json!({
            "tool": "analyze_text_formatting",
            "file_path": "deck.pptx",
            "slides": [1, 3],
        }));
        assert!(matches!(
            parsed,
            ToolRequest::AnalyzeTextFormatting { slides: SlideSelection::List(_), .. }
        ));
    }
}
