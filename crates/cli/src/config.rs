//! Runtime settings and the input file guard.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args};
use deck_core::PresentationCache;
use std::path::Path;
use std::time::Duration;

/// Tunables shared by every subcommand. Each may come from the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Largest accepted input file, in megabytes
    #[arg(long, env = "DECK_MAX_FILE_SIZE_MB", default_value_t = 100, global = true)]
    pub max_file_size_mb: u64,

    /// Keep built presentations between session requests
    #[arg(long, env = "DECK_CACHE_ENABLED", default_value_t = true, action = ArgAction::Set, global = true)]
    pub cache_enabled: bool,

    /// Seconds before a cached presentation expires (0 disables expiry)
    #[arg(long, env = "DECK_CACHE_TTL_SECS", default_value_t = 3600, global = true)]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached presentations
    #[arg(long, env = "DECK_CACHE_MAX_ENTRIES", default_value_t = 16, global = true)]
    pub cache_max_entries: usize,

    /// Default maximum number of query matches (0 for no limit)
    #[arg(long, env = "DECK_QUERY_LIMIT", default_value_t = deck_core::DEFAULT_LIMIT, global = true)]
    pub query_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            cache_enabled: true,
            cache_ttl_secs: 3600,
            cache_max_entries: 16,
            query_limit: deck_core::DEFAULT_LIMIT,
        }
    }
}

impl Settings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// The presentation cache these settings describe, if caching is on.
    pub fn build_cache(&self) -> Option<PresentationCache> {
        if !self.cache_enabled {
            return None;
        }
        let cache = PresentationCache::new(self.cache_max_entries);
        Some(if self.cache_ttl_secs > 0 {
            cache.with_ttl(Duration::from_secs(self.cache_ttl_secs))
        } else {
            cache
        })
    }
}

/// Read a presentation file after checking that it exists, is a `.pptx`
/// file and is within the size limit.
pub fn read_presentation_file(path: &Path, settings: &Settings) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("File not found: {}", path.display()))?;
    if !metadata.is_file() {
        bail!("Not a file: {}", path.display());
    }

    let is_pptx = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pptx"))
        .unwrap_or(false);
    if !is_pptx {
        bail!("Unsupported file type (expected .pptx): {}", path.display());
    }

    if metadata.len() > settings.max_file_size_bytes() {
        bail!(
            "File too large: {} bytes (limit {} MB)",
            metadata.len(),
            settings.max_file_size_mb
        );
    }

    log::debug!("Reading {} ({} bytes)", path.display(), metadata.len());
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
