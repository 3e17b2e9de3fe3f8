use lru::LruCache;
use once_cell::sync::Lazy;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;

use crate::domain::{SourceLine, StyleSpan};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const MAX_LINE_LENGTH: usize = 2000;
const DEFAULT_THEME: &str = "base16-ocean.dark";
const CACHE_CAPACITY: usize = 300;

/// Maps one line of source text to styled spans.
///
/// Implementations are best-effort: a failure here means "no highlighting",
/// never a failed parse.
pub trait SyntaxHighlighter: Send + Sync {
    fn highlight(&self, text: &str, language_hint: Option<&str>) -> Vec<StyleSpan>;
}

/// Syntect-backed highlighter producing foreground-color style tags.
pub struct SyntectHighlighter {
    theme: String,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }

    pub fn with_theme(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter for SyntectHighlighter {
    fn highlight(&self, text: &str, language_hint: Option<&str>) -> Vec<StyleSpan> {
        if text.len() > MAX_LINE_LENGTH {
            return Vec::new();
        }

        let syntax = language_hint
            .and_then(|hint| SYNTAX_SET.find_syntax_by_token(hint))
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

        let theme = match THEME_SET.themes.get(&self.theme) {
            Some(theme) => theme,
            None => return Vec::new(),
        };
        let mut h = HighlightLines::new(syntax, theme);

        // Syntect expects a trailing newline with the newlines syntax set.
        let line = format!("{}\n", text.trim_end_matches('\n'));

        let mut spans = Vec::new();
        match h.highlight_line(&line, &SYNTAX_SET) {
            Ok(ranges) => {
                let mut offset = 0usize;
                for (style, segment) in ranges {
                    let segment = segment.trim_end_matches('\n');
                    if !segment.is_empty() {
                        let fg = style.foreground;
                        spans.push(StyleSpan {
                            start: offset,
                            end: offset + segment.len(),
                            style: format!("#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b),
                        });
                    }
                    offset += segment.len();
                }
            }
            Err(err) => {
                log::warn!("Highlighting failed, degrading to plain text: {err}");
            }
        }

        spans
    }
}

/// Maps a file path to a language token the highlighter understands.
pub fn detect_language(file_path: &str) -> Option<String> {
    let path = std::path::Path::new(file_path);
    let ext = path.extension().and_then(|e| e.to_str())?;
    SYNTAX_SET
        .find_syntax_by_extension(ext)
        .map(|s| s.name.to_string())
}

/// Read-through LRU cache of style spans, keyed by line fingerprint.
///
/// Scoped to one parse session by the caller; sharing one across parallel
/// parses is safe and only a performance concern.
#[derive(Clone)]
pub struct HighlightCache(Arc<Mutex<LruCache<u64, Arc<[StyleSpan]>>>>);

impl Default for HighlightCache {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(LruCache::new(
            NonZeroUsize::new(CACHE_CAPACITY).unwrap(),
        ))))
    }
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache sized to a known line count, so one parse session never evicts
    /// its own entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(CACHE_CAPACITY);
        Self(Arc::new(Mutex::new(LruCache::new(
            NonZeroUsize::new(capacity).unwrap(),
        ))))
    }

    pub fn get(&self, key: u64) -> Option<Arc<[StyleSpan]>> {
        self.0.lock().unwrap().get(&key).cloned()
    }

    pub fn insert(&self, key: u64, spans: Arc<[StyleSpan]>) {
        self.0.lock().unwrap().put(key, spans);
    }
}

/// Highlights one line through the cache, invoking the highlighter at most
/// once per unique line text.
pub fn highlight_with_cache(
    line: &SourceLine,
    language: Option<&str>,
    highlighter: &dyn SyntaxHighlighter,
    cache: &HighlightCache,
) -> Arc<[StyleSpan]> {
    if let Some(cached) = cache.get(line.fingerprint) {
        return cached;
    }

    let spans: Arc<[StyleSpan]> = Arc::from(
        highlighter
            .highlight(&line.text, language)
            .into_boxed_slice(),
    );
    cache.insert(line.fingerprint, spans.clone());
    spans
}
