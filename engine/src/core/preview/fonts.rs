//! Font Resolution
//!
//! The rasterizer needs literal font bytes, not family names. [`FontResolver`]
//! turns a style's font name into probed font files by walking an ordered list
//! of candidate generators and stopping at the first file that downloads
//! successfully.
//!
//! # Cascade
//!
//! 1. exact name match in the catalog
//! 2. case-insensitive name match
//! 3. normalized match (spaces, `-`, `_` and weight suffixes stripped)
//! 4. filename guesses (`Name-Regular.ttf`, `Name-Bold.ttf`, `Name.ttf`,
//!    compact and URL-encoded variants)
//! 5. the first N catalog entries as a fallback set
//! 6. the hard-coded default set
//!
//! A response shorter than `min_font_bytes` is a failed probe: servers commonly
//! answer a missing file with a small HTML page.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::core::{CoreError, CoreResult};

/// Responses shorter than this are not fonts
pub const DEFAULT_MIN_FONT_BYTES: usize = 100;
/// Catalog entries used when nothing matches
pub const DEFAULT_FALLBACK_COUNT: usize = 3;

/// Files tried when every other stage fails
pub fn default_font_files() -> Vec<String> {
    ["Roboto-Regular.ttf", "OpenSans-Regular.ttf", "NotoSans-Regular.ttf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Font Source
// =============================================================================

/// One catalog entry: logical family name and the file that provides it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontEntry {
    pub name: String,
    pub file: String,
}

impl FontEntry {
    pub fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

/// Font catalog collaborator
#[async_trait]
pub trait FontSource: Send + Sync {
    /// Lists available fonts
    async fn list(&self) -> CoreResult<Vec<FontEntry>>;

    /// Downloads the raw bytes of a font file
    async fn fetch(&self, file: &str) -> CoreResult<Bytes>;
}

// =============================================================================
// Directory Source
// =============================================================================

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "woff", "woff2"];

/// Fonts stored as files in one local directory.
///
/// The family name of each entry is the file stem.
#[derive(Clone, Debug)]
pub struct DirectoryFontSource {
    root: PathBuf,
}

impl DirectoryFontSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_file(&self, file: &str) -> CoreResult<PathBuf> {
        let decoded = urlencoding::decode(file)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| file.to_string());

        let is_plain_name = !decoded.is_empty()
            && !decoded.contains(['/', '\\'])
            && decoded != ".."
            && decoded != ".";
        if !is_plain_name {
            return Err(CoreError::FontFetchFailed {
                file: file.to_string(),
                reason: "Not a plain file name".to_string(),
            });
        }

        Ok(self.root.join(decoded))
    }
}

#[async_trait]
impl FontSource for DirectoryFontSource {
    async fn list(&self) -> CoreResult<Vec<FontEntry>> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            CoreError::FontCatalogUnavailable(format!("{}: {}", self.root.display(), e))
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if !is_font {
                continue;
            }

            let (Some(stem), Some(file)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            entries.push(FontEntry::new(stem, file));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn fetch(&self, file: &str) -> CoreResult<Bytes> {
        let path = self.resolve_file(file)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| CoreError::FontFetchFailed {
                file: file.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Bytes::from(data))
    }
}

// =============================================================================
// HTTP Source
// =============================================================================

/// Font catalog served over HTTP.
///
/// `GET {base}/fonts` returns either `[{ "name", "file" }]` or a
/// `{ name: file }` map; `GET {base}/{file}` returns the raw bytes.
#[cfg(feature = "remote-fonts")]
#[derive(Clone, Debug)]
pub struct HttpFontSource {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(feature = "remote-fonts")]
#[derive(Deserialize)]
#[serde(untagged)]
enum FontListing {
    Entries(Vec<FontEntry>),
    Map(std::collections::BTreeMap<String, String>),
}

#[cfg(feature = "remote-fonts")]
impl HttpFontSource {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(feature = "remote-fonts")]
#[async_trait]
impl FontSource for HttpFontSource {
    async fn list(&self) -> CoreResult<Vec<FontEntry>> {
        let unavailable = |e: reqwest::Error| CoreError::FontCatalogUnavailable(e.to_string());

        let listing: FontListing = self
            .client
            .get(self.url("fonts"))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        Ok(match listing {
            FontListing::Entries(entries) => entries,
            FontListing::Map(map) => map
                .into_iter()
                .map(|(name, file)| FontEntry { name, file })
                .collect(),
        })
    }

    async fn fetch(&self, file: &str) -> CoreResult<Bytes> {
        let failed = |e: reqwest::Error| CoreError::FontFetchFailed {
            file: file.to_string(),
            reason: e.to_string(),
        };

        self.client
            .get(self.url(file))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed)?
            .bytes()
            .await
            .map_err(failed)
    }
}

// =============================================================================
// Name Normalization
// =============================================================================

static WEIGHT_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(extra|ultra)?(semibold|bold|light|thin|regular|medium|black|heavy|book)$").ok()
});

/// Lowercases, strips spaces, `-` and `_`, then drops one trailing weight word.
///
/// `"Open Sans-Bold"` and `"opensans"` both normalize to `"opensans"`.
pub fn normalize_font_name(name: &str) -> String {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect::<String>()
        .to_lowercase();

    match WEIGHT_SUFFIX.as_ref() {
        Some(re) => {
            let stripped = re.replace(&compact, "");
            // A name that is only a weight word keeps its text.
            if stripped.is_empty() {
                compact
            } else {
                stripped.into_owned()
            }
        }
        None => compact,
    }
}

// =============================================================================
// Candidate Generators
// =============================================================================

/// Which cascade stage produced the resolved fonts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    Exact,
    CaseInsensitive,
    Normalized,
    FilenameGuess,
    CatalogFallback,
    DefaultSet,
}

type CandidateGenerator = fn(&str, &[FontEntry]) -> Vec<String>;

/// Single-file stages, in cascade order
const NAMED_STAGES: [(ResolutionStage, CandidateGenerator); 4] = [
    (ResolutionStage::Exact, exact_candidates),
    (ResolutionStage::CaseInsensitive, case_insensitive_candidates),
    (ResolutionStage::Normalized, normalized_candidates),
    (ResolutionStage::FilenameGuess, filename_guesses),
];

fn exact_candidates(name: &str, catalog: &[FontEntry]) -> Vec<String> {
    catalog
        .iter()
        .filter(|e| e.name == name)
        .map(|e| e.file.clone())
        .collect()
}

fn case_insensitive_candidates(name: &str, catalog: &[FontEntry]) -> Vec<String> {
    let lowered = name.to_lowercase();
    catalog
        .iter()
        .filter(|e| e.name.to_lowercase() == lowered)
        .map(|e| e.file.clone())
        .collect()
}

fn normalized_candidates(name: &str, catalog: &[FontEntry]) -> Vec<String> {
    let wanted = normalize_font_name(name);
    if wanted.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|e| normalize_font_name(&e.name) == wanted)
        .map(|e| e.file.clone())
        .collect()
}

fn filename_guesses(name: &str, _catalog: &[FontEntry]) -> Vec<String> {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();

    let mut guesses = Vec::new();
    for base in [name, compact.as_str()] {
        for pattern in ["{}-Regular.ttf", "{}-Bold.ttf", "{}.ttf"] {
            let file = pattern.replace("{}", base);
            let encoded = urlencoding::encode(&file).into_owned();
            guesses.push(file);
            guesses.push(encoded);
        }
    }

    let mut seen = HashSet::new();
    guesses.retain(|g| seen.insert(g.clone()));
    guesses
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolver tuning
#[derive(Clone, Debug, PartialEq)]
pub struct FontResolverOptions {
    pub min_font_bytes: usize,
    pub fallback_count: usize,
    pub default_fonts: Vec<String>,
}

impl Default for FontResolverOptions {
    fn default() -> Self {
        Self {
            min_font_bytes: DEFAULT_MIN_FONT_BYTES,
            fallback_count: DEFAULT_FALLBACK_COUNT,
            default_fonts: default_font_files(),
        }
    }
}

/// A probed font file
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFont {
    pub file: String,
    pub bytes: Bytes,
}

/// Outcome of the cascade. May be empty when even the default set failed.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFonts {
    pub requested: String,
    pub stage: ResolutionStage,
    pub fonts: Vec<ResolvedFont>,
}

impl ResolvedFonts {
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn files(&self) -> Vec<&str> {
        self.fonts.iter().map(|f| f.file.as_str()).collect()
    }
}

/// Runs the font cascade against a [`FontSource`], caching probed bytes.
pub struct FontResolver {
    source: Arc<dyn FontSource>,
    options: FontResolverOptions,
    cache: Mutex<HashMap<String, Bytes>>,
    catalog: RwLock<Option<Arc<Vec<FontEntry>>>>,
}

impl FontResolver {
    pub fn new(source: Arc<dyn FontSource>, options: FontResolverOptions) -> Self {
        Self {
            source,
            options,
            cache: Mutex::new(HashMap::new()),
            catalog: RwLock::new(None),
        }
    }

    pub fn options(&self) -> &FontResolverOptions {
        &self.options
    }

    /// Number of font files held in the bytes cache
    pub async fn cached_count(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Drops the cached catalog listing so the next resolve lists again
    pub async fn refresh_catalog(&self) {
        *self.catalog.write().await = None;
    }

    /// Resolves a font family name. Never fails: exhaustion yields the
    /// default set, possibly empty.
    pub async fn resolve(&self, font_name: &str) -> ResolvedFonts {
        let requested = font_name.trim().to_string();
        let catalog = self.catalog().await;
        let mut tried = HashSet::new();

        if !requested.is_empty() {
            for (stage, generate) in NAMED_STAGES {
                for file in generate(&requested, &catalog) {
                    if !tried.insert(file.clone()) {
                        continue;
                    }
                    if let Some(bytes) = self.probe(&file).await {
                        debug!(font = %requested, %file, ?stage, "Resolved font");
                        return ResolvedFonts {
                            requested,
                            stage,
                            fonts: vec![ResolvedFont { file, bytes }],
                        };
                    }
                }
            }
        }

        let fallback: Vec<String> = catalog
            .iter()
            .take(self.options.fallback_count)
            .map(|e| e.file.clone())
            .collect();
        let fonts = self.probe_all(&fallback).await;
        if !fonts.is_empty() {
            warn!(font = %requested, count = fonts.len(), "Font not found, using catalog fallback set");
            return ResolvedFonts {
                requested,
                stage: ResolutionStage::CatalogFallback,
                fonts,
            };
        }

        let fonts = self.probe_all(&self.options.default_fonts).await;
        warn!(font = %requested, count = fonts.len(), "Font catalog exhausted, using default font set");
        ResolvedFonts {
            requested,
            stage: ResolutionStage::DefaultSet,
            fonts,
        }
    }

    async fn catalog(&self) -> Arc<Vec<FontEntry>> {
        if let Some(catalog) = self.catalog.read().await.as_ref() {
            return Arc::clone(catalog);
        }

        match self.source.list().await {
            Ok(entries) => {
                let catalog = Arc::new(entries);
                *self.catalog.write().await = Some(Arc::clone(&catalog));
                catalog
            }
            Err(e) => {
                // Not cached: the next resolve retries the listing.
                warn!(error = %e, "Font catalog unavailable, continuing with filename guesses");
                Arc::new(Vec::new())
            }
        }
    }

    async fn probe_all(&self, files: &[String]) -> Vec<ResolvedFont> {
        let mut fonts = Vec::new();
        for file in files {
            if let Some(bytes) = self.probe(file).await {
                fonts.push(ResolvedFont {
                    file: file.clone(),
                    bytes,
                });
            }
        }
        fonts
    }

    /// Fetches a candidate, trusting it only above the size threshold.
    async fn probe(&self, file: &str) -> Option<Bytes> {
        if let Some(bytes) = self.cache.lock().await.get(file) {
            return Some(bytes.clone());
        }

        match self.source.fetch(file).await {
            Ok(bytes) if bytes.len() >= self.options.min_font_bytes => {
                self.cache
                    .lock()
                    .await
                    .insert(file.to_string(), bytes.clone());
                Some(bytes)
            }
            Ok(bytes) => {
                debug!(%file, len = bytes.len(), "Font probe too small, treating as missing");
                None
            }
            Err(e) => {
                debug!(%file, error = %e, "Font probe failed");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-memory catalog that counts fetches
    #[derive(Default)]
    struct MockFontSource {
        entries: Vec<FontEntry>,
        files: HashMap<String, Vec<u8>>,
        list_fails: bool,
        fetches: AtomicUsize,
        fetched: std::sync::Mutex<Vec<String>>,
    }

    impl MockFontSource {
        fn with_font(mut self, name: &str, file: &str, size: usize) -> Self {
            self.entries.push(FontEntry::new(name, file));
            self.files.insert(file.to_string(), vec![0u8; size]);
            self
        }

        fn with_file(mut self, file: &str, size: usize) -> Self {
            self.files.insert(file.to_string(), vec![0u8; size]);
            self
        }
    }

    #[async_trait]
    impl FontSource for MockFontSource {
        async fn list(&self) -> CoreResult<Vec<FontEntry>> {
            if self.list_fails {
                return Err(CoreError::FontCatalogUnavailable("offline".to_string()));
            }
            Ok(self.entries.clone())
        }

        async fn fetch(&self, file: &str) -> CoreResult<Bytes> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.fetched.lock().unwrap().push(file.to_string());
            self.files
                .get(file)
                .map(|b| Bytes::from(b.clone()))
                .ok_or_else(|| CoreError::FontFetchFailed {
                    file: file.to_string(),
                    reason: "404".to_string(),
                })
        }
    }

    fn resolver(source: MockFontSource) -> (Arc<MockFontSource>, FontResolver) {
        let source = Arc::new(source);
        let resolver = FontResolver::new(source.clone(), FontResolverOptions::default());
        (source, resolver)
    }

    // -------------------------------------------------------------------------
    // Normalization Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_font_name() {
        assert_eq!(normalize_font_name("Open Sans"), "opensans");
        assert_eq!(normalize_font_name("Open_Sans-Bold"), "opensans");
        assert_eq!(normalize_font_name("Montserrat ExtraBold"), "montserrat");
        assert_eq!(normalize_font_name("Inter-UltraLight"), "inter");
        assert_eq!(normalize_font_name("Bebas Neue"), "bebasneue");
        assert_eq!(normalize_font_name("Book"), "book");
    }

    #[test]
    fn test_filename_guesses_order_and_encoding() {
        let guesses = filename_guesses("Open Sans", &[]);
        assert_eq!(guesses[0], "Open Sans-Regular.ttf");
        assert_eq!(guesses[1], "Open%20Sans-Regular.ttf");
        assert!(guesses.contains(&"OpenSans-Bold.ttf".to_string()));
        assert!(guesses.contains(&"OpenSans.ttf".to_string()));

        // No duplicates for names without spaces
        let guesses = filename_guesses("Inter", &[]);
        assert_eq!(
            guesses,
            vec!["Inter-Regular.ttf", "Inter-Bold.ttf", "Inter.ttf"]
        );
    }

    // -------------------------------------------------------------------------
    // Cascade Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_exact_match_wins() {
        let (_, resolver) = resolver(
            MockFontSource::default()
                .with_font("Montserrat", "Montserrat-Regular.ttf", 500)
                .with_font("montserrat", "other.ttf", 500),
        );

        let resolved = resolver.resolve("Montserrat").await;
        assert_eq!(resolved.stage, ResolutionStage::Exact);
        assert_eq!(resolved.files(), vec!["Montserrat-Regular.ttf"]);
    }

    #[tokio::test]
    async fn test_case_insensitive_and_normalized_match() {
        let (_, resolver) = resolver(
            MockFontSource::default()
                .with_font("Bebas Neue", "BebasNeue.ttf", 500)
                .with_font("Open Sans Bold", "OpenSans-Bold.ttf", 500),
        );

        let resolved = resolver.resolve("bebas neue").await;
        assert_eq!(resolved.stage, ResolutionStage::CaseInsensitive);

        let resolved = resolver.resolve("OpenSans").await;
        assert_eq!(resolved.stage, ResolutionStage::Normalized);
        assert_eq!(resolved.files(), vec!["OpenSans-Bold.ttf"]);
    }

    #[tokio::test]
    async fn test_small_response_is_rejected() {
        let (_, resolver) = resolver(
            MockFontSource::default()
                .with_font("Inter", "Inter.html", 42)
                .with_file("Inter-Regular.ttf", 800),
        );

        let resolved = resolver.resolve("Inter").await;
        assert_eq!(resolved.stage, ResolutionStage::FilenameGuess);
        assert_eq!(resolved.files(), vec!["Inter-Regular.ttf"]);
    }

    #[tokio::test]
    async fn test_url_encoded_guess() {
        let (source, resolver) =
            resolver(MockFontSource::default().with_file("Open%20Sans.ttf", 800));

        let resolved = resolver.resolve("Open Sans").await;
        assert_eq!(resolved.stage, ResolutionStage::FilenameGuess);
        assert_eq!(resolved.files(), vec!["Open%20Sans.ttf"]);

        // Probes are sequential and short-circuit on the first success
        let fetched = source.fetched.lock().unwrap().clone();
        assert_eq!(fetched.last().map(String::as_str), Some("Open%20Sans.ttf"));
    }

    #[tokio::test]
    async fn test_catalog_fallback_set() {
        let (_, resolver) = resolver(
            MockFontSource::default()
                .with_font("A", "a.ttf", 500)
                .with_font("B", "b.ttf", 10)
                .with_font("C", "c.ttf", 500)
                .with_font("D", "d.ttf", 500),
        );

        let resolved = resolver.resolve("Missing Font").await;
        assert_eq!(resolved.stage, ResolutionStage::CatalogFallback);
        // First three entries, minus the one that failed its probe
        assert_eq!(resolved.files(), vec!["a.ttf", "c.ttf"]);
    }

    #[tokio::test]
    async fn test_default_set_on_exhaustion() {
        let (_, resolver) = resolver(MockFontSource {
            list_fails: true,
            ..MockFontSource::default().with_file("Roboto-Regular.ttf", 500)
        });

        let resolved = resolver.resolve("Missing").await;
        assert_eq!(resolved.stage, ResolutionStage::DefaultSet);
        assert_eq!(resolved.files(), vec!["Roboto-Regular.ttf"]);

        let (_, empty) = resolver_with_nothing();
        let resolved = empty.resolve("").await;
        assert_eq!(resolved.stage, ResolutionStage::DefaultSet);
        assert!(resolved.is_empty());
    }

    fn resolver_with_nothing() -> (Arc<MockFontSource>, FontResolver) {
        resolver(MockFontSource::default())
    }

    #[tokio::test]
    async fn test_probed_bytes_are_cached() {
        let (source, resolver) =
            resolver(MockFontSource::default().with_font("Inter", "Inter.ttf", 500));

        resolver.resolve("Inter").await;
        resolver.resolve("Inter").await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_count().await, 1);
    }

    // -------------------------------------------------------------------------
    // Directory Source Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_directory_source() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Lobster-Regular.ttf"), vec![1u8; 300]).unwrap();
        std::fs::write(dir.path().join("Open Sans.otf"), vec![1u8; 300]).unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"not a font").unwrap();

        let source = DirectoryFontSource::new(dir.path());
        let entries = source.list().await.unwrap();
        assert_eq!(
            entries,
            vec![
                FontEntry::new("Lobster-Regular", "Lobster-Regular.ttf"),
                FontEntry::new("Open Sans", "Open Sans.otf"),
            ]
        );

        assert_eq!(source.fetch("Open%20Sans.otf").await.unwrap().len(), 300);
        assert!(source.fetch("../secret.ttf").await.is_err());

        let resolver = FontResolver::new(Arc::new(source), FontResolverOptions::default());
        let resolved = resolver.resolve("Lobster").await;
        assert_eq!(resolved.stage, ResolutionStage::Normalized);
    }
}
