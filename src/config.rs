//! Project-level configuration
//!
//! Loaded from `corpdiff.toml` in the working directory (or an explicit
//! `--config` path). CLI flags override file values, which override the
//! built-in defaults.
//!
//! ```toml
//! [corpus]
//! has_ids = true
//! delimiter = "\t"
//! word_sep = "|"
//! has_header = true
//!
//! [vocabulary]
//! min_docs = 5
//! max_docs = 0        # 0 = no upper bound
//! tokens_limit = 200
//!
//! [significance]
//! min_total_df = 10
//! min_ratio = 0.0
//! max_pvalue = 1.0
//! word_pvalue = 0.25
//! phrase_min_ratio = 2.0
//! phrase_max_pvalue = 0.25
//!
//! [output]
//! phrase_sep = "|"
//! batch_size = 1024
//! ```

use crate::compare::Thresholds;
use crate::corpus::{CorpusFormat, OffsetLayout};
use crate::driver::DEFAULT_BATCH_SIZE;
use crate::error::{CorpdiffError, Result};
use crate::vocab::Bound;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// File name looked up in the working directory
pub const CONFIG_FILENAME: &str = "corpdiff.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub corpus: CorpusConfig,
    pub vocabulary: VocabularyConfig,
    pub significance: SignificanceConfig,
    pub output: OutputConfig,
}

/// Corpus file layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// First column holds a document id
    pub has_ids: bool,
    /// Separator between the id column and the text
    pub delimiter: char,
    /// Separator between words of the text
    pub word_sep: char,
    /// First line is a header
    pub has_header: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            has_ids: true,
            delimiter: '\t',
            word_sep: '|',
            has_header: true,
        }
    }
}

impl CorpusConfig {
    pub fn format(&self) -> CorpusFormat {
        CorpusFormat {
            delimiter: self.has_ids.then_some(self.delimiter),
            word_sep: self.word_sep,
            has_header: self.has_header,
        }
    }

    /// Layout of an offsets corpus; the delimiter separates every column
    pub fn offset_layout(&self) -> OffsetLayout {
        OffsetLayout {
            column_sep: self.delimiter,
            word_sep: self.word_sep,
            has_ids: self.has_ids,
            has_header: self.has_header,
        }
    }
}

/// Bounds applied when building a vocabulary index
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Minimum number of documents a token must appear in
    pub min_docs: usize,
    /// Maximum number of documents (0 or absent = unbounded)
    pub max_docs: Option<usize>,
    /// Keep at most this many of the most frequent tokens
    pub tokens_limit: Option<usize>,
}

impl VocabularyConfig {
    pub fn min_bound(&self) -> Bound {
        Bound::Count(self.min_docs)
    }

    pub fn max_bound(&self) -> Bound {
        match self.max_docs {
            None | Some(0) => Bound::Fraction(1.0),
            Some(n) => Bound::Count(n),
        }
    }
}

/// Significance thresholds for the unigram and phrase comparisons
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignificanceConfig {
    pub min_total_df: usize,
    pub min_ratio: f64,
    pub max_pvalue: f64,
    /// p-value cut-off for picking the words kept before synthesis
    pub word_pvalue: f64,
    /// Ratio cut-off for the phrase comparison of the full pipeline
    pub phrase_min_ratio: f64,
    /// p-value cut-off for the phrase comparison of the full pipeline
    pub phrase_max_pvalue: f64,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            min_total_df: thresholds.min_total_df,
            min_ratio: thresholds.min_ratio,
            max_pvalue: thresholds.max_pvalue,
            word_pvalue: 0.25,
            phrase_min_ratio: 2.0,
            phrase_max_pvalue: 0.25,
        }
    }
}

impl SignificanceConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_total_df: self.min_total_df,
            min_ratio: self.min_ratio,
            max_pvalue: self.max_pvalue,
        }
    }
}

/// Phrase output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub phrase_sep: String,
    pub batch_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            phrase_sep: "|".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ProjectConfig {
    fn validate(self) -> Result<Self> {
        if self.output.phrase_sep.is_empty() {
            return Err(CorpdiffError::Config("output.phrase_sep must not be empty".into()));
        }
        if self.output.batch_size == 0 {
            return Err(CorpdiffError::Config("output.batch_size must be at least 1".into()));
        }
        Ok(self)
    }
}

/// Parse a configuration from TOML text
pub fn parse_config(content: &str) -> Result<ProjectConfig> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| CorpdiffError::Config(e.to_string()))?;
    config.validate()
}

/// Load configuration.
///
/// An explicit path must load cleanly. Otherwise `corpdiff.toml` in `dir`
/// is used when present; a broken implicit file is reported and ignored.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ProjectConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| CorpdiffError::io(path, e))?;
        let config = parse_config(&content)?;
        debug!("Loaded config from {}", path.display());
        return Ok(config);
    }

    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        debug!("No {} found, using defaults", CONFIG_FILENAME);
        return Ok(ProjectConfig::default());
    }

    match std::fs::read_to_string(&path)
        .map_err(|e| CorpdiffError::io(&path, e))
        .and_then(|content| parse_config(&content))
    {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            Ok(config)
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            Ok(ProjectConfig::default())
        }
    }
}
