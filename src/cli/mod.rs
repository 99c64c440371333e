//! CLI command definitions and handlers

mod compare;
mod ngrams;
mod run;
mod simple;
mod subset;
mod vocab;
mod words;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use corpdiff::compare::JoinMode;
use corpdiff::config::{load_config, CorpusConfig, ProjectConfig, VocabularyConfig};
use corpdiff::corpus::{CorpusFormat, OffsetRange, RawCorpus};
use corpdiff::driver::FilterMode;
use corpdiff::vocab::{Bound, DocFreqIndex, VocabularyIndex};
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Parse a single separator character. Accepts `tab`, `space` and `\t`.
fn parse_separator(s: &str) -> Result<char, String> {
    match s {
        "tab" | "\\t" => return Ok('\t'),
        "space" => return Ok(' '),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("'{}' is not a single character", s)),
    }
}

/// corpdiff - distinctive words and phrases between two corpora
#[derive(Parser, Debug)]
#[command(name = "corpdiff")]
#[command(
    version,
    about = "Find the words and phrases that distinguish one corpus from another",
    long_about = "corpdiff counts in how many documents each token occurs, compares two \
corpora token by token with a two-sample t-test, and synthesizes positional \
bigram and skip-gram phrases from the surviving vocabulary.\n\n\
Corpora are line-oriented text files: one document per line, an optional id \
column, words separated by a single character (default '|').",
    after_help = "\
Examples:
  corpdiff vocab texts.tsv                          Document frequencies of one corpus
  corpdiff compare target.tsv background.tsv        Significance table of target vs background
  corpdiff words target_background_df-ttest.txt     Tokens with p <= 0.25
  corpdiff ngrams target.tsv --words keep.txt       Phrases built from a word list
  corpdiff run target.tsv background.tsv            Full filtered pipeline
  corpdiff simple texts.tsv --limit 100             Most frequent phrases of one corpus
  corpdiff subset talks.tsv --max 300               Words with offsets below 300"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        default_value = "info",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    /// Config file (default: ./corpdiff.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

/// Corpus layout flags shared by every command reading a raw corpus
#[derive(Args, Debug, Clone, Default)]
pub struct FormatArgs {
    /// Separator between the id column and the text (`tab` for a tab)
    #[arg(long, value_parser = parse_separator)]
    pub delimiter: Option<char>,

    /// Lines carry no id column
    #[arg(long)]
    pub no_ids: bool,

    /// Separator between words (`space` for a blank)
    #[arg(long, value_parser = parse_separator)]
    pub word_sep: Option<char>,

    /// First line is a document, not a header
    #[arg(long)]
    pub no_header: bool,
}

impl FormatArgs {
    /// Flags override the `[corpus]` config section
    pub fn resolve(&self, config: &CorpusConfig) -> CorpusFormat {
        self.apply(config).format()
    }

    /// The `[corpus]` section with flags applied
    pub fn apply(&self, config: &CorpusConfig) -> CorpusConfig {
        let mut corpus = config.clone();
        if let Some(d) = self.delimiter {
            corpus.delimiter = d;
        }
        if let Some(w) = self.word_sep {
            corpus.word_sep = w;
        }
        if self.no_ids {
            corpus.has_ids = false;
        }
        if self.no_header {
            corpus.has_header = false;
        }
        corpus
    }
}

/// Document-frequency bounds applied to a vocabulary index
#[derive(Args, Debug, Clone, Default)]
pub struct BoundArgs {
    /// Minimum documents per token (count, or fraction like 0.01)
    #[arg(long)]
    pub min_docs: Option<Bound>,

    /// Maximum documents per token (count, or fraction like 0.9)
    #[arg(long)]
    pub max_docs: Option<Bound>,

    /// Keep at most this many of the most frequent tokens
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Resolved vocabulary bounds
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Bound,
    pub max: Bound,
    pub limit: Option<usize>,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Bound::Count(0),
            max: Bound::Fraction(1.0),
            limit: None,
        }
    }
}

impl Bounds {
    fn is_unbounded(&self) -> bool {
        self.min == Bound::Count(0) && self.max == Bound::Fraction(1.0) && self.limit.is_none()
    }
}

impl BoundArgs {
    /// Flags override the `[vocabulary]` config section
    pub fn resolve(&self, config: &VocabularyConfig) -> Bounds {
        Bounds {
            min: self.min_docs.unwrap_or_else(|| config.min_bound()),
            max: self.max_docs.unwrap_or_else(|| config.max_bound()),
            limit: self.limit.or(config.tokens_limit),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count document frequencies of one corpus
    Vocab {
        /// Corpus file
        corpus: PathBuf,

        /// Output file (default: <corpus>_dfs-all.txt next to the corpus)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        bounds: BoundArgs,
    },

    /// Compare two corpora token by token and write a significance table
    #[command(after_help = "\
Table format (one line per surviving token, no header):
  token,p_value,docs_in_target,docs_in_filter

Examples:
  corpdiff compare news.tsv web.tsv --min-ratio 2          Tokens over-represented in news
  corpdiff compare news.tsv web.tsv --join inner --json    Shared tokens, JSON summary")]
    Compare {
        /// Corpus of interest
        target: PathBuf,

        /// Background corpus
        filter: PathBuf,

        /// Output file (default: <target>_<filter>_df-ttest.txt)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Which tokens to merge: outer, inner, left, right
        #[arg(long, default_value = "outer")]
        join: JoinMode,

        /// Skip tokens found in fewer documents across both corpora
        #[arg(long)]
        min_total_df: Option<usize>,

        /// Minimum smoothed ratio of target to filter frequency
        #[arg(long)]
        min_ratio: Option<f64>,

        /// Maximum p-value to report
        #[arg(long)]
        max_pvalue: Option<f64>,

        /// Print a JSON run summary on stdout
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        bounds: BoundArgs,
    },

    /// Print tokens of a significance table with p-value at or below a threshold
    Words {
        /// Significance table
        table: PathBuf,

        /// p-value threshold (default: significance.word_pvalue)
        #[arg(long)]
        threshold: Option<f64>,

        /// Column separator of the table
        #[arg(long, default_value = ",", value_parser = parse_separator)]
        separator: char,

        /// Split table columns on whitespace instead
        #[arg(long, conflicts_with = "separator")]
        whitespace: bool,
    },

    /// Synthesize phrases for every document of a corpus
    #[command(after_help = "\
Output format (one line per input line):
  id<TAB>phrase|phrase|...

Examples:
  corpdiff ngrams texts.tsv --words keep.txt                   Phrases over listed words
  corpdiff ngrams texts.tsv --words stop.txt --mode remove     Phrases without stop words")]
    Ngrams {
        /// Corpus file
        corpus: PathBuf,

        /// Word list file (whitespace-separated words)
        #[arg(long)]
        words: PathBuf,

        /// keep: drop unlisted words; remove: drop listed words
        #[arg(long, default_value = "keep")]
        mode: FilterMode,

        /// Output file (default: <corpus>_trigrams.txt next to the corpus)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Keep only the words whose offsets fall in a range
    #[command(after_help = "\
Input format (one line per document, offsets separated like words):
  id<TAB>word|word|...<TAB>offset|offset|...

Examples:
  corpdiff subset talks.tsv --max 300          Words spoken in the first 300 seconds
  corpdiff subset talks.tsv --min=-60          Words in the last 60 offset units")]
    Subset {
        /// Offsets corpus file
        corpus: PathBuf,

        /// Lowest offset kept; negative counts back from --max
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        min: f64,

        /// Offset bound, exclusive (default: last offset + 1)
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f64>,

        /// Output file (default: <corpus>_subset.txt next to the corpus)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Full pipeline: distinctive words, their phrases, distinctive phrases
    Run {
        /// Corpus of interest
        target: PathBuf,

        /// Background corpus
        filter: PathBuf,

        /// Directory for intermediate and final files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Minimum documents per word across both corpora
        #[arg(long)]
        min_docs: Option<usize>,

        /// p-value threshold for selecting words
        #[arg(long)]
        word_pvalue: Option<f64>,

        /// Minimum smoothed ratio for phrases
        #[arg(long)]
        min_ratio: Option<f64>,

        /// Maximum p-value for phrases
        #[arg(long)]
        max_pvalue: Option<f64>,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Unfiltered pipeline: most frequent phrases of one corpus
    Simple {
        /// Corpus file
        corpus: PathBuf,

        /// Directory for intermediate and final files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        bounds: BoundArgs,
    },
}

/// File stem used to name derived outputs
pub(crate) fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "corpus".to_string())
}

/// `<dir of base>/<name>`
pub(crate) fn sibling(base: &Path, name: String) -> PathBuf {
    base.parent()
        .map(|p| p.join(&name))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Open a corpus and build its (optionally bounded) vocabulary index
pub(crate) fn build_index(
    path: &Path,
    format: CorpusFormat,
    bounds: Bounds,
) -> Result<DocFreqIndex> {
    let corpus = RawCorpus::open(path, format)?;
    let index = DocFreqIndex::from_corpus(&corpus)
        .with_context(|| format!("Failed to index {}", path.display()))?;
    if bounds.is_unbounded() {
        return Ok(index);
    }
    let filtered = index.filter_by_bounds(bounds.min, bounds.max, bounds.limit);
    info!(
        "Kept {} of {} tokens of {}",
        filtered.len(),
        index.len(),
        path.display()
    );
    Ok(filtered)
}

/// Corpus format for reading phrase files written by the batch driver
pub(crate) fn phrase_format(config: &ProjectConfig) -> Result<CorpusFormat> {
    let mut chars = config.output.phrase_sep.chars();
    let sep = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => anyhow::bail!(
            "output.phrase_sep '{}' must be a single character to re-read phrase files",
            config.output.phrase_sep
        ),
    };
    Ok(CorpusFormat {
        delimiter: Some('\t'),
        word_sep: sep,
        has_header: false,
    })
}

pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = load_config(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Vocab {
            corpus,
            output,
            format,
            bounds,
        } => vocab::run(
            &corpus,
            output.as_deref(),
            format.resolve(&config.corpus),
            bounds.resolve(&config.vocabulary),
        ),

        Commands::Compare {
            target,
            filter,
            output,
            join,
            min_total_df,
            min_ratio,
            max_pvalue,
            json,
            format,
            bounds,
        } => {
            let mut thresholds = config.significance.thresholds();
            if let Some(v) = min_total_df {
                thresholds.min_total_df = v;
            }
            if let Some(v) = min_ratio {
                thresholds.min_ratio = v;
            }
            if let Some(v) = max_pvalue {
                thresholds.max_pvalue = v;
            }
            compare::run(
                &target,
                &filter,
                output.as_deref(),
                join,
                thresholds,
                json,
                format.resolve(&config.corpus),
                bounds.resolve(&config.vocabulary),
            )
        }

        Commands::Words {
            table,
            threshold,
            separator,
            whitespace,
        } => words::run(
            &table,
            threshold.unwrap_or(config.significance.word_pvalue),
            (!whitespace).then_some(separator),
        ),

        Commands::Ngrams {
            corpus,
            words,
            mode,
            output,
            format,
        } => ngrams::run(
            &corpus,
            &words,
            mode,
            output.as_deref(),
            format.resolve(&config.corpus),
            &config,
        ),

        Commands::Subset {
            corpus,
            min,
            max,
            output,
            format,
        } => subset::run(
            &corpus,
            OffsetRange { min, max },
            output.as_deref(),
            format.apply(&config.corpus).offset_layout(),
        ),

        Commands::Run {
            target,
            filter,
            out_dir,
            min_docs,
            word_pvalue,
            min_ratio,
            max_pvalue,
            format,
        } => {
            let mut settings = run::Settings::from_config(&config);
            if let Some(v) = min_docs {
                settings.min_docs = v;
            }
            if let Some(v) = word_pvalue {
                settings.word_pvalue = v;
            }
            if let Some(v) = min_ratio {
                settings.min_ratio = v;
            }
            if let Some(v) = max_pvalue {
                settings.max_pvalue = v;
            }
            run::run(
                &target,
                &filter,
                &out_dir,
                settings,
                format.resolve(&config.corpus),
                &config,
            )
        }

        Commands::Simple {
            corpus,
            out_dir,
            format,
            bounds,
        } => simple::run(
            &corpus,
            &out_dir,
            format.resolve(&config.corpus),
            bounds.resolve(&config.vocabulary),
            &config,
        ),
    }
}
