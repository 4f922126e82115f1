//! Chunking configuration.
//!
//! [`ChunkingConfig`] is a plain value: every field is public and can be set
//! independently, and it deserializes from any serde format with per-field
//! defaults. Call [`ChunkingConfig::validate`] before use. The chunk manager
//! refuses to start with a config that does not validate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Where a chunk is allowed to start and end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryStrategy {
    Sentence,
    Paragraph,
    Section,
    Page,
    #[default]
    Semantic,
    SlidingWindow,
}

impl BoundaryStrategy {
    /// String form (matches serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
            Self::Section => "section",
            Self::Page => "page",
            Self::Semantic => "semantic",
            Self::SlidingWindow => "sliding_window",
        }
    }
}

impl fmt::Display for BoundaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentence" => Ok(Self::Sentence),
            "paragraph" => Ok(Self::Paragraph),
            "section" => Ok(Self::Section),
            "page" => Ok(Self::Page),
            "semantic" => Ok(Self::Semantic),
            "sliding_window" | "sliding-window" => Ok(Self::SlidingWindow),
            other => Err(format!("unknown boundary strategy: {other}")),
        }
    }
}

/// Chunking configuration. Sizes are in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Preferred chunk length
    #[serde(default = "default_target_chunk_size")]
    pub target_chunk_size: usize,

    /// Chunks shorter than this are dropped after chunking
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Hard upper bound on chunk length
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Upper bound on overlap content copied from the previous chunk
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,

    /// Overlap as a fraction of the target size (0 to 0.5)
    #[serde(default = "default_overlap_percentage")]
    pub overlap_percentage: f64,

    /// Boundary policy for the semantic strategy
    #[serde(default)]
    pub boundary_strategy: BoundaryStrategy,

    /// Chunk PDFs along page breaks when page hints are present
    #[serde(default = "default_true")]
    pub pdf_respect_pages: bool,

    /// Chunk DOCX files along section hints when present
    #[serde(default = "default_true")]
    pub docx_respect_sections: bool,

    /// Chunk CSV files in row batches
    #[serde(default = "default_true")]
    pub csv_chunk_by_rows: bool,

    /// Data rows per CSV chunk
    #[serde(default = "default_csv_rows_per_chunk")]
    pub csv_rows_per_chunk: usize,

    /// Extract dates, URLs and emails into chunk metadata
    #[serde(default = "default_true")]
    pub enable_entity_extraction: bool,

    /// Extract citation-like references into chunk metadata
    #[serde(default = "default_true")]
    pub enable_reference_tracking: bool,

    /// Compute per-chunk keywords
    #[serde(default = "default_true")]
    pub enable_semantic_analysis: bool,

    /// Classify heading chunks as headings
    #[serde(default = "default_true")]
    pub preserve_headers: bool,

    /// Classify bullet/numbered chunks as lists
    #[serde(default = "default_true")]
    pub preserve_lists: bool,

    /// Classify pipe tables as tables
    #[serde(default = "default_true")]
    pub preserve_tables: bool,

    /// Keep fenced code blocks whole and classify them as code
    #[serde(default = "default_true")]
    pub preserve_code_blocks: bool,

    /// Language tag recorded on every chunk
    #[serde(default = "default_language")]
    pub language: String,

    /// Confidence scoring parameters
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_target_chunk_size() -> usize {
    1000
}

fn default_min_chunk_size() -> usize {
    100
}

fn default_max_chunk_size() -> usize {
    2000
}

fn default_overlap_size() -> usize {
    200
}

fn default_overlap_percentage() -> f64 {
    0.1
}

fn default_csv_rows_per_chunk() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: default_target_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
            overlap_percentage: default_overlap_percentage(),
            boundary_strategy: BoundaryStrategy::default(),
            pdf_respect_pages: true,
            docx_respect_sections: true,
            csv_chunk_by_rows: true,
            csv_rows_per_chunk: default_csv_rows_per_chunk(),
            enable_entity_extraction: true,
            enable_reference_tracking: true,
            enable_semantic_analysis: true,
            preserve_headers: true,
            preserve_lists: true,
            preserve_tables: true,
            preserve_code_blocks: true,
            language: default_language(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl ChunkingConfig {
    /// Check every constraint, reporting the first one violated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_chunk_size == 0 {
            return Err(ConfigError::ZeroSize("min_chunk_size"));
        }
        if self.min_chunk_size > self.target_chunk_size
            || self.target_chunk_size > self.max_chunk_size
        {
            return Err(ConfigError::SizeOrdering {
                min: self.min_chunk_size,
                target: self.target_chunk_size,
                max: self.max_chunk_size,
            });
        }
        if self.overlap_size >= self.target_chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.overlap_size,
                target: self.target_chunk_size,
            });
        }
        if !(0.0..=0.5).contains(&self.overlap_percentage) {
            return Err(ConfigError::OverlapPercentage(self.overlap_percentage));
        }
        if self.csv_rows_per_chunk == 0 {
            return Err(ConfigError::InvalidRowBatch);
        }
        self.scoring.validate()
    }

    /// Overlap budget in characters: the smaller of `overlap_size` and
    /// `overlap_percentage` of the target size.
    #[must_use]
    pub fn effective_overlap(&self) -> usize {
        let by_percentage = (self.target_chunk_size as f64 * self.overlap_percentage) as usize;
        self.overlap_size.min(by_percentage.max(1))
    }
}

/// Parameters of the confidence heuristic.
///
/// The score starts at 1.0 and is multiplied by a penalty for each failed
/// check; the product is clamped to `[0.1, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Lower bound of the acceptable `len / target_chunk_size` ratio
    #[serde(default = "default_size_ratio_min")]
    pub size_ratio_min: f64,

    /// Upper bound of the acceptable `len / target_chunk_size` ratio
    #[serde(default = "default_size_ratio_max")]
    pub size_ratio_max: f64,

    /// Multiplier applied when the size ratio is out of band
    #[serde(default = "default_size_penalty")]
    pub size_penalty: f64,

    /// Base of the sentence completeness factor
    #[serde(default = "default_completeness_base")]
    pub completeness_base: f64,

    /// Fragments longer than this count as complete sentences
    #[serde(default = "default_complete_fragment_len")]
    pub complete_fragment_len: usize,

    /// Noise character ratio above which the noise penalty applies
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: f64,

    /// Multiplier applied to noisy chunks
    #[serde(default = "default_noise_penalty")]
    pub noise_penalty: f64,
}

fn default_size_ratio_min() -> f64 {
    0.3
}

fn default_size_ratio_max() -> f64 {
    3.0
}

fn default_size_penalty() -> f64 {
    0.7
}

fn default_completeness_base() -> f64 {
    0.5
}

fn default_complete_fragment_len() -> usize {
    10
}

fn default_noise_threshold() -> f64 {
    0.3
}

fn default_noise_penalty() -> f64 {
    0.8
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            size_ratio_min: default_size_ratio_min(),
            size_ratio_max: default_size_ratio_max(),
            size_penalty: default_size_penalty(),
            completeness_base: default_completeness_base(),
            complete_fragment_len: default_complete_fragment_len(),
            noise_threshold: default_noise_threshold(),
            noise_penalty: default_noise_penalty(),
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.size_ratio_min >= 0.0 && self.size_ratio_min < self.size_ratio_max) {
            return Err(ConfigError::Scoring(format!(
                "size ratio band [{}, {}] is empty",
                self.size_ratio_min, self.size_ratio_max
            )));
        }
        for (name, value) in [
            ("size_penalty", self.size_penalty),
            ("completeness_base", self.completeness_base),
            ("noise_penalty", self.noise_penalty),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Scoring(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.noise_threshold) {
            return Err(ConfigError::Scoring(format!(
                "noise_threshold must be within [0, 1], got {}",
                self.noise_threshold
            )));
        }
        Ok(())
    }
}
