//! Similarity threshold configuration and calibration

use super::grouping::split_indices;
use super::similarity::{calculate_percentile, median, std_dev, SimilarityError};
use super::types::Sentence;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Upper bound on binary search rounds for [`Threshold::Auto`]
pub const MAX_CALIBRATION_ITERATIONS: usize = 10;

/// How the merge threshold is chosen for a document
///
/// In configuration files a threshold is written as `auto`, a float in
/// `[0, 1]` (fixed), or an integer in `1..=100` (percentile).
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::threshold::Threshold;
///
/// assert_eq!("auto".parse::<Threshold>().unwrap(), Threshold::Auto);
/// assert_eq!("0.7".parse::<Threshold>().unwrap(), Threshold::Fixed(0.7));
/// assert_eq!("90".parse::<Threshold>().unwrap(), Threshold::Percentile(90));
/// assert!("1.5".parse::<Threshold>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "ThresholdRepr", into = "ThresholdRepr")]
pub enum Threshold {
    /// Binary search for a threshold that yields well sized groups
    #[default]
    Auto,
    /// Use this similarity value directly
    Fixed(f32),
    /// Use this percentile of the document's window similarities
    Percentile(u8),
}

impl Threshold {
    /// Checks that the value is in range for its kind
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Threshold::Auto => Ok(()),
            Threshold::Fixed(value) if (0.0..=1.0).contains(&value) => Ok(()),
            Threshold::Fixed(value) => Err(format!(
                "fixed threshold must be between 0.0 and 1.0, got {}",
                value
            )),
            Threshold::Percentile(p) if (1..=100).contains(&p) => Ok(()),
            Threshold::Percentile(p) => Err(format!(
                "percentile threshold must be between 1 and 100, got {}",
                p
            )),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Auto => write!(f, "auto"),
            Threshold::Fixed(value) => write!(f, "{}", value),
            Threshold::Percentile(p) => write!(f, "{}", p),
        }
    }
}

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let threshold = if s.eq_ignore_ascii_case("auto") {
            Threshold::Auto
        } else if let Ok(p) = s.parse::<u8>() {
            Threshold::Percentile(p)
        } else if let Ok(value) = s.parse::<f32>() {
            Threshold::Fixed(value)
        } else {
            return Err(format!(
                "invalid threshold '{}': expected 'auto', a float in [0, 1] or an integer in [1, 100]",
                s
            ));
        };

        threshold.validate()?;
        Ok(threshold)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ThresholdRepr {
    Percentile(u8),
    Value(f32),
    Keyword(String),
}

impl TryFrom<ThresholdRepr> for Threshold {
    type Error = String;

    fn try_from(repr: ThresholdRepr) -> Result<Self, Self::Error> {
        let threshold = match repr {
            ThresholdRepr::Percentile(p) => Threshold::Percentile(p),
            ThresholdRepr::Value(value) => Threshold::Fixed(value),
            ThresholdRepr::Keyword(s) => return s.parse(),
        };
        threshold.validate()?;
        Ok(threshold)
    }
}

impl From<Threshold> for ThresholdRepr {
    fn from(threshold: Threshold) -> Self {
        match threshold {
            Threshold::Auto => ThresholdRepr::Keyword("auto".to_string()),
            Threshold::Fixed(value) => ThresholdRepr::Value(value),
            Threshold::Percentile(p) => ThresholdRepr::Percentile(p),
        }
    }
}

/// Resolves a [`Threshold`] to a similarity value for one document
#[derive(Debug, Clone)]
pub struct ThresholdCalibrator {
    pub chunk_size: usize,
    pub min_chunk_size: usize,
    pub min_sentences: usize,
    pub threshold_step: f32,
}

impl ThresholdCalibrator {
    /// Calibrates against the document's sentences and window similarities
    ///
    /// # Errors
    ///
    /// Returns `SimilarityError::EmptyInput` when a data-driven threshold is
    /// requested but there are no similarities to derive it from
    pub fn calibrate(
        &self,
        threshold: Threshold,
        sentences: &[Sentence],
        similarities: &[f32],
    ) -> Result<f32, SimilarityError> {
        let value = match threshold {
            Threshold::Fixed(value) => value,
            Threshold::Percentile(p) => calculate_percentile(similarities, f32::from(p) / 100.0)?,
            Threshold::Auto => self.binary_search(sentences, similarities)?,
        };

        debug!("Calibrated similarity threshold ({}) to {:.4}", threshold, value);
        Ok(value)
    }

    fn binary_search(
        &self,
        sentences: &[Sentence],
        similarities: &[f32],
    ) -> Result<f32, SimilarityError> {
        let center = median(similarities)?;
        let spread = std_dev(similarities)?;

        let mut low = (center - spread).clamp(0.0, 1.0);
        let mut high = (center + spread).clamp(0.0, 1.0);
        let mut threshold = (low + high) / 2.0;

        let mut token_prefix = Vec::with_capacity(sentences.len() + 1);
        token_prefix.push(0usize);
        for sentence in sentences {
            token_prefix.push(token_prefix[token_prefix.len() - 1] + sentence.token_count);
        }

        let mut iterations = 0;
        while (high - low).abs() > self.threshold_step {
            threshold = (low + high) / 2.0;

            let boundaries = split_indices(similarities, threshold, self.min_sentences);
            let (median_tokens, median_sentences) = segment_medians(&boundaries, &token_prefix);

            if median_tokens <= self.chunk_size as f32
                && median_sentences >= self.min_chunk_size as f32
            {
                break;
            } else if median_tokens > self.chunk_size as f32 {
                // Groups too large: cut more often
                low = threshold;
            } else {
                high = threshold;
            }

            iterations += 1;
            if iterations > MAX_CALIBRATION_ITERATIONS {
                break;
            }
        }

        debug!(
            "Auto threshold search finished after {} iterations (median {:.4}, std {:.4})",
            iterations, center, spread
        );

        Ok(threshold)
    }
}

/// Median token count and median sentence count of the segments
fn segment_medians(boundaries: &[usize], token_prefix: &[usize]) -> (f32, f32) {
    let (tokens, sizes): (Vec<f32>, Vec<f32>) = boundaries
        .windows(2)
        .map(|w| {
            let end = w[1].min(token_prefix.len() - 1);
            let tokens = token_prefix[end] - token_prefix[w[0].min(end)];
            (tokens as f32, (w[1] - w[0]) as f32)
        })
        .unzip();

    (
        median(&tokens).unwrap_or(0.0),
        median(&sizes).unwrap_or(0.0),
    )
}
