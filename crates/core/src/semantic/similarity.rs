//! Similarity calculations for semantic chunking
//!
//! This module provides the [`SimilarityMeasure`] seam used by the merge
//! passes, the cosine similarity it defaults to, and the small statistics
//! helpers (percentile, median, standard deviation) used for threshold
//! calibration.

use thiserror::Error;

/// Errors that can occur during similarity calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// Vector dimensions do not match
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// One or both vectors are zero vectors (no magnitude)
    #[error("Cannot calculate similarity for zero vector")]
    ZeroVector,

    /// Invalid value encountered (NaN or infinite)
    #[error("Invalid value in similarity calculation: {0}")]
    InvalidValue(String),

    /// A statistic was requested over no values
    #[error("Cannot calculate {0} of an empty set of values")]
    EmptyInput(&'static str),

    /// Percentile outside of 0.0..=1.0
    #[error("Percentile must be between 0.0 and 1.0, got {0}")]
    InvalidPercentile(f32),
}

/// Scores how similar two embedding vectors are
///
/// Higher scores mean more similar. Implementations must be pure: the same
/// pair of vectors always yields the same score.
pub trait SimilarityMeasure: Send + Sync {
    /// Returns the similarity between `a` and `b`
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Cosine similarity between embeddings
///
/// Degenerate inputs (zero vectors, mismatched or empty dimensions) score
/// `0.0`, i.e. "unrelated", so they never trigger a merge at a positive
/// threshold.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::similarity::{CosineSimilarity, SimilarityMeasure};
///
/// let measure = CosineSimilarity;
/// assert!((measure.similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(measure.similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl SimilarityMeasure for CosineSimilarity {
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b).unwrap_or(0.0)
    }
}

/// Calculates the cosine similarity between two vectors
///
/// Cosine similarity measures the cosine of the angle between two vectors,
/// ranging from -1 (opposite) to 1 (identical). A value of 0 indicates
/// orthogonal vectors (no similarity).
///
/// # Errors
///
/// Returns `SimilarityError::DimensionMismatch` if vectors have different (or zero) dimensions
/// Returns `SimilarityError::ZeroVector` if either vector has zero magnitude
/// Returns `SimilarityError::InvalidValue` if NaN or infinite values are encountered
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::similarity::cosine_similarity;
///
/// let a = vec![1.0, 0.0, 0.0];
/// let b = vec![1.0, 0.0, 0.0];
/// let similarity = cosine_similarity(&a, &b).unwrap();
/// assert!((similarity - 1.0).abs() < 0.0001);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() || a.is_empty() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot_product, magnitude_a, magnitude_b) = a.iter().zip(b).fold(
        (0.0f32, 0.0f32, 0.0f32),
        |(dot, mag_a, mag_b), (x, y)| (dot + x * y, mag_a + x * x, mag_b + y * y),
    );

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Err(SimilarityError::ZeroVector);
    }

    let similarity = dot_product / (magnitude_a.sqrt() * magnitude_b.sqrt());

    if similarity.is_nan() {
        return Err(SimilarityError::InvalidValue("NaN".to_string()));
    }
    if similarity.is_infinite() {
        return Err(SimilarityError::InvalidValue("Infinite".to_string()));
    }

    Ok(similarity)
}

/// Calculates similarities between consecutive embeddings
///
/// Returns `embeddings.len() - 1` scores, one per adjacent pair, using the
/// given measure.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::similarity::{pairwise_similarities, CosineSimilarity};
///
/// let embeddings = vec![
///     vec![1.0, 0.0],
///     vec![0.9, 0.1],
///     vec![0.0, 1.0],
/// ];
/// let similarities = pairwise_similarities(&CosineSimilarity, &embeddings);
/// assert_eq!(similarities.len(), 2);
/// ```
pub fn pairwise_similarities(
    measure: &dyn SimilarityMeasure,
    embeddings: &[Vec<f32>],
) -> Vec<f32> {
    embeddings
        .windows(2)
        .map(|pair| measure.similarity(&pair[0], &pair[1]))
        .collect()
}

/// Calculates a percentile value from a sorted or unsorted collection
///
/// Uses the nearest-rank method on a sorted copy: the index is
/// `round(percentile * (len - 1))`.
///
/// # Arguments
///
/// * `values` - Values to compute the percentile from
/// * `percentile` - Percentile to calculate (0.0 to 1.0, e.g. 0.25 for the 25th percentile)
///
/// # Errors
///
/// Returns `SimilarityError::EmptyInput` if `values` is empty and
/// `SimilarityError::InvalidPercentile` if `percentile` is outside 0.0..=1.0
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::similarity::calculate_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(calculate_percentile(&values, 0.5).unwrap(), 3.0);
/// ```
pub fn calculate_percentile(values: &[f32], percentile: f32) -> Result<f32, SimilarityError> {
    if values.is_empty() {
        return Err(SimilarityError::EmptyInput("percentile"));
    }
    if !(0.0..=1.0).contains(&percentile) {
        return Err(SimilarityError::InvalidPercentile(percentile));
    }

    let sorted = sorted_copy(values);
    let index = (percentile * (sorted.len() - 1) as f32).round() as usize;

    Ok(sorted[index.min(sorted.len() - 1)])
}

/// Median of the values, averaging the two middle values for even lengths
pub fn median(values: &[f32]) -> Result<f32, SimilarityError> {
    if values.is_empty() {
        return Err(SimilarityError::EmptyInput("median"));
    }

    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Population standard deviation of the values
pub fn std_dev(values: &[f32]) -> Result<f32, SimilarityError> {
    if values.is_empty() {
        return Err(SimilarityError::EmptyInput("standard deviation"));
    }

    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

    Ok(variance.sqrt())
}

fn sorted_copy(values: &[f32]) -> Vec<f32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let result = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((result - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let result = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!(result.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite_vectors() {
        let result = cosine_similarity(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -3.0]).unwrap();
        assert!((result - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        let result = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(SimilarityError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let result = cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(SimilarityError::ZeroVector)));
    }

    #[test]
    fn test_cosine_similarity_empty_vectors() {
        let result = cosine_similarity(&[], &[]);
        assert!(matches!(
            result,
            Err(SimilarityError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_cosine_similarity_normalized_vectors() {
        // cos(60°) = 0.5
        let result = cosine_similarity(&[1.0, 0.0], &[0.5, 0.866025]).unwrap();
        assert!((result - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_measure_degenerate_inputs_score_zero() {
        let measure = CosineSimilarity;
        assert_eq!(measure.similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(measure.similarity(&[], &[]), 0.0);
        assert_eq!(measure.similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_pairwise_similarities_simple() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]];
        let similarities = pairwise_similarities(&CosineSimilarity, &embeddings);
        assert_eq!(similarities.len(), 2);
        assert!(similarities[0] > 0.9);
        assert!(similarities[1] < 0.5);
    }

    #[test]
    fn test_pairwise_similarities_short_inputs() {
        assert!(pairwise_similarities(&CosineSimilarity, &[vec![1.0, 2.0]]).is_empty());
        assert!(pairwise_similarities(&CosineSimilarity, &[]).is_empty());
    }

    #[test]
    fn test_calculate_percentile_quartiles() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(calculate_percentile(&values, 0.25).unwrap(), 2.0);
        assert_eq!(calculate_percentile(&values, 0.5).unwrap(), 3.0);
        assert_eq!(calculate_percentile(&values, 0.75).unwrap(), 4.0);
    }

    #[test]
    fn test_calculate_percentile_unsorted_and_bounds() {
        let values = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(calculate_percentile(&values, 0.5).unwrap(), 3.0);
        assert_eq!(calculate_percentile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(calculate_percentile(&values, 1.0).unwrap(), 5.0);
    }

    #[test]
    fn test_calculate_percentile_errors() {
        assert_eq!(
            calculate_percentile(&[], 0.5),
            Err(SimilarityError::EmptyInput("percentile"))
        );
        assert_eq!(
            calculate_percentile(&[1.0, 2.0], 1.5),
            Err(SimilarityError::InvalidPercentile(1.5))
        );
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert!(median(&[]).is_err());
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-6);
        assert_eq!(std_dev(&[1.0]).unwrap(), 0.0);
    }
}
