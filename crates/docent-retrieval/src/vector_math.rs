use std::cmp::Ordering;

use crate::error::{Result, RetrievalError};

pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32> {
    if query.is_empty() || candidate.is_empty() {
        return Err(RetrievalError::Misconfigured(
            "Vectors must not be empty".to_string(),
        ));
    }
    if query.len() != candidate.len() {
        return Err(RetrievalError::Misconfigured(format!(
            "Vector length mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let dot: f32 = query.iter().zip(candidate).map(|(x, y)| x * y).sum();
    let query_norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    let candidate_norm: f32 = candidate.iter().map(|x| x * x).sum::<f32>().sqrt();

    let denom = query_norm * candidate_norm;
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }
    Ok(dot / denom)
}

/// Highest score first; NaN compares equal
pub fn sort_descending<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
    items.sort_by(|left, right| {
        score(right)
            .partial_cmp(&score(left))
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(approx_eq(score, 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(approx_eq(score, 0.0));
    }

    #[test]
    fn cosine_rejects_mismatched_lengths() {
        assert!(matches!(
            cosine_similarity(&[1.0], &[1.0, 2.0]),
            Err(RetrievalError::Misconfigured(_))
        ));
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn sort_puts_best_first() {
        let mut scores = vec![0.2_f32, 0.9, 0.5];
        sort_descending(&mut scores, |s| *s);
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }
}
