use std::cmp::Ordering;

/// Normalized cosine similarity in `[0, 1]`.
///
/// `1.0` means identical direction, `0.5` orthogonal and `0.0` opposite.
/// Empty vectors, vectors of different length and zero-norm vectors all score
/// `0.0` rather than failing.
pub fn similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    (cosine + 1.0) / 2.0
}

/// Candidate indices ordered by descending [`similarity`] to `query`.
/// Equal scores keep their input order.
pub fn rank_descending<V: AsRef<[f32]>>(query: &[f32], candidates: &[V]) -> Vec<(usize, f64)> {
    let mut scores: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, similarity(query, candidate.as_ref())))
        .collect();

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn identical_vectors_score_one() {
        let vec = vec![0.3, -1.2, 4.5, 0.01];
        assert!(approx_eq(similarity(&vec, &vec), 1.0));
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = [0.2, 0.9, -0.4];
        let b = [1.5, -0.3, 0.8];
        assert!(approx_eq(similarity(&a, &b), similarity(&b, &a)));
    }

    #[test]
    fn orthogonal_scores_half_and_opposite_scores_zero() {
        assert!(approx_eq(similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.5));
        assert!(approx_eq(similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0));
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(similarity(&[], &[1.0, 2.0]), 0.0);
        assert_eq!(similarity(&[1.0, 2.0], &[]), 0.0);
        assert_eq!(similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn scaled_vectors_stay_within_bounds() {
        let a = [1e-3_f32, 2e-3, 3e-3];
        let b = [1e3_f32, 2e3, 3e3];
        let score = similarity(&a, &b);
        assert!((0.0..=1.0).contains(&score));
        assert!(approx_eq(score, 1.0));
    }

    #[test]
    fn ranking_returns_highest_similarity_first() {
        let query = [1.0_f32, 0.0];
        let candidates: Vec<Vec<f32>> = vec![vec![0.8, 0.2], vec![0.1, 0.9], vec![0.9, 0.0]];
        let ranked = rank_descending(&query, &candidates);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 2);
        assert_eq!(ranked[2].0, 1);
        assert!(ranked[0].1 >= ranked[1].1 && ranked[1].1 >= ranked[2].1);
    }

    #[test]
    fn ties_keep_input_order() {
        let query = [1.0_f32, 0.0];
        let same: &[f32] = &[2.0, 0.0];
        let empty: &[f32] = &[];
        let ranked = rank_descending(&query, &[same, empty, same]);
        let order: Vec<usize> = ranked.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }
}
