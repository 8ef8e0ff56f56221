//! Small dense-vector helpers shared by every selection stage.

/// Dot product of two equally sized vectors. Extra trailing components of the
/// longer slice are ignored.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm
pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors and length mismatches score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let n = norm(v);
    if n > 0.0 {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
}

/// Mean of the rows selected by `members`. The result is not re-normalized.
pub fn centroid_of(embeddings: &[Vec<f32>], members: &[usize]) -> Vec<f32> {
    let Some(&first) = members.first() else {
        return Vec::new();
    };
    let mut centroid = vec![0.0; embeddings[first].len()];
    for &idx in members {
        for (c, v) in centroid.iter_mut().zip(embeddings[idx].iter()) {
            *c += v;
        }
    }
    let n = members.len() as f32;
    for c in centroid.iter_mut() {
        *c /= n;
    }
    centroid
}

/// Mean of every row.
pub fn centroid(embeddings: &[Vec<f32>]) -> Vec<f32> {
    let all: Vec<usize> = (0..embeddings.len()).collect();
    centroid_of(embeddings, &all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_sim() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![2.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_centroid_is_plain_mean() {
        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![5.0, 5.0]];
        let c = centroid_of(&rows, &[0, 1]);
        assert_eq!(c, vec![0.5, 0.5]);
        assert!(centroid_of(&rows, &[]).is_empty());
        assert_eq!(centroid(&rows[..2]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
