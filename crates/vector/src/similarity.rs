use ndarray::ArrayView1;

/// Guards the division when either vector is all zeros
pub const COSINE_EPSILON: f32 = 1e-10;

/// Cosine similarity: `dot(a, b) / (|a| * |b| + eps)`.
///
/// Callers must pass equal-length slices.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    dot / (norm_a * norm_b + COSINE_EPSILON)
}
