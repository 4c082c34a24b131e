//! Cosine similarity between name embeddings.

/// Cosine of the angle between `a` and `b`, in [-1.0, 1.0].
///
/// A zero-norm vector (e.g. an embedding of text the model has nothing to
/// say about) is similar to nothing and yields 0.0.
///
/// # Panics
/// Panics if the vectors differ in length. Every embedding in a process
/// comes from one model, so mixed lengths mean a broken pipeline.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "Embedding dimensions differ: {} vs {}",
        a.len(),
        b.len()
    );

    let (dot, sq_a, sq_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f32, 0.0_f32, 0.0_f32), |(dot, sq_a, sq_b), (x, y)| {
            (dot + x * y, sq_a + x * x, sq_b + y * y)
        });

    if sq_a == 0.0 || sq_b == 0.0 {
        return 0.0;
    }
    dot / (sq_a.sqrt() * sq_b.sqrt())
}
