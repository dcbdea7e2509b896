//! Distance between equal-length vectors.

/// Euclidean distance between two vectors.
///
/// Returns `None` when either vector is empty or the lengths differ.
pub fn calculate_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return None;
    }
    let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(squared.sqrt())
}

/// Sum of squared coordinate differences, without the square root.
///
/// Returns `None` under the same conditions as [`calculate_distance`].
pub fn squared_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum())
}
