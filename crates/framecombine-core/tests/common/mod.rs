#![allow(dead_code)]

use ndarray::{Array2, ArrayView2};

/// Frames of shape (h, w), each filled with one value.
pub fn constant_frames(h: usize, w: usize, values: &[f32]) -> Vec<Array2<f32>> {
    values
        .iter()
        .map(|&v| Array2::from_elem((h, w), v))
        .collect()
}

/// `n` masks of shape (h, w) with nothing excluded.
pub fn clear_masks(n: usize, h: usize, w: usize) -> Vec<Array2<bool>> {
    (0..n).map(|_| Array2::from_elem((h, w), false)).collect()
}

/// Borrow every array in a stack.
pub fn views<A>(arrays: &[Array2<A>]) -> Vec<ArrayView2<'_, A>> {
    arrays.iter().map(|a| a.view()).collect()
}

/// Deterministic pseudo-random frames in [0, 1) from a small LCG.
pub fn noise_frames(n: usize, h: usize, w: usize, seed: u64) -> Vec<Array2<f32>> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..n)
        .map(|_| {
            Array2::from_shape_fn((h, w), |_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 40) as f32) / (1u64 << 24) as f32
            })
        })
        .collect()
}

/// Masks excluding a sparse, frame-dependent pattern of pixels.
pub fn pattern_masks(n: usize, h: usize, w: usize) -> Vec<Array2<bool>> {
    (0..n)
        .map(|i| Array2::from_shape_fn((h, w), |(r, c)| (r * 7 + c * 3 + i * 5) % 11 == 0))
        .collect()
}
