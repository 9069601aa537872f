mod common;

use approx::assert_abs_diff_eq;

use framecombine_core::combine::{CombineFunction, CombineOptions, CombineResult, FrameFactors};
use framecombine_core::error::CombineError;
use framecombine_core::stack::mean::Mean;
use framecombine_core::stack::median::Median;
use framecombine_core::stack::minmax::{MinMax, MinMaxParams};
use framecombine_core::stack::sigma_clip::{SigmaClip, SigmaClipParams};
use framecombine_core::stack::CombineMethod;
use ndarray::Ix2;

use common::{clear_masks, constant_frames, views};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Combine 8x8 frames, each filled with one of `values`.
fn run(method: &CombineMethod, values: &[f32]) -> CombineResult<Ix2> {
    run_weighted(method, values, FrameFactors::uniform(values.len()))
}

fn run_weighted(method: &CombineMethod, values: &[f32], factors: FrameFactors) -> CombineResult<Ix2> {
    let frames = constant_frames(8, 8, values);
    let masks = clear_masks(values.len(), 8, 8);
    method
        .combine_owned(
            &views(&frames),
            &views(&masks),
            &factors,
            &CombineOptions::default(),
        )
        .unwrap()
}

fn assert_uniform(result: &CombineResult<Ix2>, value: f32, variance: f32, count: u32) {
    for ((&v, &var), &c) in result
        .value
        .iter()
        .zip(result.variance.iter())
        .zip(result.count.iter())
    {
        assert_abs_diff_eq!(v, value, epsilon = 1e-4);
        assert_abs_diff_eq!(var, variance, epsilon = 1e-4);
        assert_eq!(c, count);
    }
}

// ---------------------------------------------------------------------------
// Mean
// ---------------------------------------------------------------------------

#[test]
fn test_mean_single_frame() {
    let result = run(&CombineMethod::Mean, &[0.7]);
    assert_uniform(&result, 0.7, 0.0, 1);
}

#[test]
fn test_mean_uniform_weights() {
    let result = run(&CombineMethod::Mean, &[1.0, 2.0, 3.0, 6.0]);
    // mean 3, sample variance (4 + 1 + 0 + 9) / 3
    assert_uniform(&result, 3.0, 14.0 / 3.0, 4);
}

#[test]
fn test_mean_zero_weight_drops_frame_value() {
    let factors = FrameFactors::uniform(3).with_weights(vec![1.0, 1.0, 0.0]);
    let result = run_weighted(&CombineMethod::Mean, &[4.0, 6.0, 1000.0], factors);
    assert_abs_diff_eq!(result.value[[3, 3]], 5.0, epsilon = 1e-4);
    // The zero-weighted sample was still handed to the function.
    assert_eq!(result.count[[3, 3]], 3);
}

#[test]
fn test_mean_tiny_weights_keep_their_ratio() {
    let factors = FrameFactors::uniform(2).with_weights(vec![1e-13, 0.0]);
    let result = run_weighted(&CombineMethod::Mean, &[0.0, 100.0], factors);
    assert_uniform(&result, 0.0, 0.0, 2);
}

#[test]
fn test_mean_reduce_directly() {
    let mut values = vec![10.0, 20.0, 30.0];
    let mut weights = vec![1.0; 3];
    let c = Mean.reduce(&mut values, &mut weights, &());
    assert_abs_diff_eq!(c.value, 20.0, epsilon = 1e-12);
    assert_abs_diff_eq!(c.variance, 100.0, epsilon = 1e-9);
    assert_eq!(c.count, 3);
    assert_eq!(Mean.name(), "mean");
}

// ---------------------------------------------------------------------------
// Median
// ---------------------------------------------------------------------------

#[test]
fn test_median_odd_count() {
    let result = run(&CombineMethod::Median, &[0.1, 0.9, 0.5]);
    // Deviations [0.4, 0.4, 0.0] have median 0.4.
    let sigma = 1.4826f32 * 0.4;
    assert_uniform(&result, 0.5, sigma * sigma, 3);
}

#[test]
fn test_median_even_count() {
    let result = run(&CombineMethod::Median, &[0.1, 0.3, 0.7, 0.9]);
    assert_abs_diff_eq!(result.value[[0, 0]], 0.5, epsilon = 1e-5);
    assert_eq!(result.count[[0, 0]], 4);
}

#[test]
fn test_median_rejects_outlier() {
    let result = run(&CombineMethod::Median, &[1.0, 2.0, 3.0, 4.0, 100.0]);
    // MAD of [2, 1, 0, 1, 97] is 1.
    assert_uniform(&result, 3.0, 1.4826 * 1.4826, 5);
}

#[test]
fn test_median_ignores_weights() {
    let mut values = vec![1.0, 2.0, 3.0, 4.0, 100.0];
    let mut weights = vec![1000.0, 0.0, 0.0, 0.0, 1000.0];
    let c = Median.reduce(&mut values, &mut weights, &());
    assert_abs_diff_eq!(c.value, 3.0, epsilon = 1e-12);
    assert_eq!(c.count, 5);
}

#[test]
fn test_median_large_frame_parallel_path() {
    // 300x300 = 90000 pixels, above the parallel threshold
    let frames = constant_frames(300, 300, &[0.2, 0.4, 0.6]);
    let masks = clear_masks(3, 300, 300);
    let result = CombineMethod::Median
        .combine_owned(
            &views(&frames),
            &views(&masks),
            &FrameFactors::uniform(3),
            &CombineOptions::default(),
        )
        .unwrap();
    assert!(result.value.iter().all(|&v| (v - 0.4).abs() < 1e-5));
}

// ---------------------------------------------------------------------------
// Sigma clip
// ---------------------------------------------------------------------------

#[test]
fn test_sigma_clip_params_default() {
    let p = SigmaClipParams::default();
    assert_eq!(p.sigma_low, 3.0);
    assert_eq!(p.sigma_high, 3.0);
    assert_eq!(p.iterations, 3);
    assert!(p.validate().is_ok());
}

#[test]
fn test_sigma_clip_params_validate() {
    assert!(SigmaClipParams::symmetric(0.0, 3).validate().is_err());
    assert!(SigmaClipParams::symmetric(2.0, 0).validate().is_err());
    let negative = SigmaClipParams {
        sigma_low: -1.0,
        ..Default::default()
    };
    assert!(negative.validate().is_err());
}

#[test]
fn test_sigma_clip_rejects_hot_outlier() {
    let mut values = vec![10.0f32; 20];
    values.push(1000.0);
    let result = run(&CombineMethod::SigmaClip(SigmaClipParams::default()), &values);
    assert_uniform(&result, 10.0, 0.0, 20);
}

#[test]
fn test_sigma_clip_asymmetric_thresholds() {
    let values = [0.0f32, 4.0, 5.0, 6.0, 10.0];

    // Tight low side only: 0 goes, 10 stays.
    let asym = SigmaClipParams {
        sigma_low: 1.0,
        sigma_high: 3.0,
        iterations: 5,
    };
    let result = run(&CombineMethod::SigmaClip(asym), &values);
    assert_abs_diff_eq!(result.value[[0, 0]], 6.25, epsilon = 1e-5);
    assert_eq!(result.count[[0, 0]], 4);

    // Tight on both sides: 0 and 10 go.
    let sym = SigmaClipParams::symmetric(1.0, 5);
    let result = run(&CombineMethod::SigmaClip(sym), &values);
    assert_abs_diff_eq!(result.value[[0, 0]], 5.0, epsilon = 1e-5);
    assert_abs_diff_eq!(result.variance[[0, 0]], 1.0, epsilon = 1e-5);
    assert_eq!(result.count[[0, 0]], 3);
}

#[test]
fn test_sigma_clip_too_few_samples_is_plain_mean() {
    let params = SigmaClipParams::symmetric(0.1, 10);
    let result = run(&CombineMethod::SigmaClip(params), &[1.0, 9.0]);
    assert_uniform(&result, 5.0, 32.0, 2);
}

#[test]
fn test_sigma_clip_identical_samples() {
    let mut values = vec![0.5; 7];
    let mut weights = vec![1.0; 7];
    let c = SigmaClip.reduce(&mut values, &mut weights, &SigmaClipParams::default());
    assert_abs_diff_eq!(c.value, 0.5, epsilon = 1e-12);
    assert_eq!(c.variance, 0.0);
    assert_eq!(c.count, 7);
}

#[test]
fn test_sigma_clip_invalid_params_rejected_before_combining() {
    let frames = constant_frames(4, 4, &[1.0, 2.0]);
    let masks = clear_masks(2, 4, 4);
    let method = CombineMethod::SigmaClip(SigmaClipParams::symmetric(-2.0, 3));
    let err = method
        .combine_owned(
            &views(&frames),
            &views(&masks),
            &FrameFactors::uniform(2),
            &CombineOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CombineError::InvalidParameter(_)));
}

// ---------------------------------------------------------------------------
// Min/max rejection
// ---------------------------------------------------------------------------

#[test]
fn test_minmax_drops_extremes() {
    let method = CombineMethod::MinMax(MinMaxParams::default());
    let result = run(&method, &[4.0, 100.0, 2.0, 3.0, -50.0]);
    assert_uniform(&result, 3.0, 1.0, 3);
}

#[test]
fn test_minmax_asymmetric_counts() {
    let method = CombineMethod::MinMax(MinMaxParams { nlow: 0, nhigh: 2 });
    let result = run(&method, &[1.0, 2.0, 3.0, 50.0, 60.0]);
    assert_uniform(&result, 2.0, 1.0, 3);
}

#[test]
fn test_minmax_rejects_nothing_when_too_few() {
    let mut values = vec![1.0, 5.0];
    let mut weights = vec![1.0, 1.0];
    let c = MinMax.reduce(&mut values, &mut weights, &MinMaxParams { nlow: 1, nhigh: 1 });
    assert_abs_diff_eq!(c.value, 3.0, epsilon = 1e-12);
    assert_eq!(c.count, 2);
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn test_method_default_is_mean() {
    assert_eq!(CombineMethod::default(), CombineMethod::Mean);
}

#[test]
fn test_method_names() {
    assert_eq!(CombineMethod::Mean.name(), "mean");
    assert_eq!(CombineMethod::Median.name(), "median");
    assert_eq!(
        CombineMethod::SigmaClip(SigmaClipParams::default()).name(),
        SigmaClip.name()
    );
    assert_eq!(
        CombineMethod::MinMax(MinMaxParams::default()).name(),
        MinMax.name()
    );
}

#[test]
fn test_method_display() {
    assert_eq!(format!("{}", CombineMethod::Mean), "Mean");
    assert_eq!(format!("{}", CombineMethod::Median), "Median");
    assert_eq!(
        format!("{}", CombineMethod::SigmaClip(SigmaClipParams::symmetric(2.5, 4))),
        "Sigma Clip (low 2.5, high 2.5, 4 iter)"
    );
    assert_eq!(
        format!("{}", CombineMethod::MinMax(MinMaxParams { nlow: 2, nhigh: 1 })),
        "Min/Max (drop 2 low, 1 high)"
    );
}

#[test]
fn test_method_combine_into_caller_outputs() {
    let frames = constant_frames(3, 5, &[1.0, 2.0, 3.0]);
    let masks = clear_masks(3, 3, 5);
    let mut result = CombineResult::zeros(Ix2(3, 5));
    CombineMethod::Median
        .combine(
            &views(&frames),
            &views(&masks),
            &FrameFactors::uniform(3),
            &mut result.outputs_mut(),
            &CombineOptions::default(),
        )
        .unwrap();
    assert!(result.value.iter().all(|&v| (v - 2.0).abs() < 1e-6));
    assert!(result.count.iter().all(|&c| c == 3));
}
