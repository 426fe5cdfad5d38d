mod common;

use common::synthetic_image::{blurred, data_residual, interleave, palindromic, step_bar};
use hopfield_refocus::kernel::blur;
use hopfield_refocus::lambda::{LambdaField, LambdaLaw};
use hopfield_refocus::threshold::ThresholdField;
use hopfield_refocus::{
    Boundary, CancelToken, ImageF64, NoProgress, Outcome, RefocusError, RefocusParams, Refocuser,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn no_blur(iterations: usize) -> RefocusParams {
    RefocusParams {
        radius: 0.0,
        gauss: 0.0,
        motion: 0.0,
        iterations,
        ..Default::default()
    }
}

#[test]
fn flat_gray_image_stays_flat_under_identity_kernel() {
    init_logger();
    let mut planes = vec![ImageF64::filled(4, 4, 0.5)];
    let mut seen = Vec::new();
    let mut sink = |f: f32| seen.push(f);
    let report = Refocuser::new(no_blur(5))
        .restore(&mut planes, &mut sink, &CancelToken::new())
        .unwrap();

    assert_eq!(report.outcome, Outcome::Completed);
    for &v in &planes[0].data {
        assert!((v - 0.5).abs() <= 1.0 / 255.0, "pixel drifted to {v}");
    }
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn zero_iterations_leave_the_image_untouched() {
    init_logger();
    let k = blur::disk(2.0).unwrap();
    let observed = blurred(&step_bar(16, 12), &k, Boundary::Mirror);
    for adaptive in [true, false] {
        let params = RefocusParams {
            radius: 2.0,
            iterations: 0,
            adaptive_smoothing: adaptive,
            ..Default::default()
        };
        let mut planes = vec![observed.clone()];
        let mut last = 0.0f32;
        let mut sink = |f: f32| last = f;
        let report = Refocuser::new(params)
            .restore(&mut planes, &mut sink, &CancelToken::new())
            .unwrap();
        assert_eq!(planes[0], observed, "adaptive={adaptive}");
        assert!(report.sweeps.is_empty());
        assert_eq!(last, 1.0);
    }
}

#[test]
fn progress_is_monotone_and_ends_at_one() {
    init_logger();
    let k = blur::disk(1.5).unwrap();
    let sharp = step_bar(12, 10);
    let mut planes = vec![
        blurred(&sharp, &k, Boundary::Mirror),
        blurred(&sharp, &k, Boundary::Mirror),
        blurred(&sharp, &k, Boundary::Mirror),
    ];
    let params = RefocusParams {
        radius: 1.5,
        iterations: 4,
        window: 2,
        ..Default::default()
    };
    let mut seen = Vec::new();
    let mut sink = |f: f32| seen.push(f);
    let report = Refocuser::new(params)
        .restore(&mut planes, &mut sink, &CancelToken::new())
        .unwrap();

    assert!(report.regularization.adaptive);
    assert_eq!(seen.len(), 4 * 2 * 3);
    assert!(
        seen.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {seen:?}"
    );
    assert_eq!(seen.last().copied(), Some(1.0));
    assert!(seen.iter().all(|&f| (0.0..=1.0).contains(&f)));
}

#[test]
fn cancellation_keeps_partial_result() {
    init_logger();
    let k = blur::disk(2.0).unwrap();
    let observed = blurred(&step_bar(16, 12), &k, Boundary::Mirror);
    let params = RefocusParams {
        radius: 2.0,
        iterations: 10,
        ..Default::default()
    };

    let token = CancelToken::new();
    let trigger = token.clone();
    let mut reports = 0usize;
    let mut last = 0.0f32;
    // Adaptive single plane: lambda, sweep, lambda, ... cancel on the third step.
    let mut sink = |f: f32| {
        reports += 1;
        last = f;
        if reports == 3 {
            trigger.cancel();
        }
    };
    let mut planes = vec![observed.clone()];
    let report = Refocuser::new(params)
        .restore(&mut planes, &mut sink, &token)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Cancelled { iterations_done: 1 });
    assert_eq!(reports, 3);
    assert!(last < 1.0);
    assert_eq!(report.sweeps.len(), 1);
    assert_eq!(report.iterations_done(), 1);
    assert!(planes[0].data.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn cancelling_before_the_run_still_returns_ok() {
    let token = CancelToken::new();
    token.cancel();
    let mut planes = vec![ImageF64::filled(6, 6, 0.3)];
    let params = RefocusParams {
        radius: 1.0,
        iterations: 5,
        ..Default::default()
    };
    let report = Refocuser::new(params)
        .restore(&mut planes, &mut NoProgress, &token)
        .unwrap();
    assert!(matches!(report.outcome, Outcome::Cancelled { .. }));
    assert!(report.sweeps.len() <= 1);
}

#[test]
fn restoration_reduces_the_data_residual() {
    init_logger();
    let k = blur::disk(2.0).unwrap();
    let observed = blurred(&step_bar(24, 16), &k, Boundary::Periodic);
    let params = RefocusParams {
        radius: 2.0,
        lambda: 0.0,
        iterations: 8,
        boundary: Boundary::Periodic,
        seed: 42,
        ..Default::default()
    };
    let mut planes = vec![observed.clone()];
    let report = Refocuser::new(params)
        .restore(&mut planes, &mut NoProgress, &CancelToken::new())
        .unwrap();

    assert!(!report.regularization.smooth);
    assert!(report.sweeps.iter().all(|s| s.energy <= 0.0));
    assert!(report.channel_energy(0) < 0.0);
    let before = data_residual(&observed, &k, &observed);
    let after = data_residual(&planes[0], &k, &observed);
    assert!(after < before, "residual {before} -> {after}");
}

#[test]
fn runs_are_reproducible_for_a_seed() {
    let k = blur::disk(1.5).unwrap();
    let observed = blurred(&step_bar(12, 12), &k, Boundary::Mirror);
    let params = RefocusParams {
        radius: 1.5,
        iterations: 3,
        seed: 7,
        ..Default::default()
    };
    let run = || {
        let mut planes = vec![observed.clone()];
        let report = Refocuser::new(params.clone())
            .restore(&mut planes, &mut NoProgress, &CancelToken::new())
            .unwrap();
        (planes, report.sweeps)
    };
    let (a, sa) = run();
    let (b, sb) = run();
    assert_eq!(a, b);
    assert_eq!(sa, sb);
}

#[test]
fn derived_fields_agree_across_boundary_modes_on_symmetric_input() {
    init_logger();
    let img = palindromic(9, 7);

    let k = blur::disk(2.5).unwrap();
    let tm = ThresholdField::new(&k, &img, Boundary::Mirror).unwrap();
    let tp = ThresholdField::new(&k, &img, Boundary::Periodic).unwrap();
    assert_eq!(tm.as_image(), tp.as_image());

    let filter = blur::gaussian(1.0).unwrap();
    let mut lm =
        LambdaField::new(9, 7, 0.1, 2, Some(&filter), Boundary::Mirror, LambdaLaw::Reciprocal)
            .unwrap();
    let mut lp =
        LambdaField::new(9, 7, 0.1, 2, Some(&filter), Boundary::Periodic, LambdaLaw::Reciprocal)
            .unwrap();
    lm.compute(&img).unwrap();
    lp.compute(&img).unwrap();
    assert_eq!(lm.values(), lp.values());
}

#[test]
fn no_op_runs_agree_across_boundary_modes() {
    // Identity kernel, no regularization: the data term is already satisfied,
    // so neither boundary mode moves a pixel.
    let img = palindromic(9, 7);
    let run = |boundary: Boundary| {
        let params = RefocusParams {
            lambda: 0.0,
            boundary,
            ..no_blur(5)
        };
        let mut planes = vec![img.clone()];
        let report = Refocuser::new(params)
            .restore(&mut planes, &mut NoProgress, &CancelToken::new())
            .unwrap();
        assert!(report.sweeps.iter().all(|s| s.energy == 0.0));
        planes
    };
    let mirror = run(Boundary::Mirror);
    assert_eq!(mirror, run(Boundary::Periodic));
    assert_eq!(mirror[0], img);
}

#[test]
fn interleaved_rgba_keeps_alpha() {
    init_logger();
    let k = blur::disk(1.0).unwrap();
    let sharp = step_bar(8, 6);
    let plane = blurred(&sharp, &k, Boundary::Mirror);
    let mut pixels = interleave(&[plane.clone(), plane.clone(), plane], Some(0.25));
    let params = RefocusParams {
        radius: 1.0,
        iterations: 3,
        ..Default::default()
    };
    let report = Refocuser::new(params)
        .restore_interleaved(&mut pixels, 8, 6, 4, &mut NoProgress, &CancelToken::new())
        .unwrap();

    assert_eq!(report.channels, 3);
    for px in pixels.chunks_exact(4) {
        assert_eq!(px[3], 0.25);
        assert!(px[..3].iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn unsupported_layouts_are_invalid_input() {
    let refocuser = Refocuser::new(no_blur(1));
    let mut pixels = vec![0.5; 4 * 4 * 5];
    let err = refocuser
        .restore_interleaved(&mut pixels, 4, 4, 5, &mut NoProgress, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, RefocusError::InvalidInput(_)));

    let mut short = vec![0.5; 10];
    let err = refocuser
        .restore_interleaved(&mut short, 4, 4, 3, &mut NoProgress, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, RefocusError::InvalidInput(_)));
}

#[test]
fn oversized_variance_window_is_invalid_input() {
    let mut planes = vec![ImageF64::filled(6, 6, 0.5)];
    for window in [0, 17, usize::MAX / 2 + 1] {
        let params = RefocusParams {
            radius: 1.0,
            iterations: 1,
            window,
            ..Default::default()
        };
        let err = Refocuser::new(params)
            .restore(&mut planes, &mut NoProgress, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, RefocusError::InvalidInput(_)), "window {window}");
    }
    assert!(planes[0].data.iter().all(|&v| v == 0.5));
}

#[test]
fn report_serializes_to_json() {
    let mut planes = vec![ImageF64::filled(5, 5, 0.4)];
    let report = Refocuser::new(RefocusParams {
        radius: 1.0,
        iterations: 2,
        ..Default::default()
    })
    .restore(&mut planes, &mut NoProgress, &CancelToken::new())
    .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcome"]["status"], "completed");
    assert_eq!(json["sweeps"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["kernel"]["radius"], 1);
    assert_eq!(json["boundary"], "mirror");
    assert!(json["timings"]["totalMs"].as_f64().is_some());
}
