//! # Property-Based Tests
//!
//! Determinism and correctness invariants of the pipeline and derivations.

use proptest::collection::vec;
use proptest::prelude::*;
use smartraise_core::records::{annual_salary, attendance_estimate, kpi_score, peer_review_score};
use smartraise_core::{
    Artifacts, LinearRegression, LogisticRegression, ModelSpec, Prediction, Scaler,
    SmartRaiseError, StandardScaler, model_from_bytes, model_to_bytes, model_to_json,
    scaler_from_bytes, scaler_to_bytes, scaler_to_json,
};

fn scaler_params() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..16).prop_flat_map(|n| {
        (
            vec(-1.0e3f64..1.0e3, n),
            vec(prop_oneof![0.01f64..1.0e3, -1.0e3f64..-0.01], n),
        )
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Scaling then unscaling returns the input.
    #[test]
    fn scaler_round_trip((mean, scale) in scaler_params(), seed in -1.0e3f64..1.0e3) {
        let n = mean.len();
        let scaler = StandardScaler::new(mean, scale).expect("scaler");
        let x: Vec<f64> = (0..n).map(|i| seed + i as f64).collect();

        let back = scaler
            .inverse_transform(&scaler.transform(&x).expect("transform"))
            .expect("inverse");
        for (a, b) in x.iter().zip(&back) {
            prop_assert!(close(*a, *b), "{} vs {}", a, b);
        }
    }

    /// Same artifacts and same input produce the same prediction.
    #[test]
    fn prediction_is_deterministic(
        (mean, scale) in scaler_params(),
        intercept in -10.0f64..10.0,
    ) {
        let n = mean.len();
        let model = ModelSpec::LinearRegression(LinearRegression {
            coefficients: (0..n).map(|i| i as f64 - 1.5).collect(),
            intercept,
        });
        let pipeline = Artifacts::new(
            StandardScaler::new(mean, scale).expect("scaler"),
            model,
        )
        .expect("pair")
        .into_pipeline();
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 3.0).collect();

        let first = pipeline.predict(&x).expect("predict");
        for _ in 0..5 {
            prop_assert_eq!(pipeline.predict(&x).expect("predict"), first);
        }
    }

    /// Any length other than the fitted count is rejected with both counts.
    #[test]
    fn wrong_length_is_shape_mismatch(n in 1usize..12, actual in 0usize..24) {
        prop_assume!(actual != n);
        let model = ModelSpec::LinearRegression(LinearRegression {
            coefficients: vec![1.0; n],
            intercept: 0.0,
        });
        let pipeline = Artifacts::new(
            StandardScaler::new(vec![0.0; n], vec![1.0; n]).expect("scaler"),
            model,
        )
        .expect("pair")
        .into_pipeline();

        let err = pipeline.predict(&vec![1.0; actual]);
        let is_mismatch = matches!(
            err,
            Err(SmartRaiseError::FeatureShapeMismatch { expected, actual: got })
                if expected == n && got == actual
        );
        prop_assert!(is_mismatch, "got {:?}", err);
    }

    /// A classifier only ever returns one of its classes.
    #[test]
    fn classifier_output_is_a_known_class(x in vec(-100.0f64..100.0, 2)) {
        let classes = vec![2, 3, 4];
        let model = ModelSpec::LogisticRegression(LogisticRegression {
            classes: classes.clone(),
            coefficients: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            intercepts: vec![0.0, 0.0, 0.0],
        });
        let pipeline = Artifacts::new(
            StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0]).expect("scaler"),
            model,
        )
        .expect("pair")
        .into_pipeline();

        match pipeline.predict(&x).expect("predict") {
            Prediction::Class(label) => prop_assert!(classes.contains(&label)),
            Prediction::Score(_) => prop_assert!(false, "classifier returned a score"),
        }
    }

    /// Finite input either predicts a finite value or is refused.
    #[test]
    fn finite_input_never_predicts_non_finite(
        x in vec(any::<f64>().prop_filter("finite", |v| v.is_finite()), 2),
        scale in prop_oneof![Just(1e-300f64), Just(1e-10), Just(1.0)],
    ) {
        let model = ModelSpec::LinearRegression(LinearRegression {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        });
        let pipeline = Artifacts::new(
            StandardScaler::new(vec![0.0, 0.0], vec![scale, 1.0]).expect("scaler"),
            model,
        )
        .expect("pair")
        .into_pipeline();

        match pipeline.predict(&x) {
            Ok(prediction) => prop_assert!(prediction.as_f64().is_finite()),
            Err(err) => {
                let refused = matches!(err, SmartRaiseError::MalformedRequest(_));
                prop_assert!(refused, "unexpected error {:?}", err);
            }
        }
    }

    /// Binary and JSON encodings decode to the same artifacts.
    #[test]
    fn encodings_agree((mean, scale) in scaler_params(), intercept in -5.0f64..5.0) {
        let n = mean.len();
        let scaler = StandardScaler::new(mean, scale).expect("scaler");
        let model = ModelSpec::LinearRegression(LinearRegression {
            coefficients: vec![0.5; n],
            intercept,
        });

        let from_bin = scaler_from_bytes(&scaler_to_bytes(&scaler).expect("bin")).expect("decode");
        let from_json = scaler_from_bytes(&scaler_to_json(&scaler).expect("json")).expect("decode");
        prop_assert_eq!(&from_bin, &from_json);
        prop_assert_eq!(&from_bin, &scaler);

        let m_bin = model_from_bytes(&model_to_bytes(&model).expect("bin")).expect("decode");
        let m_json = model_from_bytes(&model_to_json(&model).expect("json")).expect("decode");
        prop_assert_eq!(m_bin, m_json);
    }

    /// Salary is linear in the hourly rate.
    #[test]
    fn salary_scales_with_rate(rate in 0.0f64..500.0) {
        let salary = annual_salary(rate).expect("salary");
        prop_assert!(close(salary, rate * 2080.0));
        prop_assert!(annual_salary(-rate - 0.01).is_err());
    }

    /// Rating-derived scores stay in 20..=100.
    #[test]
    fn rating_scores_bounded(rating in 1.0f64..=5.0) {
        let kpi = kpi_score(rating).expect("kpi");
        let peer = peer_review_score(rating).expect("peer");
        prop_assert!((20.0..=100.0).contains(&kpi));
        prop_assert_eq!(kpi, peer);
    }

    /// Attendance is 90 only for the frequent-travel label.
    #[test]
    fn attendance_depends_only_on_frequent_travel(label in "[A-Za-z_-]{0,20}") {
        let expected = if label == "Travel_Frequently" { 90.0 } else { 100.0 };
        prop_assert_eq!(attendance_estimate(&label), expected);
    }
}
