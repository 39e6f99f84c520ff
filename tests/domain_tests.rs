use rand::Rng;
use webdice_chart::custom_chart::ExtentRules;
use webdice_chart::data_types::{AxisDomain, AxisFormat, ScaleKind, TimeUnit};
use webdice_chart::scales::ChartScale;
use webdice_chart::series_store::year_timestamp;
use std::collections::{BTreeMap, BTreeSet};

#[test]
fn test_compute_contains_every_value() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let n = rng.random_range(1..40);
        let values: Vec<f64> = (0..n).map(|_| rng.random_range(-1.0e4..1.0e4)).collect();
        let (lo, hi) = AxisDomain::compute(&values, false);
        assert!(hi > lo);
        for v in &values {
            assert!(lo <= *v && *v <= hi, "{v} outside [{lo}, {hi}]");
        }
    }
}

#[test]
fn test_floor_zero_never_goes_negative() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let n = rng.random_range(1..40);
        let values: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..500.0)).collect();
        let (lo, hi) = AxisDomain::compute(&values, true);
        assert!(lo >= 0.0, "negative lower bound {lo}");
        assert!(values.iter().all(|v| *v <= hi));
    }
}

#[test]
fn test_floor_zero_ignored_for_negative_data() {
    let (lo, _) = AxisDomain::compute(&[-3.0, 4.0], true);
    assert!(lo < -3.0);
}

#[test]
fn test_degenerate_domains_are_widened() {
    let single = AxisDomain::compute(&[3.0], false);
    assert!(single.1 > single.0);
    assert!(single.0 <= 3.0 && 3.0 <= single.1);

    let constant = AxisDomain::compute(&[7.5; 12], false);
    assert!(constant.1 > constant.0);

    assert_eq!(AxisDomain::compute(&[], false), (0.0, 1.0));
    assert_eq!(AxisDomain::compute(&[f64::NAN, f64::INFINITY], false), (0.0, 1.0));

    assert_eq!(AxisDomain::non_degenerate((5.0, 5.0)), (4.0, 6.0));
    assert_eq!(AxisDomain::non_degenerate((0.5, 0.5)), (0.0, 1.5));
    assert_eq!(AxisDomain::non_degenerate((f64::NAN, 1.0)), (0.0, 1.0));
}

#[test]
fn test_extent_rules_clip_and_log() {
    let rules = ExtentRules {
        floors: BTreeMap::from([("utility".to_string(), -1.0)]),
        floor_zero: BTreeSet::from(["emissions".to_string()]),
    };

    let (lo, hi) = rules.extent(Some("utility"), &[-5.0, 2.0], false);
    assert_eq!(lo, -1.0);
    assert!(hi >= 2.0);

    let (lo, _) = rules.extent(Some("emissions"), &[0.1, 9.0], false);
    assert!(lo >= 0.0);

    // non-positive values do not count on a log axis
    assert_eq!(rules.extent(Some("x"), &[0.0, -1.0, 10.0, 100.0], true), (10.0, 100.0));
    assert_eq!(rules.extent(Some("x"), &[5.0], true), (0.5, 50.0));
    assert_eq!(rules.extent(None, &[], true), (1.0, 10.0));
}

#[test]
fn test_linear_scale_maps_and_inverts() {
    let scale = ChartScale::new(ScaleKind::Linear, (0.0, 10.0), (0.0, 100.0));
    assert!((scale.map(5.0) - 50.0).abs() < 1e-4);
    assert!((scale.invert(25.0) - 2.5).abs() < 1e-6);
    assert!(scale.try_map(f64::NAN).is_none());

    let flat = ChartScale::new(ScaleKind::Linear, (3.0, 3.0), (0.0, 100.0));
    assert!(flat.map(3.0).is_finite());
    assert!(flat.domain().1 > flat.domain().0);
}

#[test]
fn test_log_scale_rejects_non_positive() {
    let scale = ChartScale::new(ScaleKind::Log, (1.0, 100.0), (0.0, 100.0));
    assert!((scale.map(10.0) - 50.0).abs() < 1e-3);
    assert!(scale.try_map(0.0).is_none());
    assert!(scale.try_map(-4.0).is_none());
    assert!((scale.invert(100.0) - 100.0).abs() < 1e-6);
    assert_eq!(scale.ticks(5), vec![1.0, 10.0, 100.0]);

    let broken = ChartScale::new(ScaleKind::Log, (-5.0, -1.0), (0.0, 100.0));
    let (lo, hi) = broken.domain();
    assert!(lo > 0.0 && hi > lo);
}

#[test]
fn test_tick_labels() {
    let numeric = ChartScale::new(ScaleKind::Linear, (0.0, 2000.0), (0.0, 100.0));
    assert_eq!(numeric.format_tick(1234.5, &AxisFormat::Numeric), "1230");
    assert_eq!(numeric.format_tick(0.001, &AxisFormat::Numeric), "1.0e-3");
    assert_eq!(numeric.format_tick(0.0, &AxisFormat::Numeric), "0");

    let time = ChartScale::new(
        ScaleKind::Linear,
        (year_timestamp(2005), year_timestamp(2195)),
        (0.0, 600.0),
    );
    let label = time.format_tick(year_timestamp(2055), &AxisFormat::Time(TimeUnit::Milliseconds));
    assert_eq!(label, "2055");
}
