use std::collections::BTreeSet;
use webdice_chart::custom_chart::ExtentRules;
use webdice_chart::data_types::{Metadata, Padding, RunIndex, Sample, Series};
use webdice_chart::palette::DEFAULT_PALETTE;
use webdice_chart::payload::RunData;
use webdice_chart::series_store::{year_grid, RunInfo, SeriesStore};
use webdice_chart::zoom_overview::{boundary_value, interpolate, window_values, zoomed_extent, ZoomOverviewView};

fn series(run: usize, points: &[(f64, Option<f64>)]) -> Series {
    let samples = points.iter().map(|(x, y)| Sample::new(*x, *y)).collect();
    Series::new("damages", RunIndex(run), samples)
}

#[test]
fn test_interpolate_between_bracketing_samples() {
    assert_eq!(interpolate(0.0, 10.0, 10.0, 20.0, 5.0), 15.0);
    assert_eq!(interpolate(0.0, 10.0, 10.0, 20.0, 0.0), 10.0);
    // coincident samples
    assert_eq!(interpolate(3.0, 7.0, 3.0, 9.0, 3.0), 7.0);
}

#[test]
fn test_boundary_value_needs_defined_neighbours() {
    let s = series(0, &[(0.0, Some(10.0)), (10.0, Some(20.0)), (20.0, None), (30.0, Some(0.0))]);
    assert_eq!(boundary_value(&s, 5.0), Some(15.0));
    assert_eq!(boundary_value(&s, 15.0), None);
    // exact sample positions are not interpolated
    assert_eq!(boundary_value(&s, 10.0), None);
    assert_eq!(boundary_value(&s, 40.0), None);
}

#[test]
fn test_window_values_include_edges_and_skip_hidden() {
    let a = series(0, &[(0.0, Some(10.0)), (10.0, Some(20.0)), (20.0, Some(30.0))]);
    let b = series(1, &[(0.0, Some(100.0)), (10.0, Some(200.0)), (20.0, Some(300.0))]);
    let all = vec![a, b];

    let mut values = window_values(&all, &BTreeSet::new(), (5.0, 15.0));
    values.sort_by(f64::total_cmp);
    assert_eq!(values, vec![15.0, 20.0, 25.0, 150.0, 200.0, 250.0]);

    let hidden = BTreeSet::from([RunIndex(1)]);
    let mut values = window_values(&all, &hidden, (15.0, 5.0));
    values.sort_by(f64::total_cmp);
    assert_eq!(values, vec![15.0, 20.0, 25.0]);

    let rules = ExtentRules::default();
    let (lo, hi) = zoomed_extent(&all, &hidden, Some((5.0, 15.0)), &rules, "damages", false);
    assert!(lo <= 15.0 && hi >= 25.0 && hi < 100.0);
    let (_, full_hi) = zoomed_extent(&all, &BTreeSet::new(), None, &rules, "damages", false);
    assert!(full_hi >= 300.0);
}

fn overview() -> (ZoomOverviewView, SeriesStore) {
    let md = Metadata::default();
    let mut store = SeriesStore::new(year_grid(2005, 10, 20));
    let data = RunData::new().with_variable("damages", (0..20).map(|i| i as f64).collect());
    store.add_run(&data, RunInfo::new(RunIndex(0), DEFAULT_PALETTE[0]), &md);

    let mut zoom = ZoomOverviewView::new("zoom", "damages", Padding::new(2.0, 0.0, 2.0, 0.0), 34.0);
    zoom.refresh(&store, &md, &ExtentRules::default());
    (zoom, store)
}

#[test]
fn test_brush_selects_a_window() {
    let (mut zoom, store) = overview();
    let (d0, d1) = store.time_domain();

    zoom.brush_start(150.0);
    assert!(zoom.is_dragging());
    zoom.brush_move(450.0);
    let (x0, x1) = zoom.brush_end(450.0).expect("window");

    assert!(!zoom.is_dragging());
    assert!(d0 < x0 && x0 < x1 && x1 < d1);
    let quarter = d0 + (d1 - d0) * 0.25;
    assert!((x0 - quarter).abs() < (d1 - d0) * 1e-3);
}

#[test]
fn test_backwards_drag_is_normalized() {
    let (mut zoom, _) = overview();
    zoom.brush_start(450.0);
    let (x0, x1) = zoom.brush_end(150.0).expect("window");
    assert!(x0 < x1);
}

#[test]
fn test_empty_brush_means_full_domain() {
    let (mut zoom, _) = overview();
    zoom.brush_start(200.0);
    assert_eq!(zoom.brush_end(200.0), None);
    assert_eq!(zoom.selection_px(), None);
}

#[test]
fn test_brush_beyond_data_is_clamped() {
    let (mut zoom, store) = overview();
    let (d0, d1) = store.time_domain();
    zoom.brush_start(-80.0);
    let (x0, x1) = zoom.brush_end(10_000.0).expect("window");
    assert!((x0 - d0).abs() < 1.0);
    assert!((x1 - d1).abs() < 1.0);

    zoom.clear_brush();
    assert_eq!(zoom.selected_window(), None);
}
