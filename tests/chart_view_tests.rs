use webdice_chart::chart_view::{dash_pieces, ChartView, NodeKey};
use webdice_chart::data_types::{AxisFormat, ChartFlags, Padding, RunIndex, Sample, ScaleKind, Series};
use webdice_chart::palette::DEFAULT_PALETTE;
use webdice_chart::theme::TWIN_DASH;

fn series(run: usize, ys: &[Option<f64>]) -> Series {
    let samples = ys
        .iter()
        .enumerate()
        .map(|(i, y)| Sample::new(i as f64, *y))
        .collect();
    let mut s = Series::new("temperature", RunIndex(run), samples);
    s.color = DEFAULT_PALETTE[run % DEFAULT_PALETTE.len()];
    s
}

fn chart(hoverable: bool) -> ChartView {
    let mut c = ChartView::new("temperature").with_flags(ChartFlags {
        hoverable,
        ..Default::default()
    });
    c.configure(
        300.0,
        200.0,
        Padding::new(10.0, 10.0, 10.0, 10.0),
        ScaleKind::Linear,
        ScaleKind::Linear,
        AxisFormat::Numeric,
        AxisFormat::Numeric,
    );
    c
}

fn line_id(c: &ChartView, run: usize) -> Option<u64> {
    c.scene().line(NodeKey::line(RunIndex(run), false)).map(|l| l.id)
}

#[test]
fn test_null_values_break_the_line() {
    let mut c = chart(false);
    c.set_data(vec![series(0, &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)])]);
    c.set_domain((0.0, 4.0), (0.0, 6.0));
    c.draw();

    let line = c.scene().line(NodeKey::line(RunIndex(0), false)).expect("line node");
    assert_eq!(line.pieces.len(), 2);
    assert_eq!(line.point_count(), 4);
    assert_eq!(line.path_data().matches('M').count(), 2);
}

#[test]
fn test_all_missing_series_draws_nothing() {
    let mut c = chart(true);
    c.set_data(vec![series(0, &[None, None, None])]);
    c.set_domain((0.0, 2.0), (0.0, 1.0));
    c.draw();
    c.update_data();

    let line = c.scene().line(NodeKey::line(RunIndex(0), false)).expect("line node");
    assert!(line.pieces.is_empty());
    assert_eq!(line.path_data(), "");
}

#[test]
fn test_draw_runs_once() {
    let mut c = chart(false);
    c.set_data(vec![series(0, &[Some(1.0), Some(2.0)])]);
    c.draw();
    c.draw();
    let lc = c.lifecycle();
    assert_eq!(lc.draws, 1);
    assert_eq!(lc.updates, 1);
    assert!(c.is_drawn());
}

#[test]
fn test_redraw_before_draw_is_ignored() {
    let mut c = chart(false);
    c.set_size(500.0, 300.0);
    c.redraw();
    assert_eq!(c.lifecycle().redraws, 0);
    assert!(!c.is_drawn());
}

#[test]
fn test_update_data_keeps_surviving_nodes() {
    let mut c = chart(false);
    c.set_data(vec![series(0, &[Some(1.0); 3]), series(1, &[Some(2.0); 3])]);
    c.set_domain((0.0, 2.0), (0.0, 3.0));
    c.draw();
    let run0 = line_id(&c, 0);
    let run1 = line_id(&c, 1);
    assert!(run0.is_some() && run1.is_some());

    c.set_data(vec![series(0, &[Some(1.0); 3]), series(2, &[Some(2.5); 3])]);
    c.update_data();

    assert_eq!(line_id(&c, 0), run0);
    assert_eq!(line_id(&c, 1), None);
    let run2 = line_id(&c, 2).expect("node for the new run");
    assert_ne!(Some(run2), run1);
    assert_eq!(c.scene().lines.len(), 2);
}

#[test]
fn test_redraw_repositions_in_place() {
    let mut c = chart(false);
    c.set_data(vec![series(0, &[Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)])]);
    c.set_domain((0.0, 4.0), (0.0, 4.0));
    c.draw();
    let ids = c.scene().node_ids();

    c.set_size(600.0, 200.0);
    c.redraw();

    assert_eq!(c.scene().node_ids(), ids);
    assert_eq!(c.lifecycle().redraws, 1);
    let line = c.scene().line(NodeKey::line(RunIndex(0), false)).expect("line node");
    let last = line.pieces[0].last().copied().expect("points");
    assert!((last.0 - 580.0).abs() < 1e-3);
    assert!((c.scene().plot_width - 580.0).abs() < 1e-3);
}

#[test]
fn test_period_tooltip_sorted_descending() {
    let mut c = chart(true);
    c.set_data(vec![
        series(0, &[Some(1.0), Some(1.0), Some(1.0)]),
        series(1, &[Some(3.0), Some(3.0), Some(3.0)]),
        series(2, &[Some(2.0), None, Some(2.0)]),
    ]);
    c.set_domain((0.0, 2.0), (0.0, 4.0));
    c.draw();
    assert_eq!(c.hover_segments().len(), 3);

    let tip = c.pointer_enter(1).cloned().expect("tooltip");
    let labels: Vec<&str> = tip.lines.iter().map(|l| l.label.as_str()).collect();
    // run 2 has no value in this period
    assert_eq!(labels, vec!["Run #1", "Run #0"]);
    assert_eq!(tip.header.as_deref(), Some("1.00"));

    let tip = c.pointer_enter(0).cloned().expect("tooltip");
    let runs: Vec<RunIndex> = tip.lines.iter().map(|l| l.run_index).collect();
    assert_eq!(runs, vec![RunIndex(1), RunIndex(2), RunIndex(0)]);
}

#[test]
fn test_equal_values_keep_run_order() {
    let mut c = chart(true);
    c.set_data(vec![series(3, &[Some(5.0)]), series(0, &[Some(5.0)])]);
    c.set_domain((0.0, 1.0), (0.0, 10.0));
    c.draw();
    let tip = c.pointer_enter(0).cloned().expect("tooltip");
    let runs: Vec<RunIndex> = tip.lines.iter().map(|l| l.run_index).collect();
    assert_eq!(runs, vec![RunIndex(0), RunIndex(3)]);
}

#[test]
fn test_hidden_run_leaves_tooltip_but_not_data() {
    let mut c = chart(true);
    c.set_data(vec![series(0, &[Some(1.0); 2]), series(1, &[Some(3.0); 2])]);
    c.set_domain((0.0, 1.0), (0.0, 4.0));
    c.draw();
    c.pointer_enter(0);

    c.hide_run(RunIndex(1));
    let tip = c.tooltip().expect("tooltip survives");
    assert_eq!(tip.lines.len(), 1);
    assert_eq!(tip.lines[0].run_index, RunIndex(0));

    assert_eq!(c.series().len(), 2);
    let hidden_line = c.scene().line(NodeKey::line(RunIndex(1), false)).expect("node kept");
    assert!(!hidden_line.visible);
    assert!(c.scene().legend.iter().any(|e| e.run_index == RunIndex(1) && e.hidden));

    c.show_run(RunIndex(1));
    assert_eq!(c.tooltip().map(|t| t.lines.len()), Some(2));
}

#[test]
fn test_hover_can_be_detached() {
    let mut c = chart(true);
    c.set_data(vec![series(0, &[Some(1.0); 3])]);
    c.set_domain((0.0, 2.0), (0.0, 2.0));
    c.draw();
    assert!(c.hover_at((1.0, 50.0)).is_some());

    c.toggle_hover(false);
    assert!(c.tooltip().is_none());
    assert!(c.pointer_enter(1).is_none());
    assert!(c.hover_at((140.0, 50.0)).is_none());
    // the scene is untouched
    assert_eq!(c.scene().lines.len(), 1);

    c.toggle_hover(true);
    assert!(c.hover_at((140.0, 50.0)).is_some());
    c.pointer_leave();
    assert!(c.tooltip().is_none());
}

#[test]
fn test_non_hoverable_chart_has_no_segments() {
    let mut c = chart(false);
    c.set_data(vec![series(0, &[Some(1.0); 3])]);
    c.draw();
    assert!(c.hover_segments().is_empty());
    assert!(c.pointer_enter(0).is_none());
}

#[test]
fn test_twin_data_requires_twin_axis() {
    let mut c = chart(false);
    c.set_data(vec![series(0, &[Some(1.0); 3])]);
    c.set_twin_data(vec![series(0, &[Some(9.0); 3])]);
    assert!(c.twin_series().is_empty());

    c.set_twin_enabled(true);
    c.set_twin_data(vec![series(0, &[Some(9.0); 3])]);
    c.set_twin_domain((0.0, 10.0));
    c.draw();
    assert!(c.scene().line(NodeKey::line(RunIndex(0), true)).is_some());
    assert!(!c.scene().twin_ticks.is_empty());

    c.set_twin_enabled(false);
    assert!(c.twin_series().is_empty());
    assert!(c.scene().line(NodeKey::line(RunIndex(0), true)).is_none());
    assert!(c.scene().line(NodeKey::line(RunIndex(0), false)).is_some());
    assert!(c.scene().twin_ticks.is_empty());
}

#[test]
fn test_dash_pattern_splits_lines() {
    let dashes = dash_pieces(&[vec![(0.0, 0.0), (100.0, 0.0)]], TWIN_DASH);
    assert_eq!(dashes.len(), 3);
    assert!((dashes[0][1].0 - 40.0).abs() < 1e-3);
    assert!((dashes[1][0].0 - 48.0).abs() < 1e-3);
    assert!((dashes[2][1].0 - 100.0).abs() < 1e-3);
}
