use rand::Rng;
use std::collections::HashSet;
use webdice_chart::data_types::{Axis, Metadata, RunIndex};
use webdice_chart::palette::{ColorAllocator, DEFAULT_PALETTE};
use webdice_chart::payload::RunData;
use webdice_chart::series_store::{year_grid, RunInfo, SeriesStore};

const VARIABLES: [&str; 3] = ["emissionsTotal", "temperature", "consumption_pc"];

fn store(periods: usize) -> SeriesStore {
    SeriesStore::new(year_grid(2005, 10, periods))
}

fn run_data(vars: &[&str], periods: usize, seed: f64) -> RunData {
    vars.iter().fold(RunData::new(), |d, v| {
        d.with_variable(*v, (0..periods).map(|i| seed + i as f64).collect())
    })
}

fn assert_one_series_per_run(store: &SeriesStore) {
    for v in store.variables() {
        assert_eq!(
            store.series(v).len(),
            store.run_count(),
            "variable {v} out of step with the run list"
        );
    }
}

#[test]
fn test_add_run_appends_one_series_per_variable() {
    let mut store = store(5);
    let md = Metadata::default();
    let colors = DEFAULT_PALETTE;
    store.add_run(&run_data(&VARIABLES, 5, 1.0), RunInfo::new(RunIndex(0), colors[0]), &md);

    for v in VARIABLES {
        let series = store.series(v);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].run_index, RunIndex(0));
        assert_eq!(series[0].run_name, "Run #0");
        assert_eq!(series[0].samples.len(), 5);
        assert_eq!(series[0].samples[0].x, store.time_grid()[0]);
    }
}

#[test]
fn test_short_and_invalid_values_become_missing() {
    let mut store = store(5);
    let mut data = RunData::new();
    data.insert("temperature", vec![Some(1.0), Some(f64::NAN), Some(3.0)]);
    store.add_run(&data, RunInfo::new(RunIndex(0), DEFAULT_PALETTE[0]), &Metadata::default());

    let s = &store.series("temperature")[0];
    let ys: Vec<Option<f64>> = s.samples.iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![Some(1.0), None, Some(3.0), None, None]);
}

#[test]
fn test_late_variables_are_backfilled() {
    let mut store = store(3);
    let md = Metadata::default();
    store.add_run(&run_data(&["temperature"], 3, 0.0), RunInfo::new(RunIndex(0), DEFAULT_PALETTE[0]), &md);
    store.add_run(
        &run_data(&["temperature", "backstop"], 3, 0.0),
        RunInfo::new(RunIndex(1), DEFAULT_PALETTE[1]),
        &md,
    );

    let backstop = store.series("backstop");
    assert_eq!(backstop.len(), 2);
    assert_eq!(backstop[0].run_index, RunIndex(0));
    assert!(backstop[0].samples.iter().all(|p| p.y.is_none()));
    assert_one_series_per_run(&store);
}

#[test]
fn test_append_remove_symmetry() {
    let mut rng = rand::rng();
    let md = Metadata::default();
    let mut store = store(4);
    let mut next = 0usize;

    for _ in 0..60 {
        let before: Vec<(String, usize)> = store
            .variables()
            .map(|v| (v.to_string(), store.series(v).len()))
            .collect();

        let count = rng.random_range(1..=VARIABLES.len());
        let vars = &VARIABLES[..count];
        let run = RunIndex(next);
        next += 1;
        store.add_run(&run_data(vars, 4, next as f64), RunInfo::new(run, DEFAULT_PALETTE[0]), &md);
        assert_one_series_per_run(&store);

        if rng.random_bool(0.5) {
            assert!(store.remove_run(run));
            for (v, n) in &before {
                assert_eq!(store.series(v).len(), *n);
            }
            assert_one_series_per_run(&store);
        }
    }
}

#[test]
fn test_remove_filters_by_identity() {
    let md = Metadata::default();
    let mut store = store(3);
    for i in 0..3 {
        store.add_run(&run_data(&VARIABLES, 3, i as f64), RunInfo::new(RunIndex(i), DEFAULT_PALETTE[i]), &md);
    }

    assert!(store.remove_run(RunIndex(1)));
    assert!(!store.remove_run(RunIndex(1)));
    assert!(!store.remove_run(RunIndex(42)));

    for v in VARIABLES {
        let runs: Vec<RunIndex> = store.series(v).iter().map(|s| s.run_index).collect();
        assert_eq!(runs, vec![RunIndex(0), RunIndex(2)]);
    }
    assert_eq!(store.series_for_run("temperature", RunIndex(2)).map(|s| s.samples[0].y), Some(Some(2.0)));
}

#[test]
fn test_rename_and_hide_keep_indices() {
    let md = Metadata::default();
    let mut store = store(3);
    for i in 0..2 {
        store.add_run(&run_data(&VARIABLES, 3, 0.0), RunInfo::new(RunIndex(i), DEFAULT_PALETTE[i]), &md);
    }

    assert!(store.rename_run(RunIndex(1), "High damages"));
    assert!(store.set_visibility(RunIndex(0), false));
    assert!(!store.rename_run(RunIndex(9), "nope"));

    assert_eq!(store.run_indices(), vec![RunIndex(0), RunIndex(1)]);
    assert_eq!(store.visible_run_count(), 1);
    assert!(!store.is_visible(RunIndex(0)));
    for v in VARIABLES {
        let s = store.series(v);
        assert_eq!(s[0].run_index, RunIndex(0));
        assert!(!s[0].visible);
        assert_eq!(s[1].run_index, RunIndex(1));
        assert_eq!(s[1].run_name, "High damages");
    }
    // hidden runs stay in the store
    assert_eq!(store.flatten("temperature", Axis::Y).len(), 6);
    assert_eq!(store.flatten_visible("temperature", Axis::Y).len(), 3);
}

#[test]
fn test_colors_are_distinct_and_stable() {
    let mut colors = ColorAllocator::default();
    let a = colors.allocate(RunIndex(0));
    let b = colors.allocate(RunIndex(1));
    assert_ne!(a, b);
    assert_eq!(colors.allocate(RunIndex(0)), a);
    assert_eq!(colors.color_of(RunIndex(1)), Some(b));
}

#[test]
fn test_released_color_is_reused() {
    let mut colors = ColorAllocator::default();
    let all: Vec<_> = (0..DEFAULT_PALETTE.len()).map(|i| colors.allocate(RunIndex(i))).collect();
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(unique.len(), DEFAULT_PALETTE.len());

    colors.release(RunIndex(3));
    assert_eq!(colors.in_use(), DEFAULT_PALETTE.len() - 1);
    // run 8 would prefer slot 0, which is taken; the freed slot is used
    assert_eq!(colors.allocate(RunIndex(8)), DEFAULT_PALETTE[3]);

    colors.clear();
    assert_eq!(colors.in_use(), 0);
    assert_eq!(colors.color_of(RunIndex(8)), None);
}
