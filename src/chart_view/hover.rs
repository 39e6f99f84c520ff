use crate::data_types::{RunColor, RunIndex, Series, Tooltip, TooltipLine};
use crate::utils::number_format::format_number;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// One run's value at a shared x position.
#[derive(Clone, Debug, PartialEq)]
pub struct NestedSample {
    pub run_index: RunIndex,
    pub run_name: String,
    pub color: RunColor,
    pub unit: String,
    pub y: Option<f64>,
}

/// Every run's sample that shares one x value.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodGroup {
    pub x: f64,
    pub samples: Vec<NestedSample>,
}

/// Groups the samples of all series by x, in ascending x order.
pub fn nest_by_period(series: &[Series]) -> Vec<PeriodGroup> {
    let mut flat: Vec<(f64, NestedSample)> = series
        .iter()
        .flat_map(|s| {
            s.samples.iter().filter(|p| p.x.is_finite()).map(move |p| {
                (
                    p.x,
                    NestedSample {
                        run_index: s.run_index,
                        run_name: s.run_name.clone(),
                        color: s.color,
                        unit: s.unit.clone(),
                        y: p.plotted_y(),
                    },
                )
            })
        })
        .collect();
    flat.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<PeriodGroup> = Vec::new();
    for (x, sample) in flat {
        match groups.last_mut() {
            Some(g) if g.x == x => g.samples.push(sample),
            _ => groups.push(PeriodGroup {
                x,
                samples: vec![sample],
            }),
        }
    }
    groups
}

/// Tooltip for one period: visible runs with a value, highest first.
pub fn period_tooltip(
    group: &PeriodGroup,
    hidden: &BTreeSet<RunIndex>,
    header: Option<String>,
    anchor: (f32, f32),
) -> Tooltip {
    let mut shown: Vec<(&NestedSample, f64)> = group
        .samples
        .iter()
        .filter(|s| !hidden.contains(&s.run_index))
        .filter_map(|s| s.y.map(|y| (s, y)))
        .collect();
    shown.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.run_index.cmp(&b.0.run_index))
    });

    Tooltip {
        header,
        lines: shown
            .into_iter()
            .map(|(s, y)| TooltipLine {
                run_index: s.run_index,
                color: s.color,
                label: s.run_name.clone(),
                value: format_number(y),
                unit: s.unit.clone(),
            })
            .collect(),
        anchor,
    }
}

/// Tooltip for one data point in custom mode: the run name, the x value and
/// every y axis value of that run at the same sample position.
pub fn point_tooltip(
    run: &Series,
    sample: usize,
    twin: Option<&Series>,
    anchor: (f32, f32),
) -> Option<Tooltip> {
    let point = run.samples.get(sample)?;
    let line = |label: &str, value: Option<f64>, unit: &str| TooltipLine {
        run_index: run.run_index,
        color: run.color,
        label: label.to_string(),
        value: value.map(format_number).unwrap_or_else(|| "n/a".to_string()),
        unit: unit.to_string(),
    };

    let mut lines = vec![
        line(&run.x_title, Some(point.x).filter(|x| x.is_finite()), ""),
        line(&run.y_title, point.plotted_y(), &run.unit),
    ];
    if let Some(t) = twin {
        lines.push(line(&t.y_title, t.samples.get(sample).and_then(|p| p.plotted_y()), &t.unit));
    }
    Some(Tooltip {
        header: Some(run.run_name.clone()),
        lines,
        anchor,
    })
}
