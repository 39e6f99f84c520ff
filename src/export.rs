//! Download formats: CSV text of the visible runs and standalone SVG markup
//! of one chart.

use crate::chart_view::ChartView;
use crate::data_types::{Metadata, TimeUnit};
use crate::series_store::SeriesStore;
use crate::theme::ChartTheme;
use crate::utils::date_formatter::year_of;
use crate::utils::number_format::format_cell;
use eyre::{Result, WrapErr};
use std::fmt::Write as _;
use std::path::Path;

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One header row naming each run/variable column, then one row per period.
/// Hidden runs are left out.
pub fn csv(store: &SeriesStore, metadata: &Metadata, variables: &[String]) -> String {
    let variables: Vec<String> = if variables.is_empty() {
        store.variables().map(str::to_string).collect()
    } else {
        variables.to_vec()
    };
    let columns: Vec<_> = variables
        .iter()
        .flat_map(|v| store.series(v).iter().filter(|s| s.visible))
        .collect();

    let mut out = String::new();
    let header: Vec<String> = std::iter::once("Year".to_string())
        .chain(columns.iter().map(|s| {
            let unit = metadata.unit(&s.variable);
            let label = if unit.is_empty() {
                format!("{}: {}", s.run_name, s.y_title)
            } else {
                format!("{}: {} ({})", s.run_name, s.y_title, unit)
            };
            csv_field(&label)
        }))
        .collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for (i, t) in store.time_grid().iter().enumerate() {
        let year = year_of(*t, TimeUnit::Milliseconds)
            .map(|y| y.to_string())
            .unwrap_or_default();
        let row: Vec<String> = std::iter::once(year)
            .chain(columns.iter().map(|s| format_cell(s.y_at(i))))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, contents).wrap_err_with(|| format!("writing CSV export to {}", path.display()))
}

pub fn write_svg(path: impl AsRef<Path>, view: &ChartView, theme: &ChartTheme) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, svg(view, theme)).wrap_err_with(|| format!("writing SVG export to {}", path.display()))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// SVG markup of `view`'s current scene with the theme stylesheet inlined.
pub fn svg(view: &ChartView, theme: &ChartTheme) -> String {
    let scene = view.scene();
    let padding = view.padding();
    let id = escape(view.id());
    let (w, h) = (scene.plot_width, scene.plot_height);
    let mut s = String::new();

    let _ = writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{}" height="{}" id="{}_graph_svg">"#,
        scene.width, scene.height, id
    );
    let _ = writeln!(
        s,
        "<defs><style type=\"text/css\"><![CDATA[\n{}]]></style>\
         <clipPath id=\"{id}_graph_clip\"><rect width=\"{w}\" height=\"{h}\"/></clipPath></defs>",
        theme.stylesheet()
    );
    let _ = writeln!(
        s,
        r#"<text class="title" x="{}" y="14">{}</text>"#,
        padding.left,
        escape(&scene.title)
    );
    if !scene.subtitle.is_empty() {
        let _ = writeln!(
            s,
            r#"<text class="subtitle" x="{}" y="30">{}</text>"#,
            padding.left,
            escape(&scene.subtitle)
        );
    }
    let _ = writeln!(s, r#"<g transform="translate({},{})">"#, padding.left, padding.top);

    if scene.h_grid {
        s.push_str("<g class=\"grid\">");
        for t in &scene.y_ticks {
            let _ = write!(s, r#"<line x1="0" x2="{w}" y1="{0:.2}" y2="{0:.2}"/>"#, t.pos);
        }
        s.push_str("</g>\n");
    }

    let _ = write!(s, r#"<g class="axis x" transform="translate(0,{h})"><path d="M0,0H{w}"/>"#);
    for t in &scene.x_ticks {
        let _ = write!(
            s,
            r#"<g transform="translate({:.2},0)"><line y2="4"/><text y="16" text-anchor="middle">{}</text></g>"#,
            t.pos,
            escape(&t.label)
        );
    }
    s.push_str("</g>\n");
    let _ = write!(s, r#"<g class="axis y"><path d="M0,0V{h}"/>"#);
    for t in &scene.y_ticks {
        let _ = write!(
            s,
            r#"<g transform="translate(0,{:.2})"><line x2="-4"/><text x="-6" dy="0.32em" text-anchor="end">{}</text></g>"#,
            t.pos,
            escape(&t.label)
        );
    }
    s.push_str("</g>\n");
    if !scene.twin_ticks.is_empty() {
        let _ = write!(s, r#"<g class="axis y2" transform="translate({w},0)"><path d="M0,0V{h}"/>"#);
        for t in &scene.twin_ticks {
            let _ = write!(
                s,
                r#"<g transform="translate(0,{:.2})"><line x2="4"/><text x="6" dy="0.32em">{}</text></g>"#,
                t.pos,
                escape(&t.label)
            );
        }
        s.push_str("</g>\n");
    }

    let _ = writeln!(s, r#"<g clip-path="url(#{id}_graph_clip)">"#);
    for line in scene.visible_lines().filter(|l| !l.pieces.is_empty()) {
        let class = if line.twin() { "line twin" } else { "line" };
        let _ = writeln!(
            s,
            r#"<path class="{} run-{}" stroke="{}" d="{}"/>"#,
            class,
            line.key.run_index,
            line.color.to_hex(),
            line.path_data()
        );
    }
    for p in scene.points.iter().filter(|p| p.visible) {
        let _ = writeln!(
            s,
            r#"<circle class="point run-{}" fill="{}" cx="{:.2}" cy="{:.2}" r="{}"/>"#,
            p.key.run_index,
            p.color.to_hex(),
            p.pos.0,
            p.pos.1,
            theme.point_radius
        );
    }
    s.push_str("</g>\n");

    if !scene.legend.is_empty() {
        s.push_str("<g class=\"legend\">");
        for (i, e) in scene.legend.iter().enumerate() {
            let class = if e.hidden { " class=\"hidden\"" } else { "" };
            let _ = write!(
                s,
                r#"<g{} transform="translate({},-10)"><rect width="8" height="8" y="-8" fill="{}"/><text x="12">{}</text></g>"#,
                class,
                i * 90,
                e.color.to_hex(),
                escape(&e.run_name)
            );
        }
        s.push_str("</g>\n");
    }
    s.push_str("</g>\n</svg>\n");
    s
}
