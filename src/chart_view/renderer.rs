//! Paints a [`ChartScene`] with gpui primitives.

use super::scene::{dash_pieces, ChartScene};
use super::ChartView;
use crate::data_types::{Padding, Tooltip};
use crate::theme::{ChartTheme, TWIN_DASH};
use crate::utils::PixelsExt;
use gpui::prelude::*;
use gpui::*;

const LABEL_GAP: f32 = 4.0;
const SWATCH: f32 = 8.0;

/// A canvas element drawing `view`'s current scene. `on_bounds` receives the
/// laid-out bounds on every paint so the owner can detect size changes.
pub fn chart_element(
    view: &ChartView,
    theme: &ChartTheme,
    on_bounds: impl Fn(Bounds<Pixels>, &mut Window, &mut App) + 'static,
) -> impl IntoElement {
    let scene = view.scene().clone();
    let tooltip = view.tooltip().cloned();
    let padding = view.padding();
    let custom = view.flags().custom;
    let theme = theme.clone();

    canvas(
        |_, _, _| {},
        move |bounds, (), window, cx| {
            on_bounds(bounds, window, cx);
            paint_scene(&scene, padding, &theme, bounds, window, cx);
            if let Some(t) = &tooltip {
                paint_tooltip(t, padding, custom, &scene, &theme, bounds, window, cx);
            }
        },
    )
    .size_full()
}

fn stroke(
    window: &mut Window,
    origin: Point<Pixels>,
    points: &[(f32, f32)],
    width: f32,
    color: Hsla,
) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let mut builder = PathBuilder::stroke(px(width));
    builder.move_to(origin + point(px(first.0), px(first.1)));
    for p in rest {
        builder.line_to(origin + point(px(p.0), px(p.1)));
    }
    if let Ok(path) = builder.build() {
        window.paint_path(path, color);
    }
}

fn paint_text(
    text: &str,
    origin: Point<Pixels>,
    font_size: Pixels,
    color: Hsla,
    anchor_end: bool,
    window: &mut Window,
    cx: &mut App,
) {
    if text.is_empty() {
        return;
    }
    let run = TextRun {
        len: text.len(),
        font: TextStyle::default().font(),
        color,
        background_color: None,
        underline: None,
        strikethrough: None,
    };
    if let Ok(lines) =
        window
            .text_system()
            .shape_text(text.to_string().into(), font_size, &[run], None, None)
    {
        for line in lines {
            let at = if anchor_end {
                origin - point(line.width(), px(0.0))
            } else {
                origin
            };
            let _ = line.paint(at, font_size, TextAlign::Left, None, window, cx);
        }
    }
}

fn paint_scene(
    scene: &ChartScene,
    padding: Padding,
    theme: &ChartTheme,
    bounds: Bounds<Pixels>,
    window: &mut Window,
    cx: &mut App,
) {
    window.paint_quad(fill(bounds, theme.background));

    let origin = bounds.origin + point(px(padding.left), px(padding.top));
    let (w, h) = (scene.plot_width, scene.plot_height);
    let plot = Bounds::new(origin, size(px(w), px(h)));
    let label = theme.axis_label_size;

    if scene.h_grid {
        for t in &scene.y_ticks {
            stroke(window, origin, &[(0.0, t.pos), (w, t.pos)], 1.0, theme.grid_line);
        }
    }

    // axes
    stroke(window, origin, &[(0.0, 0.0), (0.0, h), (w, h)], 1.0, theme.axis_line);
    if !scene.twin_ticks.is_empty() {
        stroke(window, origin, &[(w, 0.0), (w, h)], 1.0, theme.axis_line);
    }
    for t in &scene.x_ticks {
        stroke(window, origin, &[(t.pos, h), (t.pos, h + LABEL_GAP)], 1.0, theme.axis_line);
        let half = t.label.len() as f32 * label.as_f32() * 0.3;
        let at = origin + point(px(t.pos - half), px(h + LABEL_GAP));
        paint_text(&t.label, at, label, theme.axis_label, false, window, cx);
    }
    for t in &scene.y_ticks {
        let at = origin + point(px(-LABEL_GAP), px(t.pos - label.as_f32() / 2.0));
        paint_text(&t.label, at, label, theme.axis_label, true, window, cx);
    }
    for t in &scene.twin_ticks {
        let at = origin + point(px(w + LABEL_GAP), px(t.pos - label.as_f32() / 2.0));
        paint_text(&t.label, at, label, theme.axis_label, false, window, cx);
    }

    window.with_content_mask(Some(ContentMask { bounds: plot }), |window| {
        for line in scene.visible_lines() {
            let color = line.color.to_hsla();
            if line.twin() {
                for dash in dash_pieces(&line.pieces, TWIN_DASH) {
                    stroke(window, origin, &dash, theme.twin_line_width, color);
                }
            } else {
                for piece in &line.pieces {
                    stroke(window, origin, piece, theme.line_width, color);
                }
            }
        }
        let r = theme.point_radius;
        for p in scene.points.iter().filter(|p| p.visible) {
            let rect = Bounds::new(
                origin + point(px(p.pos.0 - r), px(p.pos.1 - r)),
                size(px(2.0 * r), px(2.0 * r)),
            );
            window.paint_quad(fill(rect, p.color.to_hsla()).corner_radii(px(r)));
        }
    });

    let title_at = bounds.origin + point(px(padding.left), px(2.0));
    paint_text(&scene.title, title_at, theme.title_size, theme.axis_label, false, window, cx);
    let sub_at = title_at + point(px(0.0), theme.title_size + px(3.0));
    paint_text(&scene.subtitle, sub_at, label, theme.axis_label.alpha(0.6), false, window, cx);
    if !scene.twin_title.is_empty() {
        let at = bounds.origin + point(bounds.size.width - px(2.0), theme.title_size + px(5.0));
        paint_text(&scene.twin_title, at, label, theme.axis_label.alpha(0.6), true, window, cx);
    }

    // legend, right-aligned above the plot
    let mut x = bounds.size.width.as_f32() - padding.right;
    let y = padding.top - SWATCH - LABEL_GAP;
    for entry in scene.legend.iter().rev() {
        let alpha = if entry.hidden { theme.hidden_legend_alpha } else { 1.0 };
        let text_w = entry.run_name.len() as f32 * label.as_f32() * 0.6;
        x -= text_w;
        let text_at = bounds.origin + point(px(x), px(y - label.as_f32() / 4.0));
        paint_text(&entry.run_name, text_at, label, theme.axis_label.alpha(alpha), false, window, cx);
        x -= SWATCH + LABEL_GAP;
        let swatch = Bounds::new(bounds.origin + point(px(x), px(y)), size(px(SWATCH), px(SWATCH)));
        window.paint_quad(fill(swatch, entry.color.to_hsla().alpha(alpha)));
        x -= 2.0 * LABEL_GAP;
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_tooltip(
    tooltip: &Tooltip,
    padding: Padding,
    custom: bool,
    scene: &ChartScene,
    theme: &ChartTheme,
    bounds: Bounds<Pixels>,
    window: &mut Window,
    cx: &mut App,
) {
    let origin = bounds.origin + point(px(padding.left), px(padding.top));
    let (ax, ay) = tooltip.anchor;
    if !custom {
        stroke(window, origin, &[(ax, 0.0), (ax, scene.plot_height)], 1.0, theme.hover_line);
    }

    let label = theme.axis_label_size.as_f32();
    let row = label + 3.0;
    let text = tooltip.text();
    let rows: Vec<&str> = text.lines().collect();
    let widest = rows.iter().map(|r| r.len()).max().unwrap_or(0) as f32 * label * 0.6;
    let box_w = widest + 2.0 * LABEL_GAP + SWATCH;
    let box_h = rows.len() as f32 * row + 2.0 * LABEL_GAP;

    // flip to the left half when the box would overflow the plot
    let left = if ax + 10.0 + box_w > scene.plot_width {
        ax - 10.0 - box_w
    } else {
        ax + 10.0
    };
    let top = ay.clamp(0.0, (scene.plot_height - box_h).max(0.0));
    let at = origin + point(px(left), px(top));
    window.paint_quad(
        fill(Bounds::new(at, size(px(box_w), px(box_h))), theme.tooltip_background)
            .border_widths(px(1.0))
            .border_color(theme.axis_line),
    );

    let header_rows = usize::from(tooltip.header.is_some());
    for (i, r) in rows.iter().enumerate() {
        let y = LABEL_GAP + i as f32 * row;
        let mut x = LABEL_GAP;
        if let Some(line) = i.checked_sub(header_rows).and_then(|l| tooltip.lines.get(l)) {
            let swatch = Bounds::new(
                at + point(px(x), px(y + (row - SWATCH) / 2.0)),
                size(px(SWATCH - 2.0), px(SWATCH - 2.0)),
            );
            window.paint_quad(fill(swatch, line.color.to_hsla()));
            x += SWATCH;
        }
        paint_text(r, at + point(px(x), px(y)), theme.axis_label_size, theme.tooltip_text, false, window, cx);
    }
}
