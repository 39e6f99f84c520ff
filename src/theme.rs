use crate::utils::PixelsExt;
use gpui::*;

/// Stroke pattern of twin-axis lines, as dash/gap lengths in pixels.
pub const TWIN_DASH: [f32; 2] = [40.0, 8.0];

#[derive(Clone, Debug)]
pub struct ChartTheme {
    pub background: Hsla,
    pub grid_line: Hsla,
    pub axis_line: Hsla,
    pub axis_label: Hsla,
    pub axis_label_size: Pixels,
    pub title_size: Pixels,
    pub line_width: f32,
    pub twin_line_width: f32,
    pub point_radius: f32,
    pub hover_line: Hsla,
    pub tooltip_background: Hsla,
    pub tooltip_text: Hsla,
    pub brush_fill: Hsla,
    pub brush_border: Hsla,
    pub hidden_legend_alpha: f32,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: gpui::white(),
            grid_line: gpui::black().alpha(0.08),
            axis_line: gpui::black().alpha(0.6),
            axis_label: gpui::black().alpha(0.8),
            axis_label_size: px(11.0),
            title_size: px(13.0),
            line_width: 2.0,
            twin_line_width: 1.5,
            point_radius: 3.0,
            hover_line: gpui::black().alpha(0.25),
            tooltip_background: gpui::white().alpha(0.95),
            tooltip_text: gpui::black(),
            brush_fill: gpui::black().alpha(0.12),
            brush_border: gpui::black().alpha(0.4),
            hidden_legend_alpha: 0.35,
        }
    }
}

impl ChartTheme {
    /// CSS rules inlined into exported SVG so the file renders standalone.
    pub fn stylesheet(&self) -> String {
        format!(
            "svg {{ font-family: sans-serif; background: #ffffff; }}\n\
             .title {{ font-size: {title}px; font-weight: bold; }}\n\
             .subtitle {{ font-size: {label}px; fill: #555555; }}\n\
             .axis line, .axis path {{ stroke: #666666; fill: none; shape-rendering: crispEdges; }}\n\
             .axis text {{ font-size: {label}px; fill: #333333; }}\n\
             .grid line {{ stroke: #000000; stroke-opacity: 0.08; }}\n\
             .line {{ fill: none; stroke-width: {lw}px; }}\n\
             .line.twin {{ stroke-width: {tw}px; stroke-dasharray: {d0},{d1}; }}\n\
             .point {{ stroke: none; }}\n\
             .legend text {{ font-size: {label}px; }}\n\
             .legend .hidden {{ opacity: {hidden}; }}\n",
            title = self.title_size.as_f32(),
            label = self.axis_label_size.as_f32(),
            lw = self.line_width,
            tw = self.twin_line_width,
            d0 = TWIN_DASH[0],
            d1 = TWIN_DASH[1],
            hidden = self.hidden_legend_alpha,
        )
    }
}
