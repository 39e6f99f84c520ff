//! Retained drawing model of one chart.
//!
//! Nodes carry stable ids so incremental updates can move existing geometry
//! instead of rebuilding it. Coordinates are plot-area local: `(0, 0)` is the
//! top-left corner of the clipped drawing region.

use crate::data_types::{LegendEntry, RunColor, RunIndex};
use std::fmt::Write as _;

pub type NodeId = u64;

/// Identity of a rendered element across updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub run_index: RunIndex,
    pub twin: bool,
    /// Sample position for point nodes, `None` for lines.
    pub sample: Option<usize>,
}

impl NodeKey {
    pub fn line(run_index: RunIndex, twin: bool) -> Self {
        Self {
            run_index,
            twin,
            sample: None,
        }
    }

    pub fn point(run_index: RunIndex, twin: bool, sample: usize) -> Self {
        Self {
            run_index,
            twin,
            sample: Some(sample),
        }
    }
}

/// One run's polyline. A line is split into several pieces wherever a value
/// is missing.
#[derive(Clone, Debug, PartialEq)]
pub struct LineNode {
    pub id: NodeId,
    pub key: NodeKey,
    pub color: RunColor,
    pub visible: bool,
    pub pieces: Vec<Vec<(f32, f32)>>,
}

impl LineNode {
    pub fn twin(&self) -> bool {
        self.key.twin
    }

    /// SVG path data, one `M` command per continuous piece.
    pub fn path_data(&self) -> String {
        let mut d = String::new();
        for piece in &self.pieces {
            for (i, (x, y)) in piece.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{}{:.2},{:.2}", cmd, x, y);
            }
        }
        d
    }

    pub fn point_count(&self) -> usize {
        self.pieces.iter().map(Vec::len).sum()
    }
}

/// A hoverable data point, used in custom mode.
#[derive(Clone, Debug, PartialEq)]
pub struct PointNode {
    pub id: NodeId,
    pub key: NodeKey,
    pub color: RunColor,
    pub visible: bool,
    pub data: (f64, f64),
    pub pos: (f32, f32),
}

/// Invisible vertical band covering one reporting period.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverSegment {
    pub id: NodeId,
    pub period: usize,
    pub x_value: f64,
    pub center: f32,
    pub left: f32,
    pub width: f32,
}

impl HoverSegment {
    pub fn contains(&self, px_x: f32) -> bool {
        px_x >= self.left && px_x < self.left + self.width
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickMark {
    pub pos: f32,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartScene {
    pub width: f32,
    pub height: f32,
    pub plot_width: f32,
    pub plot_height: f32,
    pub title: String,
    pub subtitle: String,
    pub twin_title: String,
    pub lines: Vec<LineNode>,
    pub points: Vec<PointNode>,
    pub segments: Vec<HoverSegment>,
    pub x_ticks: Vec<TickMark>,
    pub y_ticks: Vec<TickMark>,
    pub twin_ticks: Vec<TickMark>,
    pub legend: Vec<LegendEntry>,
    pub h_grid: bool,
    next_id: NodeId,
}

impl ChartScene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn line(&self, key: NodeKey) -> Option<&LineNode> {
        self.lines.iter().find(|l| l.key == key)
    }

    pub fn visible_lines(&self) -> impl Iterator<Item = &LineNode> {
        self.lines.iter().filter(|l| l.visible)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.lines
            .iter()
            .map(|l| l.id)
            .chain(self.points.iter().map(|p| p.id))
            .collect()
    }

    pub fn segment_at(&self, px_x: f32) -> Option<&HoverSegment> {
        self.segments.iter().find(|s| s.contains(px_x))
    }

    /// Nearest visible point within `radius` pixels.
    pub fn point_at(&self, pos: (f32, f32), radius: f32) -> Option<&PointNode> {
        self.points
            .iter()
            .filter(|p| p.visible)
            .map(|p| {
                let dx = p.pos.0 - pos.0;
                let dy = p.pos.1 - pos.1;
                (p, dx * dx + dy * dy)
            })
            .filter(|(_, d2)| *d2 <= radius * radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }
}

/// Cuts polylines into dash pieces following an on/off `pattern`.
///
/// Used to stroke twin-axis lines, since the path builder has no native
/// dash support.
pub fn dash_pieces(pieces: &[Vec<(f32, f32)>], pattern: [f32; 2]) -> Vec<Vec<(f32, f32)>> {
    let [on, off] = pattern;
    if on <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for piece in pieces {
        let mut drawing = true;
        let mut left = on;
        let mut current: Vec<(f32, f32)> = piece.first().copied().into_iter().collect();
        for pair in piece.windows(2) {
            let (mut ax, mut ay) = pair[0];
            let (bx, by) = pair[1];
            let mut seg_len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
            while seg_len > 0.0 {
                let step = left.min(seg_len);
                let t = step / seg_len;
                let (nx, ny) = (ax + (bx - ax) * t, ay + (by - ay) * t);
                if drawing {
                    current.push((nx, ny));
                }
                ax = nx;
                ay = ny;
                seg_len -= step;
                left -= step;
                if left <= 0.0 {
                    if drawing {
                        if current.len() > 1 {
                            out.push(std::mem::take(&mut current));
                        }
                        current.clear();
                        left = off.max(0.0);
                    } else {
                        current = vec![(ax, ay)];
                        left = on;
                    }
                    drawing = !drawing;
                    if left <= 0.0 {
                        // zero-length gap
                        drawing = true;
                        current = vec![(ax, ay)];
                        left = on;
                    }
                }
            }
        }
        if drawing && current.len() > 1 {
            out.push(current);
        }
    }
    out
}
