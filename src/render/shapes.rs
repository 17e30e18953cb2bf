//! Shape generation for the linkage and its tracer

use std::f32::consts::PI;

use glam::{DVec2, Vec2};

use super::vertex::{Vertex, colors};
use crate::sim::{FrameSnapshot, LinkState};

/// Stroke widths in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageStyle {
    pub link_width: f32,
    pub pivot_radius: f32,
    pub tracer_width: f32,
    pub pivot_segments: u32,
}

impl Default for LinkageStyle {
    fn default() -> Self {
        Self {
            link_width: 0.12,
            pivot_radius: 0.1,
            tracer_width: 0.03,
            pivot_segments: 16,
        }
    }
}

/// Generate vertices for a straight bar between two points
pub fn bar(from: Vec2, to: Vec2, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    let dir = (to - from).normalize_or_zero();
    let perp = dir.perp() * (width * 0.5);

    let a = from + perp;
    let b = from - perp;
    let c = to + perp;
    let d = to - perp;

    vec![
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(d.x, d.y, color),
    ]
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for the tracer path, fading from oldest to newest
pub fn tracer_path(path: &[DVec2], width: f32) -> Vec<Vertex> {
    if path.len() < 2 {
        return Vec::new();
    }

    let mut vertices = Vec::with_capacity((path.len() - 1) * 6);
    let len = path.len() as f32;
    for (i, pair) in path.windows(2).enumerate() {
        // Older samples are fainter
        let alpha = 0.15 + 0.85 * (i + 1) as f32 / len;
        let mut color = colors::TRACER;
        color[3] = alpha;
        vertices.extend(bar(pair[0].as_vec2(), pair[1].as_vec2(), width, color));
    }
    vertices
}

fn link_bar(link: &LinkState, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    bar(link.origin.as_vec2(), link.end_point.as_vec2(), width, color)
}

/// Triangle list for a whole frame: tracer underneath, then links, then pivots
pub fn frame_vertices(frame: &FrameSnapshot, style: &LinkageStyle) -> Vec<Vertex> {
    let mut vertices = tracer_path(&frame.tracer, style.tracer_width);

    let output_color = if frame.dragging {
        colors::DRAG_HIGHLIGHT
    } else {
        colors::OUTPUT
    };
    vertices.extend(link_bar(&frame.ground, style.link_width, colors::GROUND));
    vertices.extend(link_bar(&frame.input, style.link_width, colors::INPUT));
    vertices.extend(link_bar(&frame.coupler, style.link_width, colors::COUPLER));
    vertices.extend(link_bar(&frame.output, style.link_width, output_color));

    for pivot in [
        frame.ground.origin,
        frame.ground.end_point,
        frame.input.end_point,
        frame.output.end_point,
    ] {
        vertices.extend(circle(
            pivot.as_vec2(),
            style.pivot_radius,
            colors::PIVOT,
            style.pivot_segments,
        ));
    }
    vertices
}
