//! Overlay polygon.
//!
//! A faint N-sided polygon drawn over the particles. Its side count is the
//! active profile's geometric signature; the wobble phase comes from the
//! focus text hash, so two different focus keys on the same profile still
//! breathe differently. Vertices double as click/hover targets.

use std::f32::consts::{FRAC_PI_2, TAU};

use crate::types::Point;

/// Minimum polygon side count.
pub const MIN_SIDES: u8 = 3;

/// Whole-polygon breathing amplitude (fraction of the radius).
const BREATH_AMPLITUDE: f32 = 0.03;

/// Per-vertex radius jitter amplitude (fraction of the radius).
const VERTEX_JITTER: f32 = 0.04;

/// Rotation per frame, radians.
const SPIN: f32 = 0.002;

/// Overlay vertex buffer, reused between frames.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    vertices: Vec<Point>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the vertices for this frame.
    ///
    /// `sides` below [`MIN_SIDES`] is raised to it. The first vertex starts
    /// at the top of the polygon before rotation.
    pub fn layout(&mut self, center: Point, base_radius: f32, sides: u8, frame: u64, text_hash: u32) {
        let sides = sides.max(MIN_SIDES) as usize;
        let t = frame as f32;
        let phase = (text_hash % 3600) as f32 * (TAU / 3600.0);
        let breath = 1.0 + BREATH_AMPLITUDE * (t * 0.02 + phase).sin();
        let rotation = t * SPIN;

        self.vertices.clear();
        for i in 0..sides {
            let jitter = 1.0 + VERTEX_JITTER * (t * 0.05 + i as f32 * 1.7 + phase).sin();
            let radius = base_radius * breath * jitter;
            let angle = -FRAC_PI_2 + rotation + TAU * i as f32 / sides as f32;
            self.vertices
                .push(Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()));
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Index of the nearest vertex within `radius` of `p`.
    pub fn hit_test(&self, p: Point, radius: f32) -> Option<usize> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.distance(p)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Drop every vertex (nothing is hit until the next layout).
    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Point = Point::new(100.0, 50.0);

    #[test]
    fn test_layout_produces_side_count_vertices() {
        let mut overlay = Overlay::new();
        for sides in 3..=8 {
            overlay.layout(CENTER, 40.0, sides, 0, 0);
            assert_eq!(overlay.len(), sides as usize);
        }
        overlay.layout(CENTER, 40.0, 1, 0, 0);
        assert_eq!(overlay.len(), MIN_SIDES as usize);
    }

    #[test]
    fn test_vertices_stay_near_base_radius() {
        let mut overlay = Overlay::new();
        for frame in [0, 17, 500, 12_345] {
            overlay.layout(CENTER, 40.0, 6, frame, 0xdead_beef);
            for v in overlay.vertices() {
                let r = v.distance(CENTER);
                assert!(r > 40.0 * 0.9 && r < 40.0 * 1.1, "radius {r} at frame {frame}");
            }
        }
    }

    #[test]
    fn test_first_vertex_starts_on_top() {
        let mut overlay = Overlay::new();
        overlay.layout(CENTER, 40.0, 4, 0, 0);
        let top = overlay.vertices()[0];
        assert!((top.x - CENTER.x).abs() < 2.0);
        assert!(top.y < CENTER.y);
    }

    #[test]
    fn test_text_hash_changes_wobble() {
        let mut a = Overlay::new();
        let mut b = Overlay::new();
        a.layout(CENTER, 40.0, 5, 30, 1);
        b.layout(CENTER, 40.0, 5, 30, 1800);
        assert_ne!(a.vertices(), b.vertices());
    }

    #[test]
    fn test_hit_test_picks_nearest_within_radius() {
        let mut overlay = Overlay::new();
        overlay.layout(CENTER, 40.0, 4, 0, 0);
        let v2 = overlay.vertices()[2];

        assert_eq!(overlay.hit_test(v2, 5.0), Some(2));
        assert_eq!(overlay.hit_test(v2 + Point::new(3.0, 0.0), 5.0), Some(2));
        assert_eq!(overlay.hit_test(CENTER, 5.0), None);

        overlay.clear();
        assert_eq!(overlay.hit_test(v2, 5.0), None);
    }
}
