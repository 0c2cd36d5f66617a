//! Node placement.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Layout used by the runner to place `node_count` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Line,
    Ring,
    Grid,
}

impl Layout {
    /// Positions for `count` nodes, `spacing` apart (ring: arc length).
    pub fn positions(self, count: usize, spacing: f64) -> Vec<Position> {
        match self {
            Layout::Line => line(count, spacing),
            Layout::Ring => ring(count, spacing),
            Layout::Grid => grid(count, spacing),
        }
    }
}

/// Nodes along the x axis, starting at `spacing`.
pub fn line(count: usize, spacing: f64) -> Vec<Position> {
    (1..=count)
        .map(|i| Position::new(i as f64 * spacing, 0.0, 0.0))
        .collect()
}

/// Nodes evenly spread on a circle whose neighboring nodes are `spacing` apart along the arc.
pub fn ring(count: usize, spacing: f64) -> Vec<Position> {
    if count == 0 {
        return Vec::new();
    }
    let step = 360.0 / count as f64;
    let radius = spacing / step.to_radians();
    (0..count)
        .map(|i| {
            let angle = (i as f64 * step).to_radians();
            Position::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect()
}

/// Row-major square grid; `count` is rounded down to a perfect square.
pub fn grid(count: usize, spacing: f64) -> Vec<Position> {
    let side = (count as f64).sqrt() as usize;
    let mut positions = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            positions.push(Position::new(col as f64 * spacing, row as f64 * spacing, 0.0));
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spacing() {
        let p = line(3, 10.0);
        assert_eq!(p.len(), 3);
        assert_eq!(p[0].distance_to(&p[1]), 10.0);
        assert_eq!(p[0].distance_to(&p[2]), 20.0);
    }

    #[test]
    fn grid_rounds_down_to_square() {
        assert_eq!(grid(10, 1.0).len(), 9);
    }

    #[test]
    fn ring_neighbors_roughly_spacing_apart() {
        let p = ring(20, 10.0);
        let d = p[0].distance_to(&p[1]);
        assert!(d <= 10.0 && d > 9.9, "chord {d}");
    }
}
