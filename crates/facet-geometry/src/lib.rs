//! Pure kinematics and collision functions for Facet's mini-games.
//!
//! Everything in this crate is stateless: positions in, positions out.
//! The simulation tick engine calls into here to integrate movement and
//! resolve hits; nothing here touches the store or the clock.
//!
//! Two coordinate systems are supported:
//!
//! - [`Vec2`] — continuous canvas space (the tank arena). Headings are
//!   screen-space angles where 0 points up and values grow clockwise,
//!   so forward motion is `x += sin(a)·s`, `y -= cos(a)·s`.
//! - [`Cell`] — a discrete grid (the snake board). Collision is exact
//!   cell equality; there is no sub-cell position.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Continuous space
// ---------------------------------------------------------------------------

/// A point or velocity in continuous canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Unit velocity for a screen-space heading (0 = up, clockwise positive).
pub fn heading_velocity(angle: f64) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos())
}

/// Advances a position along a direction: `pos + dir × speed`.
pub fn integrate(pos: Vec2, dir: Vec2, speed: f64) -> Vec2 {
    pos + dir * speed
}

/// True when `a` is strictly within `radius` of `b`.
///
/// Strict comparison: a point exactly on the radius is a miss.
pub fn within_radius(a: Vec2, b: Vec2, radius: f64) -> bool {
    a.distance(b) < radius
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// An axis-aligned playfield, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when the point lies strictly inside the playfield.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x > 0.0 && p.x < self.width && p.y > 0.0 && p.y < self.height
    }

    /// Clamps a point so it stays at least `margin` away from every edge.
    pub fn clamp(&self, p: Vec2, margin: f64) -> Vec2 {
        Vec2::new(
            p.x.clamp(margin, self.width - margin),
            p.y.clamp(margin, self.height - margin),
        )
    }
}

// ---------------------------------------------------------------------------
// Grid space
// ---------------------------------------------------------------------------

/// One cell of a discrete grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell reached by stepping once in `dir`.
    pub fn step(self, dir: GridDir) -> Self {
        Self::new(self.x + dir.dx, self.y + dir.dy)
    }
}

/// A unit direction on the grid. Exactly one of `dx`/`dy` is nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDir {
    pub dx: i32,
    pub dy: i32,
}

impl GridDir {
    pub const UP: Self = Self { dx: 0, dy: -1 };
    pub const DOWN: Self = Self { dx: 0, dy: 1 };
    pub const LEFT: Self = Self { dx: -1, dy: 0 };
    pub const RIGHT: Self = Self { dx: 1, dy: 0 };

    /// True when the two directions share an axis — i.e. switching
    /// between them would be a 180° reversal or a no-op.
    pub fn same_axis(self, other: Self) -> bool {
        (self.dx != 0 && other.dx != 0) || (self.dy != 0 && other.dy != 0)
    }
}

/// A rectangular grid of `width × height` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True when the cell lies on the board.
    pub fn contains(&self, c: Cell) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_integrate_advances_by_dir_times_speed() {
        let p = integrate(Vec2::new(10.0, 20.0), Vec2::new(1.0, 0.0), 3.0);
        assert!((p.x - 13.0).abs() < EPS);
        assert!((p.y - 20.0).abs() < EPS);
    }

    #[test]
    fn test_integrate_n_ticks_is_linear() {
        // After N ticks with constant direction d and speed s the position
        // is exactly initial + N·s·d.
        let dir = Vec2::new(0.6, 0.8);
        let mut p = Vec2::new(5.0, 5.0);
        for _ in 0..10 {
            p = integrate(p, dir, 2.0);
        }
        assert!((p.x - (5.0 + 10.0 * 2.0 * 0.6)).abs() < EPS);
        assert!((p.y - (5.0 + 10.0 * 2.0 * 0.8)).abs() < EPS);
    }

    #[test]
    fn test_heading_velocity_zero_points_up() {
        let v = heading_velocity(0.0);
        assert!(v.x.abs() < EPS);
        assert!((v.y + 1.0).abs() < EPS);
    }

    #[test]
    fn test_heading_velocity_quarter_turn_points_right() {
        let v = heading_velocity(std::f64::consts::FRAC_PI_2);
        assert!((v.x - 1.0).abs() < EPS);
        assert!(v.y.abs() < EPS);
    }

    #[test]
    fn test_within_radius_strict_boundary() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(20.0, 0.0);
        assert!(!within_radius(a, b, 20.0));
        assert!(within_radius(a, b, 20.0 + 1e-6));
        assert!(within_radius(a, Vec2::new(19.0, 0.0), 20.0));
    }

    #[test]
    fn test_bounds_contains_excludes_edges() {
        let b = Bounds::new(400.0, 300.0);
        assert!(b.contains(Vec2::new(1.0, 1.0)));
        assert!(!b.contains(Vec2::new(0.0, 150.0)));
        assert!(!b.contains(Vec2::new(400.0, 150.0)));
        assert!(!b.contains(Vec2::new(200.0, 300.0)));
    }

    #[test]
    fn test_bounds_clamp_respects_margin() {
        let b = Bounds::new(800.0, 600.0);
        let p = b.clamp(Vec2::new(-50.0, 700.0), 20.0);
        assert!((p.x - 20.0).abs() < EPS);
        assert!((p.y - 580.0).abs() < EPS);
        // Points already inside the margin are untouched.
        let q = b.clamp(Vec2::new(100.0, 100.0), 20.0);
        assert_eq!(q, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_cell_step() {
        assert_eq!(Cell::new(5, 5).step(GridDir::RIGHT), Cell::new(6, 5));
        assert_eq!(Cell::new(5, 5).step(GridDir::UP), Cell::new(5, 4));
    }

    #[test]
    fn test_grid_dir_same_axis() {
        assert!(GridDir::LEFT.same_axis(GridDir::RIGHT));
        assert!(GridDir::UP.same_axis(GridDir::DOWN));
        assert!(GridDir::UP.same_axis(GridDir::UP));
        assert!(!GridDir::LEFT.same_axis(GridDir::DOWN));
    }

    #[test]
    fn test_grid_contains() {
        let g = Grid::new(30, 30);
        assert!(g.contains(Cell::new(0, 0)));
        assert!(g.contains(Cell::new(29, 29)));
        assert!(!g.contains(Cell::new(30, 10)));
        assert!(!g.contains(Cell::new(10, -1)));
    }
}
