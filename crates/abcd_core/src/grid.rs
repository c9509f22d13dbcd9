//! Grid geometry: positions, cardinal headings and the playable arena.
//!
//! Coordinates follow the engine convention the layouts were authored in:
//! `x` is left/right, `y` is height, `z` is forward/back. Headings are yaw
//! angles around `y`, with 0° facing `+z` and 90° facing `+x`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in world/grid units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GridPosition {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &GridPosition) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Step toward `target` by at most `max_delta`, never overshooting.
    /// A negative or NaN `max_delta` leaves the position unchanged.
    pub fn move_towards(&self, target: &GridPosition, max_delta: f32) -> GridPosition {
        let max_delta = max_delta.max(0.0);
        let dist = self.distance(target);
        if dist <= max_delta || dist == 0.0 {
            return *target;
        }
        let scale = max_delta / dist;
        GridPosition {
            x: self.x + (target.x - self.x) * scale,
            y: self.y + (target.y - self.y) * scale,
            z: self.z + (target.z - self.z) * scale,
        }
    }

    /// The neighbouring cell one `step` ahead along `heading`.
    pub fn stepped(&self, heading: Heading, step: f32) -> GridPosition {
        let (dx, dz) = heading.forward();
        GridPosition {
            x: self.x + dx * step,
            y: self.y,
            z: self.z + dz * step,
        }
    }

    pub fn approx_eq(&self, other: &GridPosition, tolerance: f32) -> bool {
        self.distance(other) <= tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// One of the four cardinal facings. Settled orientation is always one of
/// these, so it cannot drift off a multiple of 90°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    #[default]
    North,
    East,
    South,
    West,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Yaw in degrees: 0, 90, 180 or 270.
    pub fn degrees(self) -> f32 {
        match self {
            Heading::North => 0.0,
            Heading::East => 90.0,
            Heading::South => 180.0,
            Heading::West => 270.0,
        }
    }

    pub fn turned(self, turn: Turn) -> Heading {
        let quarters = match turn {
            Turn::Left => 3,
            Turn::Right => 1,
            Turn::About => 2,
        };
        Heading::ALL[(self.index() + quarters) % 4]
    }

    /// Unit `(dx, dz)` for one step forward.
    pub fn forward(self) -> (f32, f32) {
        match self {
            Heading::North => (0.0, 1.0),
            Heading::East => (1.0, 0.0),
            Heading::South => (0.0, -1.0),
            Heading::West => (-1.0, 0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Heading::North => "north",
            Heading::East => "east",
            Heading::South => "south",
            Heading::West => "west",
        }
    }

    fn index(self) -> usize {
        match self {
            Heading::North => 0,
            Heading::East => 1,
            Heading::South => 2,
            Heading::West => 3,
        }
    }
}

/// A discrete rotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Left,
    Right,
    About,
}

impl Turn {
    /// Signed yaw change. About-face always turns clockwise.
    pub fn delta_degrees(self) -> f32 {
        match self {
            Turn::Left => -90.0,
            Turn::Right => 90.0,
            Turn::About => 180.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Turn::Left => "left",
            Turn::Right => "right",
            Turn::About => "about",
        }
    }
}

/// Rectangular playable area on the x/z plane.
///
/// Both comparisons are strict against the bound widened by `tolerance`; the
/// tolerance only absorbs float rounding on cells that sit exactly on a bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub tolerance: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            left: -5.3,
            right: 15.3,
            bottom: 5.0,
            top: 25.6,
            tolerance: 0.1,
        }
    }
}

impl ArenaBounds {
    pub fn contains(&self, position: &GridPosition) -> bool {
        position.x > self.left - self.tolerance
            && position.x < self.right + self.tolerance
            && position.z < self.top + self.tolerance
            && position.z > self.bottom - self.tolerance
    }
}
