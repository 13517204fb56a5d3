//! Plane geometry used by both the simulation and the wire protocol

use serde::{Deserialize, Serialize};

///Represents a point or displacement in the arena plane.
/// The y-axis grows downwards, matching screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    pub x: f32,
    ///Value along the y-axis.
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns `self - other`.
    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Euclidean distance between two points.
    pub fn dist_to(&self, other: &Vector2) -> f32 {
        self.sub(other).magnitude()
    }

    ///Clamps each axis independently into `[min_x, max_x] x [min_y, max_y]`.
    pub fn limited(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vector2 {
        Vector2 {
            x: limit(self.x, min_x, max_x),
            y: limit(self.y, min_y, max_y),
        }
    }

    ///True when the point lies inside `[0, width] x [0, height]` grown by `margin` on every side.
    pub fn inside_bounds(&self, width: f32, height: f32, margin: f32) -> bool {
        self.x >= -margin
            && self.x <= width + margin
            && self.y >= -margin
            && self.y <= height + margin
    }

    ///Returns the unit direction of this vector.
    pub fn direction(&self) -> Direction {
        let mag = self.magnitude();
        if mag == 0.0 {
            Direction(Vector2::ZERO)
        } else {
            Direction(Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            })
        }
    }
}

// Must tolerate crossed bounds (hit-box wider than the arena); `f32::clamp` panics there.
fn limit(value: f32, lower: f32, upper: f32) -> f32 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

///A unit-length heading, or zero when built from a zero vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Direction(Vector2);

impl Direction {
    ///Displacement of length `by` along this heading.
    pub fn scalar_mult(&self, by: f32) -> Vector2 {
        self.0.scale(by)
    }

    pub fn as_vector(&self) -> Vector2 {
        self.0
    }
}
