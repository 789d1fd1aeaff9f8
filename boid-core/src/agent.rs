use crate::Vector2D;
use std::f32::consts::{PI, TAU};

/// Half-extent of the canonical boid triangle
pub const BOID_SIZE: f32 = 5.0;

/// Canonical, unrotated silhouette: nose up (towards -y), base below.
const CANONICAL_SHAPE: [Vector2D; 3] = [
    Vector2D { x: 0.0, y: -BOID_SIZE },
    Vector2D { x: -BOID_SIZE, y: BOID_SIZE },
    Vector2D { x: BOID_SIZE, y: BOID_SIZE },
];

/// Euclidean distance between two points
pub fn distance(p: Vector2D, q: Vector2D) -> f32 {
    p.distance(&q)
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid of a tiny negative value rounds up to exactly TAU in f32
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Heading of the displacement `to - from`, in `[0, 2π)`.
///
/// Heading 0 points up the screen (towards -y) and angles grow clockwise on
/// screen, so a displacement of `(0, +1)` reads as `π`.
pub fn heading_of(from: Vector2D, to: Vector2D) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    normalize_angle((-dx).atan2(dy) + PI)
}

/// A single boid.
///
/// `shape` carries the accumulated rotation of the silhouette and is only ever
/// changed through [`Agent::rotate`], which advances `rotation` by the same
/// delta.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub origin: Vector2D,
    pub velocity: Vector2D,
    pub rotation: f32,
    pub angular_velocity: f32,
    pub last_update: f64,
    pub shape: [Vector2D; 3],
}

impl Agent {
    pub fn new(origin: Vector2D, velocity: Vector2D, rotation: f32, angular_velocity: f32) -> Self {
        Self {
            origin,
            velocity,
            rotation: normalize_angle(rotation),
            angular_velocity,
            last_update: 0.0,
            shape: CANONICAL_SHAPE,
        }
    }

    pub fn with_last_update(mut self, timestamp: f64) -> Self {
        self.last_update = timestamp;
        self
    }

    /// Turn by `theta` radians, rotating the current shape in place.
    ///
    /// Rotations compose: the matrix is applied to the already-rotated
    /// vertices, never recomputed from the absolute heading.
    pub fn rotate(&mut self, theta: f32) {
        for vertex in self.shape.iter_mut() {
            *vertex = vertex.rotated(theta);
        }
        self.rotation = normalize_angle(self.rotation + theta);
    }

    /// Unit vector along the current heading
    pub fn forward(&self) -> Vector2D {
        Vector2D::from_heading(self.rotation)
    }

    /// World-space triangle vertices
    pub fn world_vertices(&self) -> [Vector2D; 3] {
        [
            self.shape[0] + self.origin,
            self.shape[1] + self.origin,
            self.shape[2] + self.origin,
        ]
    }
}
