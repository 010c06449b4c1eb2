use crate::sphere::profile::{DepthScale, DeviceProfile};
use crate::sphere::{DEGREES_PER_TURN, GOLDEN_ANGLE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpherePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpherePosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &SpherePosition) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Card size factor from the distance to a camera `camera_offset` behind the center,
    /// clamped to the profile's bounds.
    pub fn depth_scale(&self, depth: &DepthScale) -> f64 {
        let dz = self.z + depth.camera_offset;
        let distance = (self.x * self.x + self.y * self.y + dz * dz).sqrt();
        if distance <= f64::EPSILON {
            return depth.max;
        }
        (depth.focal / distance * depth.gain).clamp(depth.min, depth.max)
    }
}

/// Golden-angle lattice: `pool_length` points from the north pole (`y = +radius`) down to the
/// south pole (`y = -radius`), each turned by the golden angle from the previous one.
pub fn positions(pool_length: usize, radius: f64) -> Vec<SpherePosition> {
    (0..pool_length)
        .map(|i| {
            // a single card sits on the equator
            let y_norm = if pool_length == 1 {
                0.0
            } else {
                1.0 - (i as f64 / (pool_length - 1) as f64) * 2.0
            };
            let ring_radius = (1.0 - y_norm * y_norm).max(0.0).sqrt();
            let theta = GOLDEN_ANGLE * i as f64;

            SpherePosition::new(
                theta.cos() * ring_radius * radius,
                y_norm * radius,
                theta.sin() * ring_radius * radius,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardPlacement {
    pub position: SpherePosition,
    pub scale: f64,
}

/// Positions plus perspective scale for every slot of a pool laid out with `profile`.
pub fn place_cards(pool_length: usize, profile: &DeviceProfile) -> Vec<CardPlacement> {
    positions(pool_length, profile.radius)
        .into_iter()
        .map(|position| CardPlacement {
            position,
            scale: position.depth_scale(&profile.depth),
        })
        .collect()
}

/// Sphere orientation in degrees around the x and y axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SphereRotation {
    pub x: f64,
    pub y: f64,
}

impl SphereRotation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn advance(&mut self, delta: SphereRotation) {
        self.x = (self.x + delta.x).rem_euclid(DEGREES_PER_TURN);
        self.y = (self.y + delta.y).rem_euclid(DEGREES_PER_TURN);
    }
}
