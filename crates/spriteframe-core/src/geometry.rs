//! Camera orbit geometry.
//!
//! The camera circles the world origin around the vertical (Z) axis. Every
//! orbit step rotates the camera location and then re-aims it at the origin.
//! Orientations use Blender's conventions: XYZ Euler angles in radians, and a
//! camera whose default forward axis is `-Z` with `+Y` up.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Extra yaw applied after aiming. [`look_at_origin`] already accounts for
/// the camera's `-Z` forward axis, so the default aim is exact.
pub const DEFAULT_YAW_CORRECTION: f64 = 0.0;

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Length of the vector.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Vec3) -> f64 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z).length()
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// XYZ Euler rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Euler {
    /// Creates a new rotation.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Largest per-axis angular difference, wrapped to `[0, π]`.
    pub fn angular_distance(&self, other: &Euler) -> f64 {
        [
            wrap_angle(self.x - other.x),
            wrap_angle(self.y - other.y),
            wrap_angle(self.z - other.z),
        ]
        .into_iter()
        .map(f64::abs)
        .fold(0.0, f64::max)
    }
}

/// Camera location plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    pub location: Vec3,
    pub rotation: Euler,
}

impl CameraPose {
    /// A pose at `location` aimed at the world origin.
    pub fn aimed_at_origin(location: Vec3) -> Self {
        Self {
            location,
            rotation: look_at_origin(location),
        }
    }

    /// World-space direction the camera looks along (its local `-Z`).
    pub fn forward(&self) -> Vec3 {
        let (sx, cx) = self.rotation.x.sin_cos();
        let (sy, cy) = self.rotation.y.sin_cos();
        let (sz, cz) = self.rotation.z.sin_cos();
        // Rz * Ry * Rx applied to (0, 0, -1).
        let (a, b, c) = (0.0, sx, -cx);
        let (a, b, c) = (a * cy + c * sy, b, -a * sy + c * cy);
        Vec3::new(a * cz - b * sz, a * sz + b * cz, c)
    }

    /// Angle in radians between the view direction and the direction to the
    /// world origin.
    pub fn angle_to_origin(&self) -> f64 {
        let f = self.forward();
        let to = Vec3::new(-self.location.x, -self.location.y, -self.location.z);
        let len = f.length() * to.length();
        if len == 0.0 {
            return 0.0;
        }
        let cos = (f.x * to.x + f.y * to.y + f.z * to.z) / len;
        cos.clamp(-1.0, 1.0).acos()
    }
}

/// Wraps an angle into `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(2.0 * PI);
    if wrapped > PI {
        wrapped - 2.0 * PI
    } else {
        wrapped
    }
}

/// Orientation that aims a `-Z` forward, `+Y` up camera at the world origin.
///
/// Roll is always zero. When `location` has no horizontal component the yaw
/// is undefined and reported as zero.
pub fn look_at_origin(location: Vec3) -> Euler {
    let (dx, dy, dz) = (-location.x, -location.y, -location.z);
    let horizontal = dx.hypot(dy);

    let pitch = horizontal.atan2(-dz);
    let yaw = if horizontal == 0.0 { 0.0 } else { (-dx).atan2(dy) };

    Euler::new(pitch, 0.0, yaw)
}

/// Rotates `location` about the world Z axis by `angle` radians.
///
/// The rotation matrix is applied to the location as a row vector, so a
/// positive angle turns clockwise when viewed from above.
pub fn rotate_about_z(location: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(
        location.x * cos + location.y * sin,
        -location.x * sin + location.y * cos,
        location.z,
    )
}

/// One orbit step: rotate the camera about Z, aim it at the origin, then
/// apply `yaw_correction` to the Z Euler component.
pub fn orbit(location: Vec3, angle: f64, yaw_correction: f64) -> CameraPose {
    let location = rotate_about_z(location, angle);
    let mut rotation = look_at_origin(location);
    rotation.z += yaw_correction;
    CameraPose { location, rotation }
}

/// Angle between two adjacent directions when a full turn is split `count` ways.
pub fn orbit_step(count: u32) -> f64 {
    2.0 * PI / f64::from(count.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_look_at_from_negative_y() {
        // Camera in front of the origin looking along +Y.
        let rot = look_at_origin(Vec3::new(0.0, -10.0, 0.0));
        assert!((rot.x - FRAC_PI_2).abs() < EPS);
        assert!(rot.y.abs() < EPS);
        assert!(rot.z.abs() < EPS);
    }

    #[test]
    fn test_look_at_from_positive_x() {
        let rot = look_at_origin(Vec3::new(5.0, 0.0, 0.0));
        assert!((rot.x - FRAC_PI_2).abs() < EPS);
        assert!((rot.z - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_look_at_from_above() {
        let rot = look_at_origin(Vec3::new(0.0, 0.0, 7.0));
        assert!(rot.x.abs() < EPS);
        assert_eq!(rot.z, 0.0);
    }

    #[test]
    fn test_rotate_quarter_turn_is_clockwise() {
        let p = rotate_about_z(Vec3::new(1.0, 0.0, 3.0), FRAC_PI_2);
        assert!(p.x.abs() < EPS);
        assert!((p.y + 1.0).abs() < EPS);
        assert_eq!(p.z, 3.0);
    }

    #[test]
    fn test_orbit_applies_yaw_correction() {
        let plain = orbit(Vec3::new(0.0, -4.0, 2.0), 0.3, 0.0);
        let corrected = orbit(Vec3::new(0.0, -4.0, 2.0), 0.3, -FRAC_PI_2);
        assert_eq!(plain.location, corrected.location);
        assert!((plain.rotation.z - corrected.rotation.z - FRAC_PI_2).abs() < EPS);
        assert_eq!(plain.rotation.x, corrected.rotation.x);
    }

    #[test]
    fn test_orbit_preserves_radius_and_height() {
        let start = Vec3::new(3.0, -4.0, 1.5);
        let pose = orbit(start, 1.234, DEFAULT_YAW_CORRECTION);
        assert!((pose.location.x.hypot(pose.location.y) - 5.0).abs() < EPS);
        assert_eq!(pose.location.z, 1.5);
    }

    #[test]
    fn test_full_revolution_returns_to_start() {
        let start = Vec3::new(6.0, -8.0, 4.0);
        for n in [1u32, 2, 3, 4, 7, 8, 16, 360] {
            let step = orbit_step(n);
            let first = orbit(start, 0.0, DEFAULT_YAW_CORRECTION);
            let mut pose = first;
            for _ in 0..n {
                pose = orbit(pose.location, step, DEFAULT_YAW_CORRECTION);
            }
            assert!(
                pose.location.distance(&start) < 1e-9,
                "n={} drifted to {:?}",
                n,
                pose.location
            );
            assert!(pose.rotation.angular_distance(&first.rotation) < 1e-9);
        }
    }

    #[test]
    fn test_aimed_pose_faces_origin() {
        for location in [
            Vec3::new(0.0, -10.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(3.0, -4.0, 2.5),
            Vec3::new(-7.0, 2.0, -1.0),
        ] {
            let pose = CameraPose::aimed_at_origin(location);
            assert!(pose.angle_to_origin() < 1e-9, "{:?}", location);
        }
    }

    #[test]
    fn test_default_orbit_keeps_origin_in_view() {
        for n in [1u32, 3, 4, 8, 16] {
            let mut pose = CameraPose::aimed_at_origin(Vec3::new(0.0, -10.0, 4.0));
            for j in 0..n {
                pose = orbit(pose.location, orbit_step(n), DEFAULT_YAW_CORRECTION);
                assert!(
                    pose.angle_to_origin() < 1e-9,
                    "n={} step={} off by {} rad",
                    n,
                    j,
                    pose.angle_to_origin()
                );
            }
        }
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(2.5 * PI) - FRAC_PI_2).abs() < EPS);
        assert!((wrap_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < EPS);
        assert!(wrap_angle(2.0 * PI).abs() < EPS);
    }
}
