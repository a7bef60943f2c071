//! Deterministic synthetic multi-view scenes.
//!
//! Small building blocks for tests and benchmarks: pinhole views looking
//! down at a ground patch, ground points with relief, and ground-truth
//! fundamental matrices between any two views. No `thread_rng`; every
//! sequence is derived from an explicit seed.

use crate::{skew, Mat3, Pt2, Real, Vec3};
use nalgebra::Rotation3;

/// Ideal pinhole view `x ~ K (R X + t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PinholeView {
    pub k: Mat3,
    pub rotation: Rotation3<Real>,
    pub translation: Vec3,
}

impl PinholeView {
    /// Nadir-looking view centred at `center` with a small `(roll, pitch)` tilt.
    pub fn nadir(focal: Real, principal: Pt2, center: Vec3, tilt: (Real, Real)) -> Self {
        let k = Mat3::new(focal, 0.0, principal.x, 0.0, focal, principal.y, 0.0, 0.0, 1.0);
        // Camera z axis points down the world -Z axis.
        let down = Rotation3::from_euler_angles(std::f64::consts::PI, 0.0, 0.0);
        let rotation = Rotation3::from_euler_angles(tilt.0, tilt.1, 0.0) * down;
        let translation = -(rotation * center);
        Self {
            k,
            rotation,
            translation,
        }
    }

    /// Project a world point; `None` when it lies behind the camera.
    pub fn project(&self, world: &Vec3) -> Option<Pt2> {
        let pc = self.rotation * *world + self.translation;
        if pc.z <= Real::EPSILON {
            return None;
        }
        let uv = self.k * (pc / pc.z);
        Some(Pt2::new(uv.x, uv.y))
    }

    /// Ground-truth fundamental matrix `F` with `x_other^T F x_self = 0`.
    ///
    /// `F * x_self` is the epipolar line of `x_self` in `other`. The result
    /// is scaled to unit Frobenius norm.
    pub fn fundamental_to(&self, other: &PinholeView) -> Option<Mat3> {
        let r = other.rotation * self.rotation.inverse();
        let t = other.translation - r * self.translation;
        let e = skew(&t) * r.matrix();
        let k_self_inv = self.k.try_inverse()?;
        let k_other_inv = other.k.try_inverse()?;
        let f = k_other_inv.transpose() * e * k_self_inv;
        let norm = f.norm();
        (norm > 0.0).then(|| f / norm)
    }
}

/// `n` nadir views spread on a circle of `radius` above `(cx, cy)`.
///
/// Views are placed at distinct angles with slightly different altitudes so
/// no three camera centres are collinear.
pub fn ring_of_views(
    n: usize,
    focal: Real,
    ground_center: Pt2,
    radius: Real,
    altitude: Real,
) -> Vec<PinholeView> {
    (0..n)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as Real / n.max(1) as Real + 0.3;
            let center = Vec3::new(
                ground_center.x + radius * angle.cos(),
                ground_center.y + radius * angle.sin(),
                altitude + 7.0 * i as Real,
            );
            let tilt = (0.02 * (i as Real + 1.0), -0.015 * i as Real);
            PinholeView::nadir(focal, Pt2::new(512.0, 512.0), center, tilt)
        })
        .collect()
}

/// Deterministic ground points with terrain relief inside `[min, max]`.
pub fn ground_points(n: usize, min: Pt2, max: Pt2, relief: Real, seed: u64) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let key = seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            let u = unit(splitmix64(key));
            let v = unit(splitmix64(key ^ 0xBF58_476D_1CE4_E5B9));
            let w = unit(splitmix64(key ^ 0x94D0_49BB_1331_11EB));
            Vec3::new(
                min.x + u * (max.x - min.x),
                min.y + v * (max.y - min.y),
                relief * w,
            )
        })
        .collect()
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn unit(x: u64) -> Real {
    (x >> 11) as Real / (1u64 << 53) as Real
}
