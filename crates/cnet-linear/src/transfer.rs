//! Epipolar point transfer.
//!
//! A point observed in images `w` and `v` lies, in a third image `e`, on the
//! epipolar line of its `w` observation and on the epipolar line of its `v`
//! observation. Intersecting the two lines locates it in `e` without any
//! camera model or triangulation.
//!
//! The transfer is undefined when the two lines are (nearly) parallel, which
//! happens when the three camera centres are collinear or the point lies on
//! the trifocal plane; those cases yield `None`.

use cnet_core::{from_homogeneous, to_homogeneous, Mat3, Pt2, Real, Vec3};

/// Minimum sine of the angle between two lines for a usable intersection.
pub const MIN_INTERSECTION_SINE: Real = 1e-9;

/// Epipolar line `l = F x` of `x` in the other image of `F`.
pub fn epipolar_line(f: &Mat3, x: &Pt2) -> Vec3 {
    f * to_homogeneous(x)
}

/// Intersection of two homogeneous lines.
///
/// `None` when either line is the line at infinity or the lines are
/// parallel (or identical) within [`MIN_INTERSECTION_SINE`].
pub fn intersect_lines(l1: &Vec3, l2: &Vec3) -> Option<Pt2> {
    let n1 = l1.xy().norm();
    let n2 = l2.xy().norm();
    if !(n1 > 0.0 && n2 > 0.0) {
        return None;
    }
    let p = l1.cross(l2);
    if p.z.abs() <= MIN_INTERSECTION_SINE * n1 * n2 {
        return None;
    }
    from_homogeneous(&p)
}

/// Transfer a correspondence `(x_w, x_v)` into a third image `e`.
///
/// `f_we` maps points of `w` to epipolar lines in `e`, and `f_ve` does the
/// same for `v`.
pub fn transfer_point(f_we: &Mat3, f_ve: &Mat3, x_w: &Pt2, x_v: &Pt2) -> Option<Pt2> {
    intersect_lines(&epipolar_line(f_we, x_w), &epipolar_line(f_ve, x_v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnet_core::synthetic::{ground_points, ring_of_views, PinholeView};
    use cnet_core::Vec3 as V;

    #[test]
    fn lines_meet_at_expected_point() {
        // x = 2 and y = -1
        let p = intersect_lines(&V::new(1.0, 0.0, -2.0), &V::new(0.0, 1.0, 1.0)).unwrap();
        assert!((p - Pt2::new(2.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        assert!(intersect_lines(&V::new(1.0, 1.0, 0.0), &V::new(2.0, 2.0, 5.0)).is_none());
        assert!(intersect_lines(&V::new(1.0, 1.0, 0.0), &V::new(1.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn transfer_matches_projection_in_third_view() {
        let views = ring_of_views(3, 1000.0, Pt2::new(50.0, 50.0), 30.0, 350.0);
        let f_we = views[0].fundamental_to(&views[2]).unwrap();
        let f_ve = views[1].fundamental_to(&views[2]).unwrap();
        for world in ground_points(25, Pt2::new(20.0, 20.0), Pt2::new(80.0, 80.0), 10.0, 5) {
            let x_w = views[0].project(&world).unwrap();
            let x_v = views[1].project(&world).unwrap();
            let expected = views[2].project(&world).unwrap();
            let got = transfer_point(&f_we, &f_ve, &x_w, &x_v).unwrap();
            assert!((got - expected).norm() < 1e-5, "{got} vs {expected}");
        }
    }

    #[test]
    fn collinear_centres_are_degenerate() {
        let principal = Pt2::new(512.0, 512.0);
        let views: Vec<PinholeView> = (0..3)
            .map(|i| {
                let c = V::new(10.0 * i as f64, 0.0, 300.0);
                PinholeView::nadir(1000.0, principal, c, (0.0, 0.0))
            })
            .collect();
        let f_we = views[0].fundamental_to(&views[2]).unwrap();
        let f_ve = views[1].fundamental_to(&views[2]).unwrap();
        let world = V::new(5.0, 20.0, 0.0);
        let x_w = views[0].project(&world).unwrap();
        let x_v = views[1].project(&world).unwrap();
        assert!(transfer_point(&f_we, &f_ve, &x_w, &x_v).is_none());
    }
}
