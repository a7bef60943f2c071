use cnet_core::synthetic::{ground_points, ring_of_views};
use cnet_core::{Pt2, RansacOptions};
use cnet_linear::{fundamental_ransac, reprojection_error, transfer_point};

#[test]
fn estimated_fundamentals_transfer_into_third_view() {
    let views = ring_of_views(3, 1200.0, Pt2::new(0.0, 0.0), 40.0, 500.0);
    let world = ground_points(60, Pt2::new(-60.0, -60.0), Pt2::new(60.0, 60.0), 25.0, 99);
    let img: Vec<Vec<Pt2>> = views
        .iter()
        .map(|v| world.iter().map(|w| v.project(w).unwrap()).collect())
        .collect();

    let opts = RansacOptions {
        thresh: 0.5,
        ..RansacOptions::default()
    };
    let f02 = fundamental_ransac(&img[0], &img[2], &opts).unwrap();
    let f12 = fundamental_ransac(&img[1], &img[2], &opts).unwrap();
    assert_eq!(f02.num_inliers(), world.len());

    let errs = reprojection_error(&f12.matrix, &img[1], &img[2]);
    assert!(errs.iter().all(|&e| e < 1e-6));

    for i in 0..world.len() {
        let got = transfer_point(&f02.matrix, &f12.matrix, &img[0][i], &img[1][i]).unwrap();
        assert!(
            (got - img[2][i]).norm() < 1e-4,
            "point {i}: {got} vs {}",
            img[2][i]
        );
    }
}

