use image::{GrayImage, Luma};
use kz_core::{Coord, StereoPair, OCCLUDED};
use kz_stereo::{DataCost, Matcher, Parameters};

fn gray_row(values: &[u8]) -> GrayImage {
    GrayImage::from_fn(values.len() as u32, 1, |x, _| Luma([values[x as usize]]))
}

fn test_params(k: i32, lambda1: i32, lambda2: i32) -> Parameters {
    let mut params = Parameters::default();
    params.data_cost = DataCost::L2;
    params.denominator = 1;
    params.edge_thresh = 8;
    params.k = k;
    params.lambda1 = lambda1;
    params.lambda2 = lambda2;
    params.seed = Some(7);
    params
}

fn row_disparities(m: &Matcher, width: i32) -> Vec<i32> {
    (0..width).map(|x| m.disparity().get(Coord::new(x, 0))).collect()
}

/// Uniqueness and right-map consistency over the final labeling.
fn check_invariants(m: &Matcher) {
    let left = m.disparity();
    let right = m.disparity_right();
    let rsize = right.size();
    let mut partners = std::collections::HashSet::new();

    for y in 0..left.size().y {
        for x in 0..left.size().x {
            let p = Coord::new(x, y);
            let d = left.get(p);
            if d == OCCLUDED {
                continue;
            }
            let q = p + d;
            assert!(q.in_rect(rsize), "assignment of {p:?} leaves the right image");
            assert!(partners.insert(q), "right pixel {q:?} matched twice");
            assert_eq!(right.get(q), -d, "right map out of step at {q:?}");
        }
    }
    for y in 0..rsize.y {
        for x in 0..rsize.x {
            let q = Coord::new(x, y);
            let nd = right.get(q);
            if nd == OCCLUDED {
                continue;
            }
            let p = q + nd;
            assert!(p.in_rect(left.size()));
            assert_eq!(left.get(p), -nd, "left map out of step at {p:?}");
        }
    }
}

#[test]
fn identical_rows_match_at_zero() {
    let im = gray_row(&[10, 20, 30, 40]);
    let pair = StereoPair::from_gray(&im, &im).unwrap();
    let mut m = Matcher::new(pair, 0, 0).unwrap();
    m.set_parameters(test_params(30, 9, 3)).unwrap();

    let stats = m.run().unwrap();

    assert_eq!(row_disparities(&m, 4), vec![0, 0, 0, 0]);
    // Four active assignments, zero data cost, reward k each.
    assert_eq!(stats.energy, -4 * 30);
    assert_eq!(stats.energy, m.compute_energy());
    check_invariants(&m);
}

#[test]
fn shifted_row_occludes_the_edge_pixel() {
    // The right view is the left shifted by -1; the leftmost pixel has no
    // correspondent inside the image.
    let left = gray_row(&[10, 20, 30, 40]);
    let right = gray_row(&[20, 30, 40, 50]);
    let pair = StereoPair::from_gray(&left, &right).unwrap();
    let mut m = Matcher::new(pair, -1, 0).unwrap();
    m.set_parameters(test_params(30, 9, 3)).unwrap();

    let stats = m.run().unwrap();

    assert_eq!(row_disparities(&m, 4), vec![OCCLUDED, -1, -1, -1]);
    assert_eq!(m.disparity().occluded_count(), 1);
    // Three exact matches, one occlusion.
    assert_eq!(stats.energy, -3 * 30);
    assert_eq!(stats.energy, m.compute_energy());
    check_invariants(&m);
}

const BG: u8 = 0;
const FG: u8 = 255;
const SHIFT: i32 = 2;

/// A bright 4x4 block on a constant background, shifted between the views.
/// The background matches itself at any disparity, so the zero label wins
/// on it only through the assignment rewards and the smoothness term.
fn block_scene() -> (GrayImage, GrayImage) {
    let in_block = |x: i32, y: i32| (5..9).contains(&x) && (6..10).contains(&y);
    let left = GrayImage::from_fn(16, 16, |x, y| {
        Luma([if in_block(x as i32, y as i32) { FG } else { BG }])
    });
    let right = GrayImage::from_fn(16, 16, |x, y| {
        Luma([if in_block(x as i32 - SHIFT, y as i32) { FG } else { BG }])
    });
    (left, right)
}

#[test]
fn foreground_block_gets_its_shift() {
    let (left, right) = block_scene();
    let pair = StereoPair::from_gray(&left, &right).unwrap();
    let mut m = Matcher::new(pair, 0, 2).unwrap();
    m.set_parameters(test_params(300, 9, 3)).unwrap();

    let stats = m.run().unwrap();

    for y in 0..16 {
        for x in 0..16 {
            let p = Coord::new(x, y);
            let d = m.disparity().get(p);
            if (5..9).contains(&x) && (6..10).contains(&y) {
                assert_eq!(d, SHIFT, "foreground at {p:?}");
            } else if (9..11).contains(&x) && (6..10).contains(&y) {
                // The strip the block uncovers on its right has no
                // correspondent left to claim.
                assert_eq!(d, OCCLUDED, "de-occluded strip at {p:?}");
            } else {
                assert_eq!(d, 0, "background at {p:?}");
            }
        }
    }
    // One strip of the shift width per block row.
    assert_eq!(m.disparity().occluded_count(), (SHIFT * 4) as usize);
    assert_eq!(stats.energy, m.compute_energy());
    check_invariants(&m);
}

#[test]
fn energy_never_increases_across_runs() {
    let (left, right) = block_scene();
    let pair = StereoPair::from_gray(&left, &right).unwrap();
    let mut m = Matcher::new(pair, 0, 2).unwrap();
    let mut params = test_params(300, 9, 3);
    params.max_iter = 1;
    m.set_parameters(params).unwrap();

    // All-occluded start has energy zero; each partial run may only lower it.
    assert_eq!(m.compute_energy(), 0);
    let first = m.run().unwrap();
    assert!(first.energy <= 0);
    let second = m.run().unwrap();
    assert!(second.energy <= first.energy);
}

#[test]
fn settled_run_is_idempotent() {
    let (left, right) = block_scene();
    let pair = StereoPair::from_gray(&left, &right).unwrap();
    let mut m = Matcher::new(pair, 0, 2).unwrap();
    m.set_parameters(test_params(300, 9, 3)).unwrap();

    let first = m.run().unwrap();
    let labeling = m.disparity().clone();

    let second = m.run().unwrap();
    assert_eq!(second.accepted_moves, 0);
    assert_eq!(second.energy, first.energy);
    assert_eq!(m.disparity(), &labeling);
}

#[test]
fn rejects_empty_disparity_range() {
    let im = gray_row(&[1, 2, 3]);
    let pair = StereoPair::from_gray(&im, &im).unwrap();
    assert!(Matcher::new(pair, 3, 1).is_err());
}

#[test]
fn auto_parameters_produce_a_plausible_labeling() {
    let (left, right) = block_scene();
    let pair = StereoPair::from_gray(&left, &right).unwrap();
    let mut m = Matcher::new(pair, 0, 2).unwrap();
    let mut params = Parameters::default();
    params.seed = Some(3);
    m.set_parameters(params).unwrap();
    m.fix_parameters(-1.0, -1.0, -1.0, -1.0).unwrap();

    assert!(m.parameters().k > 0);
    assert!(m.parameters().lambda1 >= m.parameters().lambda2);

    m.run().unwrap();
    check_invariants(&m);
    // Matches must dominate on a well-textured scene.
    let total = (16 * 16) as usize;
    assert!(m.disparity().occluded_count() < total / 2);
}
