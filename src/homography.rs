use nalgebra::{DMatrix, Matrix3, Vector3};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// A planar projective transform estimated from matched point pairs, with
/// the per-pair inlier mask reported by the solver.
#[derive(Debug, Clone)]
pub struct Homography {
    pub matrix: Matrix3<f64>,
    pub inliers: Vec<bool>,
}

impl Homography {
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&inlier| inlier).count()
    }
}

/// Robust estimation of a planar homography from matched point pairs.
///
/// `src` and `dst` are parallel slices. Returns `None` when no transform
/// can be estimated: fewer than four pairs, or a degenerate configuration
/// such as collinear points. The inlier mask has the same length as the
/// inputs.
pub trait HomographyEstimator {
    fn estimate(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Homography>;
}

/// RANSAC over minimal four-point DLT samples, followed by a refit on the
/// consensus set.
///
/// Sampling is seeded per call, so the estimate is a deterministic function
/// of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct RansacHomography {
    /// Reprojection error tolerance in pixels.
    pub reproj_threshold: f64,
    /// Number of sampling rounds.
    pub max_iters: usize,
}

impl HomographyEstimator for RansacHomography {
    fn estimate(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Homography> {
        if src.len() != dst.len() || src.len() < 4 {
            return None;
        }
        let n = src.len();
        let threshold_sq = self.reproj_threshold * self.reproj_threshold;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let mut best: Option<(usize, Matrix3<f64>)> = None;

        for _ in 0..self.max_iters.max(32) {
            let picked = sample(&mut rng, n, 4);
            let sample_src: Vec<[f64; 2]> = picked.iter().map(|i| src[i]).collect();
            let sample_dst: Vec<[f64; 2]> = picked.iter().map(|i| dst[i]).collect();
            if has_collinear_triple(&sample_src) || has_collinear_triple(&sample_dst) {
                continue;
            }
            let Some(matrix) = dlt_homography(&sample_src, &sample_dst) else {
                continue;
            };
            let (count, _) = score(&matrix, src, dst, threshold_sq);
            if count >= 4 && best.map_or(true, |(best_count, _)| count > best_count) {
                best = Some((count, matrix));
                if count == n {
                    break;
                }
            }
        }

        let (_, matrix) = best?;
        let (_, mask) = score(&matrix, src, dst, threshold_sq);
        let inlier_src: Vec<[f64; 2]> =
            src.iter().zip(&mask).filter(|(_, &m)| m).map(|(p, _)| *p).collect();
        let inlier_dst: Vec<[f64; 2]> =
            dst.iter().zip(&mask).filter(|(_, &m)| m).map(|(p, _)| *p).collect();
        let refined = dlt_homography(&inlier_src, &inlier_dst).unwrap_or(matrix);
        let (_, inliers) = score(&refined, src, dst, threshold_sq);
        Some(Homography { matrix: refined, inliers })
    }
}

/// Applies `h` to a point. A vanishing homogeneous coordinate yields a
/// non-finite result, which callers must check.
pub fn project_point(h: &Matrix3<f64>, point: [f64; 2]) -> [f64; 2] {
    let v = h * Vector3::new(point[0], point[1], 1.0);
    [v[0] / v[2], v[1] / v[2]]
}

fn score(h: &Matrix3<f64>, src: &[[f64; 2]], dst: &[[f64; 2]], threshold_sq: f64) -> (usize, Vec<bool>) {
    let mut mask = vec![false; src.len()];
    let mut count = 0;
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let p = project_point(h, *s);
        let error = (p[0] - d[0]).powi(2) + (p[1] - d[1]).powi(2);
        if error.is_finite() && error <= threshold_sq {
            mask[i] = true;
            count += 1;
        }
    }
    (count, mask)
}

fn has_collinear_triple(points: &[[f64; 2]]) -> bool {
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            for k in j + 1..points.len() {
                let [ax, ay] = points[i];
                let [bx, by] = points[j];
                let [cx, cy] = points[k];
                let area = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
                if area.abs() < 1e-6 {
                    return true;
                }
            }
        }
    }
    false
}

/// Direct linear transform over normalized coordinates (Hartley).
fn dlt_homography(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    if src.len() < 4 || src.len() != dst.len() {
        return None;
    }
    let (src_norm, t_src) = normalize_points(src)?;
    let (dst_norm, t_dst) = normalize_points(dst)?;

    let mut a = DMatrix::<f64>::zeros(2 * src.len(), 9);
    for (i, (s, d)) in src_norm.iter().zip(&dst_norm).enumerate() {
        let [x, y] = *s;
        let [u, v] = *d;
        let r = 2 * i;
        a[(r, 0)] = -x;
        a[(r, 1)] = -y;
        a[(r, 2)] = -1.0;
        a[(r, 6)] = u * x;
        a[(r, 7)] = u * y;
        a[(r, 8)] = u;
        a[(r + 1, 3)] = -x;
        a[(r + 1, 4)] = -y;
        a[(r + 1, 5)] = -1.0;
        a[(r + 1, 6)] = v * x;
        a[(r + 1, 7)] = v * y;
        a[(r + 1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let h = v_t.row(v_t.nrows() - 1);
    let normalized = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst.try_inverse()?;
    let mut matrix = t_dst_inv * normalized * t_src;
    let scale = matrix[(2, 2)];
    if scale.abs() > 1e-12 {
        matrix /= scale;
    }
    matrix.iter().all(|v| v.is_finite()).then_some(matrix)
}

/// Translates the centroid to the origin and scales the mean distance to
/// sqrt(2). Returns `None` for coincident points.
fn normalize_points(points: &[[f64; 2]]) -> Option<(Vec<[f64; 2]>, Matrix3<f64>)> {
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let my = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - mx).powi(2) + (p[1] - my).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist <= 1e-12 {
        return None;
    }
    let scale = std::f64::consts::SQRT_2 / mean_dist;
    let transform = Matrix3::new(scale, 0.0, -scale * mx, 0.0, scale, -scale * my, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| [scale * (p[0] - mx), scale * (p[1] - my)])
        .collect();
    Some((normalized, transform))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<[f64; 2]> {
        (0..count).map(|i| [(i % 5) as f64 * 20.0, (i / 5) as f64 * 15.0]).collect()
    }

    fn translate(points: &[[f64; 2]], dx: f64, dy: f64) -> Vec<[f64; 2]> {
        points.iter().map(|p| [p[0] + dx, p[1] + dy]).collect()
    }

    #[test]
    fn recovers_translation() {
        let src = grid(20);
        let dst = translate(&src, 10.0, -7.0);
        let estimator = RansacHomography { reproj_threshold: 3.0, max_iters: 500 };

        let homography = estimator.estimate(&src, &dst).unwrap();
        assert_eq!(homography.inlier_count(), 20);
        let p = project_point(&homography.matrix, [40.0, 30.0]);
        assert!((p[0] - 50.0).abs() < 1e-6);
        assert!((p[1] - 23.0).abs() < 1e-6);
    }

    #[test]
    fn masks_out_outliers() {
        let src = grid(20);
        let mut dst = translate(&src, 5.0, 5.0);
        // corrupt the last four correspondences
        for (i, point) in dst.iter_mut().enumerate().skip(16) {
            point[0] += 300.0 + i as f64 * 17.0;
            point[1] -= 200.0;
        }
        let estimator = RansacHomography { reproj_threshold: 3.0, max_iters: 1000 };

        let homography = estimator.estimate(&src, &dst).unwrap();
        assert_eq!(homography.inlier_count(), 16);
        assert!(homography.inliers[..16].iter().all(|&m| m));
        assert!(homography.inliers[16..].iter().all(|&m| !m));
    }

    #[test]
    fn collinear_points_have_no_solution() {
        let src: Vec<[f64; 2]> = (0..12).map(|i| [i as f64, 2.0 * i as f64 + 1.0]).collect();
        let dst = translate(&src, 4.0, 4.0);
        let estimator = RansacHomography { reproj_threshold: 3.0, max_iters: 200 };
        assert!(estimator.estimate(&src, &dst).is_none());
    }

    #[test]
    fn too_few_points_have_no_solution() {
        let src = grid(3);
        let dst = translate(&src, 1.0, 1.0);
        let estimator = RansacHomography { reproj_threshold: 3.0, max_iters: 200 };
        assert!(estimator.estimate(&src, &dst).is_none());
    }

    #[test]
    fn projection_through_degenerate_transform_is_non_finite() {
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let p = project_point(&h, [3.0, 4.0]);
        assert!(!p[0].is_finite() || !p[1].is_finite());
    }
}
