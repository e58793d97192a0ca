//! Exact Euclidean distance transform.
//!
//! Separable two-pass algorithm (Felzenszwalb & Huttenlocher): each pass
//! computes the lower envelope of parabolas rooted at the samples of one
//! row or column. Spacing along each axis may differ, so distances come
//! out directly in map units.

/// Squared distance from every cell to the nearest seed.
///
/// `seeds` is row-major with `width * height` entries. Cells with no seed
/// anywhere in the grid get `f64::INFINITY`.
pub(crate) fn squared_distance(
    seeds: &[bool],
    width: usize,
    height: usize,
    dx: f64,
    dy: f64,
) -> Vec<f64> {
    let mut grid: Vec<f64> = seeds
        .iter()
        .map(|&s| if s { 0.0 } else { f64::INFINITY })
        .collect();

    let mut line = vec![0.0; height.max(width)];
    let mut out = vec![0.0; height.max(width)];

    // Columns
    for x in 0..width {
        for y in 0..height {
            line[y] = grid[y * width + x];
        }
        lower_envelope(&line[..height], dy, &mut out[..height]);
        for y in 0..height {
            grid[y * width + x] = out[y];
        }
    }

    // Rows
    for y in 0..height {
        let row = &mut grid[y * width..(y + 1) * width];
        line[..width].copy_from_slice(row);
        lower_envelope(&line[..width], dx, &mut out[..width]);
        row.copy_from_slice(&out[..width]);
    }

    grid
}

/// One-dimensional squared distance transform of `f` sampled every `spacing`.
fn lower_envelope(f: &[f64], spacing: f64, out: &mut [f64]) {
    let n = f.len();
    // Parabola roots and the boundaries between them
    let mut roots: Vec<usize> = Vec::with_capacity(n);
    let mut bounds: Vec<f64> = Vec::with_capacity(n + 1);

    for q in 0..n {
        if !f[q].is_finite() {
            continue;
        }
        let pq = q as f64 * spacing;
        loop {
            let Some(&r) = roots.last() else {
                roots.push(q);
                bounds.clear();
                bounds.push(f64::NEG_INFINITY);
                bounds.push(f64::INFINITY);
                break;
            };
            let pr = r as f64 * spacing;
            let s = ((f[q] + pq * pq) - (f[r] + pr * pr)) / (2.0 * (pq - pr));
            let k = roots.len() - 1;
            if s <= bounds[k] {
                roots.pop();
                bounds.pop();
                continue;
            }
            bounds[k + 1] = s;
            roots.push(q);
            bounds.push(f64::INFINITY);
            break;
        }
    }

    if roots.is_empty() {
        out.fill(f64::INFINITY);
        return;
    }

    let mut k = 0;
    for (p, slot) in out.iter_mut().enumerate() {
        let pp = p as f64 * spacing;
        while bounds[k + 1] < pp {
            k += 1;
        }
        let d = pp - roots[k] as f64 * spacing;
        *slot = d * d + f[roots[k]];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Brute-force reference.
    fn naive(seeds: &[bool], width: usize, height: usize, dx: f64, dy: f64) -> Vec<f64> {
        let mut out = vec![f64::INFINITY; width * height];
        for y in 0..height {
            for x in 0..width {
                for sy in 0..height {
                    for sx in 0..width {
                        if seeds[sy * width + sx] {
                            let ddx = (x as f64 - sx as f64) * dx;
                            let ddy = (y as f64 - sy as f64) * dy;
                            let d = ddx * ddx + ddy * ddy;
                            if d < out[y * width + x] {
                                out[y * width + x] = d;
                            }
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_single_seed() {
        let mut seeds = vec![false; 25];
        seeds[12] = true;
        let d = squared_distance(&seeds, 5, 5, 1.0, 1.0);
        assert_eq!(d[12], 0.0);
        assert_eq!(d[0], 8.0);
        assert_eq!(d[2], 4.0);
    }

    #[test]
    fn test_matches_brute_force_anisotropic() {
        let (w, h) = (9, 7);
        let seeds: Vec<bool> = (0..w * h).map(|i| i % 11 == 3 || i == 40).collect();
        let fast = squared_distance(&seeds, w, h, 2.0, 3.0);
        let slow = naive(&seeds, w, h, 2.0, 3.0);
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_no_seeds() {
        let d = squared_distance(&[false; 4], 2, 2, 1.0, 1.0);
        assert!(d.iter().all(|v| v.is_infinite()));
    }
}
