//! CLUT interpolation
//!
//! Both interpolators operate on a flat CLUT in row-major order: the first
//! input dimension varies slowest and the output channels are interleaved
//! at the innermost position.

/// Tetrahedral interpolation in a 3D CLUT with a uniform grid.
///
/// The cube around the sample point is split into six tetrahedra selected
/// by the ordering of the fractional coordinates; the result is the
/// barycentric combination of four of the eight cube corners. Inputs are
/// in [0, 1]; `grid_size` is the number of grid points per dimension.
pub fn tetrahedral_interp_3d(
    clut: &[f64],
    grid_size: usize,
    out_channels: usize,
    r: f64,
    g: f64,
    b: f64,
) -> Vec<f64> {
    if grid_size < 2 {
        let mut out = vec![0.0; out_channels];
        if clut.len() >= out_channels {
            out.copy_from_slice(&clut[..out_channels]);
        }
        return out;
    }

    // scale to grid coordinates
    let scale = (grid_size - 1) as f64;
    let r_pos = r * scale;
    let g_pos = g * scale;
    let b_pos = b * scale;

    // integer cube corner, clamped so the +1 neighbour stays in range
    let ri = (r_pos as usize).min(grid_size - 2);
    let gi = (g_pos as usize).min(grid_size - 2);
    let bi = (b_pos as usize).min(grid_size - 2);

    let fr = (r_pos - ri as f64).clamp(0.0, 1.0);
    let fg = (g_pos - gi as f64).clamp(0.0, 1.0);
    let fb = (b_pos - bi as f64).clamp(0.0, 1.0);

    let stride = out_channels;
    let g_stride = grid_size * stride;
    let r_stride = grid_size * g_stride;

    let base = ri * r_stride + gi * g_stride + bi * stride;

    let c000 = base;
    let c001 = base + stride;
    let c010 = base + g_stride;
    let c011 = base + g_stride + stride;
    let c100 = base + r_stride;
    let c101 = base + r_stride + stride;
    let c110 = base + r_stride + g_stride;
    let c111 = base + r_stride + g_stride + stride;

    let at = |idx: usize| clut.get(idx).copied().unwrap_or(0.0);

    let mut out = vec![0.0; out_channels];

    if fr > fg {
        if fg > fb {
            // fr > fg > fb
            for i in 0..out_channels {
                out[i] = (1.0 - fr) * at(c000 + i)
                    + (fr - fg) * at(c100 + i)
                    + (fg - fb) * at(c110 + i)
                    + fb * at(c111 + i);
            }
        } else if fr > fb {
            // fr > fb >= fg
            for i in 0..out_channels {
                out[i] = (1.0 - fr) * at(c000 + i)
                    + (fr - fb) * at(c100 + i)
                    + (fb - fg) * at(c101 + i)
                    + fg * at(c111 + i);
            }
        } else {
            // fb >= fr > fg
            for i in 0..out_channels {
                out[i] = (1.0 - fb) * at(c000 + i)
                    + (fb - fr) * at(c001 + i)
                    + (fr - fg) * at(c101 + i)
                    + fg * at(c111 + i);
            }
        }
    } else if fr > fb {
        // fg >= fr > fb
        for i in 0..out_channels {
            out[i] = (1.0 - fg) * at(c000 + i)
                + (fg - fr) * at(c010 + i)
                + (fr - fb) * at(c110 + i)
                + fb * at(c111 + i);
        }
    } else if fg > fb {
        // fg > fb >= fr
        for i in 0..out_channels {
            out[i] = (1.0 - fg) * at(c000 + i)
                + (fg - fb) * at(c010 + i)
                + (fb - fr) * at(c011 + i)
                + fr * at(c111 + i);
        }
    } else {
        // fb >= fg >= fr
        for i in 0..out_channels {
            out[i] = (1.0 - fb) * at(c000 + i)
                + (fb - fg) * at(c001 + i)
                + (fg - fr) * at(c011 + i)
                + fr * at(c111 + i);
        }
    }

    out
}

/// n-dimensional multilinear interpolation over a packed CLUT.
///
/// All 2^n corners of the enclosing hypercube contribute, weighted by the
/// product of `frac[d]` or `1 - frac[d]` per dimension. `grid_points`
/// holds the grid size of each dimension; inputs are in [0, 1].
pub fn multilinear_interp(
    clut: &[f64],
    grid_points: &[usize],
    out_channels: usize,
    input: &[f64],
) -> Vec<f64> {
    let n_dims = grid_points.len();
    if n_dims == 0 || input.len() != n_dims {
        return vec![0.0; out_channels];
    }

    // strides, innermost dimension varying fastest
    let mut strides = vec![0usize; n_dims];
    let mut stride = out_channels;
    for i in (0..n_dims).rev() {
        strides[i] = stride;
        stride *= grid_points[i];
    }

    // grid positions and fractions
    let mut indices = vec![0usize; n_dims];
    let mut fracs = vec![0.0f64; n_dims];
    for i in 0..n_dims {
        let scale = (grid_points[i].saturating_sub(1)) as f64;
        let pos = input[i] * scale;
        let mut idx = pos.max(0.0) as usize;
        if idx + 1 >= grid_points[i] {
            idx = grid_points[i].saturating_sub(2);
        }
        indices[i] = idx;
        fracs[i] = (pos - idx as f64).clamp(0.0, 1.0);
    }

    let mut base_offset = 0usize;
    for d in 0..n_dims {
        base_offset += indices[d] * strides[d];
    }

    let num_corners = 1usize << n_dims;
    let mut out = vec![0.0; out_channels];

    for corner in 0..num_corners {
        let mut offset = 0usize;
        let mut weight = 1.0f64;
        for d in 0..n_dims {
            if corner & (1 << d) != 0 {
                offset += strides[d];
                weight *= fracs[d];
            } else {
                weight *= 1.0 - fracs[d];
            }
        }

        for i in 0..out_channels {
            let idx = base_offset + offset + i;
            if idx < clut.len() {
                out[i] += weight * clut[idx];
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_clut_3d(grid: usize) -> Vec<f64> {
        let mut clut = vec![0.0; grid * grid * grid * 3];
        for r in 0..grid {
            for g in 0..grid {
                for b in 0..grid {
                    let idx = ((r * grid + g) * grid + b) * 3;
                    clut[idx] = r as f64 / (grid - 1) as f64;
                    clut[idx + 1] = g as f64 / (grid - 1) as f64;
                    clut[idx + 2] = b as f64 / (grid - 1) as f64;
                }
            }
        }
        clut
    }

    #[test]
    fn tetrahedral_identity() {
        let clut = identity_clut_3d(2);

        let inputs = [
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.5, 0.5, 0.5],
            [0.25, 0.75, 0.5],
        ];
        for input in inputs {
            let out = tetrahedral_interp_3d(&clut, 2, 3, input[0], input[1], input[2]);
            for i in 0..3 {
                assert!(
                    (out[i] - input[i]).abs() < 0.01,
                    "tetrahedral({:?}) = {:?}",
                    input,
                    out
                );
            }
        }
    }

    #[test]
    fn multilinear_identity() {
        let clut = identity_clut_3d(3);
        let grid = [3usize, 3, 3];

        let inputs = [
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.5, 0.5, 0.5],
            [0.25, 0.75, 0.5],
        ];
        for input in inputs {
            let out = multilinear_interp(&clut, &grid, 3, &input);
            for i in 0..3 {
                assert!(
                    (out[i] - input[i]).abs() < 0.01,
                    "multilinear({:?}) = {:?}",
                    input,
                    out
                );
            }
        }
    }

    #[test]
    fn tetrahedral_agrees_with_multilinear_on_identity() {
        let grid = 5usize;
        let clut = identity_clut_3d(grid);
        let dims = [grid, grid, grid];

        let inputs = [
            [0.1, 0.2, 0.3],
            [0.7, 0.3, 0.9],
            [0.33, 0.33, 0.34],
            [0.99, 0.01, 0.5],
        ];
        for input in inputs {
            let tet = tetrahedral_interp_3d(&clut, grid, 3, input[0], input[1], input[2]);
            let lin = multilinear_interp(&clut, &dims, 3, &input);
            for i in 0..3 {
                assert!(
                    (tet[i] - lin[i]).abs() < 1e-6,
                    "interpolators disagree at {:?}: {:?} vs {:?}",
                    input,
                    tet,
                    lin
                );
            }
        }
    }

    #[test]
    fn degenerate_grid_returns_first_node() {
        let clut = [0.25, 0.5, 0.75];
        let out = tetrahedral_interp_3d(&clut, 1, 3, 0.9, 0.9, 0.9);
        assert_eq!(out, vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn multilinear_arity_mismatch_is_zero() {
        let clut = identity_clut_3d(2);
        let out = multilinear_interp(&clut, &[2, 2, 2], 3, &[0.5, 0.5]);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }
}
