//! The state-independent linear part of the discretization: diffusion of
//! each velocity component and (optionally) temperature, plus the
//! pressure-gradient and velocity-divergence operators.
//!
//! Every operator here touches only a single row/column dof pair; the
//! nonlinear convective terms live in [`crate::convective`].

use tf_grid::GridMetrics;
use tf_stencil::StencilTensor;

fn coord(grid: &GridMetrics, axis: usize, idx: isize) -> f64 {
    match axis {
        0 => grid.x.get(idx),
        1 => grid.y.get(idx),
        _ => grid.z.get(idx),
    }
}

fn axis_index(axis: usize, i: usize, j: usize, k: usize) -> isize {
    match axis {
        0 => i as isize,
        1 => j as isize,
        _ => k as isize,
    }
}

/// The axis not named by `a` or `b` (0, 1, 2 sum to 3).
fn third_axis(a: usize, b: usize) -> usize {
    3 - a - b
}

/// Width of one cell along `axis` at logical index `idx`: the plain
/// one-sided cell width if `idx` is not `d`'s own staggered location along
/// this axis, or the width centred on `idx` when it is.
fn transverse_width(grid: &GridMetrics, axis: usize, idx: isize, centered: bool) -> f64 {
    if centered {
        (coord(grid, axis, idx + 1) - coord(grid, axis, idx - 1)) / 2.0
    } else {
        coord(grid, axis, idx) - coord(grid, axis, idx - 1)
    }
}

/// Diffusion of dof `d` along `diff_axis`.
///
/// `comp_axis` is the axis `d` is staggered along (`Some(0)` for `u`,
/// `Some(1)` for `v`, `Some(2)` for `w`, `None` for `T`/`p`, which live at
/// the plain cell centre in every direction). The neighbour distance along
/// `diff_axis` is a one-sided spacing when `diff_axis` is `d`'s own axis,
/// and a centred spacing otherwise; each transverse cell width is centred
/// exactly when that transverse axis is `d`'s own axis. This mirrors the
/// reference discretization's distinction between "own-axis" stencils
/// (`u_xx`, `v_yy`, `w_zz`) and the rest.
fn diffusion_along(
    grid: &GridMetrics,
    dof: usize,
    d: usize,
    diff_axis: usize,
    comp_axis: Option<usize>,
) -> StencilTensor {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let other_a = (diff_axis + 1) % 3;
    let other_b = third_axis(diff_axis, other_a);
    let diff_is_own = comp_axis == Some(diff_axis);
    let mut atom = StencilTensor::zeros(nx, ny, nz, dof);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let own_idx = axis_index(diff_axis, i, j, k);
                let a_idx = axis_index(other_a, i, j, k);
                let b_idx = axis_index(other_b, i, j, k);
                let width_a = transverse_width(grid, other_a, a_idx, comp_axis == Some(other_a));
                let width_b = transverse_width(grid, other_b, b_idx, comp_axis == Some(other_b));
                let area = width_a * width_b;
                let (dm, dp) = if diff_is_own {
                    (
                        coord(grid, diff_axis, own_idx) - coord(grid, diff_axis, own_idx - 1),
                        coord(grid, diff_axis, own_idx + 1) - coord(grid, diff_axis, own_idx),
                    )
                } else {
                    (
                        (coord(grid, diff_axis, own_idx) - coord(grid, diff_axis, own_idx - 2)) / 2.0,
                        (coord(grid, diff_axis, own_idx + 1) - coord(grid, diff_axis, own_idx - 1)) / 2.0,
                    )
                };
                let c_minus = area / dm;
                let c_plus = area / dp;
                let mut minus = [1usize, 1, 1];
                let mut plus = [1usize, 1, 1];
                minus[diff_axis] = 0;
                plus[diff_axis] = 2;
                atom.set(i, j, k, d, d, minus[0], minus[1], minus[2], c_minus);
                atom.set(i, j, k, d, d, plus[0], plus[1], plus[2], c_plus);
                atom.add(i, j, k, d, d, 1, 1, 1, -(c_minus + c_plus));
            }
        }
    }
    atom
}

pub fn u_xx(grid: &GridMetrics, dof: usize, u: usize) -> StencilTensor {
    diffusion_along(grid, dof, u, 0, Some(0))
}
pub fn v_yy(grid: &GridMetrics, dof: usize, v: usize) -> StencilTensor {
    diffusion_along(grid, dof, v, 1, Some(1))
}
pub fn w_zz(grid: &GridMetrics, dof: usize, w: usize) -> StencilTensor {
    diffusion_along(grid, dof, w, 2, Some(2))
}

pub fn u_yy(grid: &GridMetrics, dof: usize, u: usize) -> StencilTensor {
    diffusion_along(grid, dof, u, 1, Some(0))
}
pub fn u_zz(grid: &GridMetrics, dof: usize, u: usize) -> StencilTensor {
    diffusion_along(grid, dof, u, 2, Some(0))
}
pub fn v_xx(grid: &GridMetrics, dof: usize, v: usize) -> StencilTensor {
    diffusion_along(grid, dof, v, 0, Some(1))
}
pub fn v_zz(grid: &GridMetrics, dof: usize, v: usize) -> StencilTensor {
    diffusion_along(grid, dof, v, 2, Some(1))
}
pub fn w_xx(grid: &GridMetrics, dof: usize, w: usize) -> StencilTensor {
    diffusion_along(grid, dof, w, 0, Some(2))
}
pub fn w_yy(grid: &GridMetrics, dof: usize, w: usize) -> StencilTensor {
    diffusion_along(grid, dof, w, 1, Some(2))
}

pub fn t_xx(grid: &GridMetrics, dof: usize, t: usize) -> StencilTensor {
    diffusion_along(grid, dof, t, 0, None)
}
pub fn t_yy(grid: &GridMetrics, dof: usize, t: usize) -> StencilTensor {
    diffusion_along(grid, dof, t, 1, None)
}
pub fn t_zz(grid: &GridMetrics, dof: usize, t: usize) -> StencilTensor {
    diffusion_along(grid, dof, t, 2, None)
}

/// Pressure gradient along `x` into the `u` momentum equation: `-dy*dz` at
/// the cell itself, `+dy*dz` one cell east.
pub fn p_x(grid: &GridMetrics, dof: usize, u: usize, p: usize) -> StencilTensor {
    let mut atom = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    for i in 0..grid.nx {
        for j in 0..grid.ny {
            let dy = grid.y.get(j as isize) - grid.y.get(j as isize - 1);
            for k in 0..grid.nz {
                let dz = grid.z.get(k as isize) - grid.z.get(k as isize - 1);
                let area = dy * dz;
                atom.set(i, j, k, u, p, 1, 1, 1, -area);
                atom.set(i, j, k, u, p, 2, 1, 1, area);
            }
        }
    }
    atom
}

pub fn p_y(grid: &GridMetrics, dof: usize, v: usize, p: usize) -> StencilTensor {
    let mut atom = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    for i in 0..grid.nx {
        let dx = grid.x.get(i as isize) - grid.x.get(i as isize - 1);
        for j in 0..grid.ny {
            for k in 0..grid.nz {
                let dz = grid.z.get(k as isize) - grid.z.get(k as isize - 1);
                let area = dx * dz;
                atom.set(i, j, k, v, p, 1, 1, 1, -area);
                atom.set(i, j, k, v, p, 1, 2, 1, area);
            }
        }
    }
    atom
}

pub fn p_z(grid: &GridMetrics, dof: usize, w: usize, p: usize) -> StencilTensor {
    let mut atom = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    for i in 0..grid.nx {
        let dx = grid.x.get(i as isize) - grid.x.get(i as isize - 1);
        for j in 0..grid.ny {
            let dy = grid.y.get(j as isize) - grid.y.get(j as isize - 1);
            let area = dy * dx;
            for k in 0..grid.nz {
                atom.set(i, j, k, w, p, 1, 1, 1, -area);
                atom.set(i, j, k, w, p, 1, 1, 2, area);
            }
        }
    }
    atom
}

/// Velocity divergence into the continuity (pressure) equation, component
/// `u` along `x`: mirrors [`p_x`]'s stencil positions but transposed into
/// row `p`, column `u`, with the ghost neighbour on the *west* side instead
/// of east.
pub fn u_x(grid: &GridMetrics, dof: usize, p: usize, u: usize) -> StencilTensor {
    let mut atom = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    for i in 0..grid.nx {
        for j in 0..grid.ny {
            let dy = grid.y.get(j as isize) - grid.y.get(j as isize - 1);
            for k in 0..grid.nz {
                let dz = grid.z.get(k as isize) - grid.z.get(k as isize - 1);
                let area = dy * dz;
                atom.set(i, j, k, p, u, 0, 1, 1, -area);
                atom.set(i, j, k, p, u, 1, 1, 1, area);
            }
        }
    }
    atom
}

pub fn v_y(grid: &GridMetrics, dof: usize, p: usize, v: usize) -> StencilTensor {
    let mut atom = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    for i in 0..grid.nx {
        let dx = grid.x.get(i as isize) - grid.x.get(i as isize - 1);
        for j in 0..grid.ny {
            for k in 0..grid.nz {
                let dz = grid.z.get(k as isize) - grid.z.get(k as isize - 1);
                let area = dx * dz;
                atom.set(i, j, k, p, v, 1, 0, 1, -area);
                atom.set(i, j, k, p, v, 1, 1, 1, area);
            }
        }
    }
    atom
}

pub fn w_z(grid: &GridMetrics, dof: usize, p: usize, w: usize) -> StencilTensor {
    let mut atom = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    for i in 0..grid.nx {
        let dx = grid.x.get(i as isize) - grid.x.get(i as isize - 1);
        for j in 0..grid.ny {
            let dy = grid.y.get(j as isize) - grid.y.get(j as isize - 1);
            let area = dy * dx;
            for k in 0..grid.nz {
                atom.set(i, j, k, p, w, 1, 1, 0, -area);
                atom.set(i, j, k, p, w, 1, 1, 1, area);
            }
        }
    }
    atom
}
