//! The state-dependent convective (advection) term.
//!
//! Momentum advection couples each velocity component to the others through
//! face-averaged velocities. For a momentum equation `m` transported along
//! `axis`, the advecting component is interpolated onto the face where `m`
//! lives: when `axis` is `m`'s own axis this is the already-computed face
//! average of `m` itself; otherwise it's a forward average of the advecting
//! component along `m`'s own axis, sampled at the owning cell for the plus
//! face and at `axis`'s backward neighbour for the minus face. That
//! cross-stagger averaging is what makes the two velocities share exactly
//! the control-volume face the flux crosses, and is what makes the
//! nonlinear-only residual carry no self-coupling on its diagonal for a
//! divergence-free state.
//!
//! The residual contribution along one axis is `flux_plus * m_plus -
//! flux_minus * m_minus`, where `flux_{plus,minus}` are the interpolated
//! advecting values above and `m_{plus,minus}` are `m`'s own face averages
//! (hence linear in the state). The Jacobian follows the product rule
//! `d(uv) = u·dv + v·du` exactly: because the whole nonlinear residual is
//! homogeneous of degree 2 in the state, its exact Jacobian satisfies
//! `J(x)·x == 2·F(x)` (Euler's identity for homogeneous functions) — the
//! shortcut Newton's method exploits for quadratic nonlinearities.

use tf_grid::GridMetrics;
use tf_stencil::StencilTensor;
use tf_stencil::VariableLayout;

/// Flat-state accessor matching the row-major `(k, j, i, d)` layout used
/// throughout this crate: `d + i*dof + j*dof*nx + k*dof*nx*ny`.
pub fn state_index(grid: &GridMetrics, dof: usize, i: usize, j: usize, k: usize, d: usize) -> usize {
    d + i * dof + j * dof * grid.nx + k * dof * grid.nx * grid.ny
}

fn cell_value(state: &[f64], grid: &GridMetrics, dof: usize, comp: usize, i: usize, j: usize, k: usize) -> f64 {
    state[state_index(grid, dof, i, j, k, comp)]
}

fn axis_len(grid: &GridMetrics, axis: usize) -> usize {
    match axis {
        0 => grid.nx,
        1 => grid.ny,
        _ => grid.nz,
    }
}

fn axis_idx(i: usize, j: usize, k: usize, axis: usize) -> usize {
    match axis {
        0 => i,
        1 => j,
        _ => k,
    }
}

fn neighbor(i: usize, j: usize, k: usize, axis: usize, delta: isize) -> Option<(usize, usize, usize)> {
    let mut idx = [i as isize, j as isize, k as isize];
    idx[axis] += delta;
    if idx[axis] < 0 {
        return None;
    }
    Some((idx[0] as usize, idx[1] as usize, idx[2] as usize))
}

/// `(center_weight, minus_weight)` for the backward (minus-side) face
/// average: `0.5` for each term that actually exists within the domain,
/// `0.0` for the one that would reach past the boundary.
fn backward_weights(n: usize, idx: usize) -> (f64, f64) {
    let center = if idx < n - 1 { 0.5 } else { 0.0 };
    let minus = if idx > 0 { 0.5 } else { 0.0 };
    (center, minus)
}

/// `(center_weight, plus_weight)` for the forward (plus-side) face average.
fn forward_weights(n: usize, idx: usize) -> (f64, f64) {
    let center = if idx > 0 { 0.5 } else { 0.0 };
    let plus = if idx < n - 1 { 0.5 } else { 0.0 };
    (center, plus)
}

fn face_value(
    state: &[f64],
    grid: &GridMetrics,
    dof: usize,
    comp: usize,
    axis: usize,
    i: usize,
    j: usize,
    k: usize,
    center_w: f64,
    side_w: f64,
    delta: isize,
) -> f64 {
    let mut v = center_w * cell_value(state, grid, dof, comp, i, j, k);
    if side_w != 0.0 {
        if let Some((ni, nj, nk)) = neighbor(i, j, k, axis, delta) {
            v += side_w * cell_value(state, grid, dof, comp, ni, nj, nk);
        }
    }
    v
}

/// Average of the dof-`comp` state value at this cell and its neighbour one
/// step back along `axis`, zero outside the domain on either end (matches
/// the reference suite's `backward_average_x`).
pub fn backward_average(state: &[f64], grid: &GridMetrics, dof: usize, comp: usize, axis: usize, i: usize, j: usize, k: usize) -> f64 {
    let (cw, mw) = backward_weights(axis_len(grid, axis), axis_idx(i, j, k, axis));
    face_value(state, grid, dof, comp, axis, i, j, k, cw, mw, -1)
}

/// Average of the dof-`comp` state value at this cell and its neighbour one
/// step forward along `axis`.
pub fn forward_average(state: &[f64], grid: &GridMetrics, dof: usize, comp: usize, axis: usize, i: usize, j: usize, k: usize) -> f64 {
    let (cw, pw) = forward_weights(axis_len(grid, axis), axis_idx(i, j, k, axis));
    face_value(state, grid, dof, comp, axis, i, j, k, cw, pw, 1)
}

fn transverse_area(grid: &GridMetrics, axis: usize, i: usize, j: usize, k: usize) -> f64 {
    let x = |idx: isize| grid.x.get(idx);
    let y = |idx: isize| grid.y.get(idx);
    let z = |idx: isize| grid.z.get(idx);
    match axis {
        0 => (y(j as isize) - y(j as isize - 1)) * (z(k as isize) - z(k as isize - 1)),
        1 => (x(i as isize) - x(i as isize - 1)) * (z(k as isize) - z(k as isize - 1)),
        _ => (x(i as isize) - x(i as isize - 1)) * (y(j as isize) - y(j as isize - 1)),
    }
}

fn offsets_for_axis(axis: usize) -> ((usize, usize, usize), (usize, usize, usize)) {
    let mut minus = [1usize, 1, 1];
    let mut plus = [1usize, 1, 1];
    minus[axis] = 0;
    plus[axis] = 2;
    ((minus[0], minus[1], minus[2]), (plus[0], plus[1], plus[2]))
}

/// Stencil offset, relative to the owning cell, produced by shifting along
/// each `(axis, delta)` pair in turn (`delta` one of `-1, 0, 1`).
fn rel_offset(shifts: &[(usize, isize)]) -> (usize, usize, usize) {
    let mut off = [1i32; 3];
    for &(axis, delta) in shifts {
        off[axis] += delta as i32;
    }
    (off[0] as usize, off[1] as usize, off[2] as usize)
}

/// Builds the convective contribution for every velocity momentum equation.
///
/// Returns `(atom_j, atom_f)`: `atom_j` is the operator to assemble into the
/// Newton Jacobian, `atom_f` the one to assemble into the residual.
pub fn nonlinear_part(grid: &GridMetrics, layout: VariableLayout, state: &[f64]) -> (StencilTensor, StencilTensor) {
    let dof = layout.dof();
    let mut atom_j = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    let mut atom_f = StencilTensor::zeros(grid.nx, grid.ny, grid.nz, dof);
    let velocities = layout.velocity_slots();

    for &m in &velocities {
        // `m`'s own axis: the direction it is face-centred along.
        let dm = m;
        for axis in 0..layout.dim() {
            let advecting = velocities[axis];
            for i in 0..grid.nx {
                for j in 0..grid.ny {
                    for k in 0..grid.nz {
                        let n = axis_len(grid, axis);
                        let idx = axis_idx(i, j, k, axis);
                        let area = transverse_area(grid, axis, i, j, k);

                        let (m_bw_c, m_bw_s) = backward_weights(n, idx);
                        let (m_fw_c, m_fw_s) = forward_weights(n, idx);

                        let m_minus = m_bw_c * cell_value(state, grid, dof, m, i, j, k)
                            + m_bw_s * neighbor(i, j, k, axis, -1).map_or(0.0, |(a, b, c)| cell_value(state, grid, dof, m, a, b, c));
                        let m_plus = m_fw_c * cell_value(state, grid, dof, m, i, j, k)
                            + m_fw_s * neighbor(i, j, k, axis, 1).map_or(0.0, |(a, b, c)| cell_value(state, grid, dof, m, a, b, c));

                        let ((msx, msy, msz), (psx, psy, psz)) = offsets_for_axis(axis);
                        let half_area = 0.5 * area;

                        if axis == dm {
                            // Self-transport: the advecting component is `m`
                            // itself, already face-averaged along its own
                            // axis above — unchanged from the original
                            // (already-correct) self-advection formula.
                            let flux_minus = half_area * m_minus;
                            let flux_plus = half_area * m_plus;

                            atom_f.add(i, j, k, m, m, 1, 1, 1, flux_plus * m_fw_c - flux_minus * m_bw_c);
                            atom_f.add(i, j, k, m, m, psx, psy, psz, flux_plus * m_fw_s);
                            atom_f.add(i, j, k, m, m, msx, msy, msz, -flux_minus * m_bw_s);

                            atom_j.add(i, j, k, m, m, 1, 1, 1, flux_plus * m_fw_c - flux_minus * m_bw_c);
                            atom_j.add(i, j, k, m, m, psx, psy, psz, flux_plus * m_fw_s);
                            atom_j.add(i, j, k, m, m, msx, msy, msz, -flux_minus * m_bw_s);

                            atom_j.add(i, j, k, m, m, 1, 1, 1, half_area * (m_plus * m_fw_c - m_minus * m_bw_c));
                            atom_j.add(i, j, k, m, m, psx, psy, psz, half_area * m_plus * m_fw_s);
                            atom_j.add(i, j, k, m, m, msx, msy, msz, -half_area * m_minus * m_bw_s);
                        } else {
                            // Cross transport: the advecting velocity is
                            // interpolated onto the face where `m` lives by
                            // averaging it forward along `m`'s own axis —
                            // not along the transport axis — and the plus
                            // and minus faces are sampled at two different
                            // base cells (the plus face at this cell, the
                            // minus face at this cell's transport-axis
                            // neighbour), matching the staggered layout's
                            // shared-face convention. If the minus-side base
                            // cell falls outside the domain the whole minus
                            // flux vanishes; the boundary row is overwritten
                            // by the boundary-condition pass regardless.
                            let (a_fw_c, a_fw_s) = forward_weights(axis_len(grid, dm), axis_idx(i, j, k, dm));

                            let advecting_plus = a_fw_c * cell_value(state, grid, dof, advecting, i, j, k)
                                + a_fw_s * neighbor(i, j, k, dm, 1).map_or(0.0, |(a, b, c)| cell_value(state, grid, dof, advecting, a, b, c));

                            let minus_base = neighbor(i, j, k, axis, -1);
                            let advecting_minus = minus_base.map_or(0.0, |(bi, bj, bk)| {
                                a_fw_c * cell_value(state, grid, dof, advecting, bi, bj, bk)
                                    + a_fw_s * neighbor(bi, bj, bk, dm, 1).map_or(0.0, |(a, b, c)| cell_value(state, grid, dof, advecting, a, b, c))
                            });

                            let flux_plus = half_area * advecting_plus;
                            let flux_minus = half_area * advecting_minus;

                            // Residual: flux_plus * m_plus - flux_minus * m_minus,
                            // expanded over the (center, neighbour) supports of
                            // `m`'s own face average.
                            atom_f.add(i, j, k, m, m, 1, 1, 1, flux_plus * m_fw_c - flux_minus * m_bw_c);
                            atom_f.add(i, j, k, m, m, psx, psy, psz, flux_plus * m_fw_s);
                            atom_f.add(i, j, k, m, m, msx, msy, msz, -flux_minus * m_bw_s);

                            // Jacobian, "advecting * dm" summand: identical support/coefficients to F.
                            atom_j.add(i, j, k, m, m, 1, 1, 1, flux_plus * m_fw_c - flux_minus * m_bw_c);
                            atom_j.add(i, j, k, m, m, psx, psy, psz, flux_plus * m_fw_s);
                            atom_j.add(i, j, k, m, m, msx, msy, msz, -flux_minus * m_bw_s);

                            // Jacobian, "m * d(advecting)" summand: distributes
                            // across the up-to-four support points the two
                            // (plus-face, minus-face) advecting averages touch.
                            let p1 = rel_offset(&[]);
                            let p2 = rel_offset(&[(dm, 1)]);
                            atom_j.add(i, j, k, m, advecting, p1.0, p1.1, p1.2, half_area * m_plus * a_fw_c);
                            atom_j.add(i, j, k, m, advecting, p2.0, p2.1, p2.2, half_area * m_plus * a_fw_s);

                            if minus_base.is_some() {
                                let p3 = rel_offset(&[(axis, -1)]);
                                let p4 = rel_offset(&[(axis, -1), (dm, 1)]);
                                atom_j.add(i, j, k, m, advecting, p3.0, p3.1, p3.2, -half_area * m_minus * a_fw_c);
                                atom_j.add(i, j, k, m, advecting, p4.0, p4.1, p4.2, -half_area * m_minus * a_fw_s);
                            }
                        }
                    }
                }
            }
        }
    }

    (atom_j, atom_f)
}
