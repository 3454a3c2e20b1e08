//! In-place stencil rewriting for the six domain faces (east/west,
//! north/south, top/bottom) and the forcing vectors that absorb the
//! inhomogeneous part of each boundary condition.
//!
//! Every handler here operates on one face at a time and touches only the
//! stencil entries anchored at that face's boundary plane; faces never
//! interact with each other through this module (the overlap, if any, of
//! two walls meeting at an edge is resolved purely by application order,
//! matching the reference implementation's face-independent design).

use tf_grid::GridMetrics;
use tf_stencil::{Index8, StencilTensor, VariableLayout};

use crate::convective::state_index;
use crate::parameters::ProblemType;

/// One of the three coordinate axes a face is normal to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two axes other than `self`, in ascending order.
    fn transverse(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    fn extent(self, grid: &GridMetrics) -> usize {
        match self {
            Axis::X => grid.nx,
            Axis::Y => grid.ny,
            Axis::Z => grid.nz,
        }
    }
}

fn plane_sel(axis: Axis, idx: usize) -> Index8 {
    match axis {
        Axis::X => Index8::all().i(idx),
        Axis::Y => Index8::all().j(idx),
        Axis::Z => Index8::all().k(idx),
    }
}

fn with_offset(sel: Index8, axis: Axis, value: usize) -> Index8 {
    match axis {
        Axis::X => sel.sx(value),
        Axis::Y => sel.sy(value),
        Axis::Z => sel.sz(value),
    }
}

fn assemble_cell(axis: Axis, plane: usize, free_a: (Axis, usize), free_b: (Axis, usize)) -> (usize, usize, usize) {
    let mut cell = [0usize; 3];
    cell[axis.index()] = plane;
    cell[free_a.0.index()] = free_a.1;
    cell[free_b.0.index()] = free_b.1;
    (cell[0], cell[1], cell[2])
}

fn assemble_offsets(axis: Axis, axis_offset: usize, free_a: (Axis, usize), free_b: (Axis, usize)) -> (usize, usize, usize) {
    let mut off = [1usize; 3];
    off[axis.index()] = axis_offset;
    off[free_a.0.index()] = free_a.1;
    off[free_b.0.index()] = free_b.1;
    (off[0], off[1], off[2])
}

/// Folds `atom[.., d2, ghost_offset]` into `atom[.., d2, center_offset]`
/// scaled by `scale`, for every row and every column except `skip_dof` (if
/// given) — used to keep a velocity wall's reflection fold from imposing
/// its convention on a dof (temperature) whose own boundary condition is
/// handled by a separate call.
fn fold_ghost_into_center(atom: &mut StencilTensor, axis: Axis, plane: usize, ghost_offset: usize, center_offset: usize, scale: f64, skip_dof: Option<usize>) {
    let base = plane_sel(axis, plane);
    let center = with_offset(base, axis, center_offset);
    let ghost = with_offset(base, axis, ghost_offset);
    match skip_dof {
        None => atom.add_slice_scaled(center, ghost, scale),
        Some(skip) => {
            for d2 in 0..atom.dof() {
                if d2 == skip {
                    continue;
                }
                atom.add_slice_scaled(center.d2(d2), ghost.d2(d2), scale);
            }
        }
    }
}

/// Zeroes `atom[.., d2, offset]` for every column except `skip_dof`.
fn zero_offset_skipping(atom: &mut StencilTensor, sel: Index8, skip_dof: Option<usize>) {
    match skip_dof {
        None => atom.zero(sel),
        Some(skip) => {
            for d2 in 0..atom.dof() {
                if d2 == skip {
                    continue;
                }
                atom.zero(sel.d2(d2));
            }
        }
    }
}

/// Rewrites the stencil tensor in place for a face whose outward normal
/// points in the *positive* axis direction (east/north/top): the ghost
/// neighbour at offset 2 is folded into the centre, the normal-velocity row
/// at the boundary is replaced by an identity enforcing the wall value, and
/// any dependence on the now-eliminated ghost column is dropped.
///
/// `skip_dof`, when given, names a column (temperature) this fold must
/// leave untouched: that dof's own boundary condition is imposed by a later,
/// dedicated call, and the generic wall-reflection convention used here
/// does not necessarily apply to it.
fn dirichlet_positive_face(atom: &mut StencilTensor, axis: Axis, plane: usize, normal_dof: usize, skip_dof: Option<usize>) {
    let base = plane_sel(axis, plane);

    fold_ghost_into_center(atom, axis, plane, 2, 1, -1.0, skip_dof);

    // The folded-in normal-velocity column is now moot: zero it for every
    // equation row.
    atom.zero(with_offset(base, axis, 1).d2(normal_dof));

    // The normal-velocity equation itself is replaced by an identity.
    atom.zero(base.d1(normal_dof));
    zero_offset_skipping(atom, with_offset(base, axis, 2), skip_dof);
    atom.fill(
        base.d1(normal_dof).d2(normal_dof).sx(1).sy(1).sz(1),
        -1.0,
    );
}

/// Rewrites the stencil tensor in place for a face whose outward normal
/// points in the *negative* axis direction (west/south/bottom): there is no
/// normal-velocity degree of freedom sitting exactly on this face (it would
/// be indexed "-1", which does not exist in the staggered layout), so the
/// west ghost's contribution to the missing normal-velocity column is
/// simply dropped rather than folded, and no row is replaced by an
/// identity. `skip_dof` has the same meaning as in
/// [`dirichlet_positive_face`].
fn dirichlet_negative_face(atom: &mut StencilTensor, axis: Axis, plane: usize, normal_dof: usize, skip_dof: Option<usize>) {
    let base = plane_sel(axis, plane);

    atom.zero(with_offset(base, axis, 0).d2(normal_dof));

    fold_ghost_into_center(atom, axis, plane, 0, 1, -1.0, skip_dof);

    zero_offset_skipping(atom, with_offset(base, axis, 0), skip_dof);
}

/// Sum, over the two transverse stencil offsets, of `atom[cell, target,
/// target, axis_offset, *, *]` for every cell on the boundary plane —
/// exactly the ghost-column coefficient each dirichlet handler is about to
/// fold away. Used to compute the forcing contribution of a nonzero wall
/// value *before* that fold happens.
fn face_forcing(
    atom: &StencilTensor,
    grid: &GridMetrics,
    dof: usize,
    axis: Axis,
    plane: usize,
    axis_offset: usize,
    target: usize,
    value: f64,
) -> Vec<f64> {
    let mut forcing = vec![0.0; grid.nx * grid.ny * grid.nz * dof];
    let (fa, fb) = axis.transverse();
    for a in 0..fa.extent(grid) {
        for b in 0..fb.extent(grid) {
            let (i, j, k) = assemble_cell(axis, plane, (fa, a), (fb, b));
            let mut coeff = 0.0;
            for t1 in 0..3 {
                for t2 in 0..3 {
                    let (sx, sy, sz) = assemble_offsets(axis, axis_offset, (fa, t1), (fb, t2));
                    coeff += atom.get(i, j, k, target, target, sx, sy, sz);
                }
            }
            if coeff != 0.0 {
                forcing[state_index(grid, dof, i, j, k, target)] = value * coeff;
            }
        }
    }
    forcing
}

/// Handlers for every boundary condition a [`ProblemType`] can wire up,
/// operating against one grid/layout pair.
pub struct BoundaryConditions<'a> {
    grid: &'a GridMetrics,
    layout: VariableLayout,
}

impl<'a> BoundaryConditions<'a> {
    pub fn new(grid: &'a GridMetrics, layout: VariableLayout) -> Self {
        Self { grid, layout }
    }

    fn dof(&self) -> usize {
        self.layout.dof()
    }

    pub fn dirichlet_east(&self, atom: &mut StencilTensor) {
        dirichlet_positive_face(atom, Axis::X, self.grid.nx - 1, self.layout.u(), self.layout.t());
    }
    pub fn dirichlet_west(&self, atom: &mut StencilTensor) {
        dirichlet_negative_face(atom, Axis::X, 0, self.layout.u(), self.layout.t());
    }
    pub fn dirichlet_north(&self, atom: &mut StencilTensor) {
        dirichlet_positive_face(atom, Axis::Y, self.grid.ny - 1, self.layout.v(), self.layout.t());
    }
    pub fn dirichlet_south(&self, atom: &mut StencilTensor) {
        dirichlet_negative_face(atom, Axis::Y, 0, self.layout.v(), self.layout.t());
    }
    pub fn dirichlet_top(&self, atom: &mut StencilTensor) {
        let w = self.layout.w().expect("top/bottom faces require a 3D layout");
        dirichlet_positive_face(atom, Axis::Z, self.grid.nz - 1, w, self.layout.t());
    }
    pub fn dirichlet_bottom(&self, atom: &mut StencilTensor) {
        let w = self.layout.w().expect("top/bottom faces require a 3D layout");
        dirichlet_negative_face(atom, Axis::Z, 0, w, self.layout.t());
    }

    /// A no-slip wall moving tangentially in `u` with speed `velocity`:
    /// folds the stencil exactly as [`Self::dirichlet_north`], plus a
    /// forcing vector on the `u` rows along this face.
    pub fn moving_lid_north(&self, atom: &mut StencilTensor, velocity: f64) -> Vec<f64> {
        let plane = self.grid.ny - 1;
        let forcing = face_forcing(atom, self.grid, self.dof(), Axis::Y, plane, 2, self.layout.u(), 2.0 * velocity);
        self.dirichlet_north(atom);
        forcing
    }

    /// A no-slip wall moving tangentially in `u` and `v` with speed
    /// `velocity` (3D lid at the top face).
    pub fn moving_lid_top(&self, atom: &mut StencilTensor, velocity: f64) -> Vec<f64> {
        let plane = self.grid.nz - 1;
        let mut forcing = face_forcing(atom, self.grid, self.dof(), Axis::Z, plane, 2, self.layout.u(), 2.0 * velocity);
        let v_forcing = face_forcing(atom, self.grid, self.dof(), Axis::Z, plane, 2, self.layout.v(), 2.0 * velocity);
        for (f, v) in forcing.iter_mut().zip(v_forcing.iter()) {
            *f += v;
        }
        self.dirichlet_top(atom);
        forcing
    }

    /// `T_ghost + T_interior = 2 * wall_temp`: unlike the velocity walls,
    /// this folds into the *surviving* T diffusion equation rather than
    /// replacing it with an identity — T has no degree of freedom sitting
    /// exactly on the boundary plane the way a normal velocity does, so
    /// there is no row to pin.
    fn temperature_fold_face(&self, atom: &mut StencilTensor, axis: Axis, plane: usize, ghost_offset: usize, wall_temp: f64) -> Vec<f64> {
        let t = self.layout.t().expect("temperature faces require a layout with T");
        let forcing = face_forcing(atom, self.grid, self.dof(), axis, plane, ghost_offset, t, 2.0 * wall_temp);
        fold_ghost_into_center(atom, axis, plane, ghost_offset, 1, -1.0, None);
        atom.zero(with_offset(plane_sel(axis, plane), axis, ghost_offset));
        forcing
    }

    fn temperature_positive(&self, atom: &mut StencilTensor, axis: Axis, plane: usize, wall_temp: f64) -> Vec<f64> {
        self.temperature_fold_face(atom, axis, plane, 2, wall_temp)
    }

    fn temperature_negative(&self, atom: &mut StencilTensor, axis: Axis, plane: usize, wall_temp: f64) -> Vec<f64> {
        self.temperature_fold_face(atom, axis, plane, 0, wall_temp)
    }

    pub fn temperature_east(&self, atom: &mut StencilTensor, wall_temp: f64) -> Vec<f64> {
        self.temperature_positive(atom, Axis::X, self.grid.nx - 1, wall_temp)
    }
    pub fn temperature_west(&self, atom: &mut StencilTensor, wall_temp: f64) -> Vec<f64> {
        self.temperature_negative(atom, Axis::X, 0, wall_temp)
    }
    pub fn temperature_north(&self, atom: &mut StencilTensor, wall_temp: f64) -> Vec<f64> {
        self.temperature_positive(atom, Axis::Y, self.grid.ny - 1, wall_temp)
    }
    pub fn temperature_south(&self, atom: &mut StencilTensor, wall_temp: f64) -> Vec<f64> {
        self.temperature_negative(atom, Axis::Y, 0, wall_temp)
    }
    pub fn temperature_top(&self, atom: &mut StencilTensor, wall_temp: f64) -> Vec<f64> {
        self.temperature_positive(atom, Axis::Z, self.grid.nz - 1, wall_temp)
    }
    pub fn temperature_bottom(&self, atom: &mut StencilTensor, wall_temp: f64) -> Vec<f64> {
        self.temperature_negative(atom, Axis::Z, 0, wall_temp)
    }

    /// `T_ghost = T_interior + h * heatflux`: a genuine Neumann condition,
    /// so unlike the dirichlet/temperature handlers the `T` row is never
    /// replaced by an identity — it survives as the diffusion equation with
    /// the ghost folded in by *addition* instead of subtraction, and the
    /// ghost's pre-fold coefficient drives the forcing vector.
    fn heatflux_face(&self, atom: &mut StencilTensor, axis: Axis, plane: usize, ghost_offset: usize, h: f64, heatflux: f64) -> Vec<f64> {
        let t = self.layout.t().expect("heat-flux faces require a layout with T");
        let base = plane_sel(axis, plane);
        let forcing = face_forcing(atom, self.grid, self.dof(), axis, plane, ghost_offset, t, h * heatflux);

        let center = with_offset(base, axis, 1);
        let ghost = with_offset(base, axis, ghost_offset);
        atom.add_slice_scaled(center, ghost, 1.0);
        atom.zero(ghost);

        forcing
    }

    pub fn heatflux_east(&self, atom: &mut StencilTensor, heatflux: f64) -> Vec<f64> {
        let h = self.grid.x.dx(self.grid.nx as isize);
        self.heatflux_face(atom, Axis::X, self.grid.nx - 1, 2, h, heatflux)
    }
    pub fn heatflux_west(&self, atom: &mut StencilTensor, heatflux: f64) -> Vec<f64> {
        let h = self.grid.x.dx(0);
        self.heatflux_face(atom, Axis::X, 0, 0, h, heatflux)
    }
    pub fn heatflux_north(&self, atom: &mut StencilTensor, heatflux: f64) -> Vec<f64> {
        let h = self.grid.y.dx(self.grid.ny as isize);
        self.heatflux_face(atom, Axis::Y, self.grid.ny - 1, 2, h, heatflux)
    }
    pub fn heatflux_south(&self, atom: &mut StencilTensor, heatflux: f64) -> Vec<f64> {
        let h = self.grid.y.dx(0);
        self.heatflux_face(atom, Axis::Y, 0, 0, h, heatflux)
    }
    pub fn heatflux_top(&self, atom: &mut StencilTensor, heatflux: f64) -> Vec<f64> {
        let h = self.grid.z.dx(self.grid.nz as isize);
        self.heatflux_face(atom, Axis::Z, self.grid.nz - 1, 2, h, heatflux)
    }
    pub fn heatflux_bottom(&self, atom: &mut StencilTensor, heatflux: f64) -> Vec<f64> {
        let h = self.grid.z.dx(0);
        self.heatflux_face(atom, Axis::Z, 0, 0, h, heatflux)
    }
}

/// Wires up every face handler for `problem_type` and returns the combined
/// forcing vector. `lid_velocity` drives the moving-lid face for
/// `LidDrivenCavity`; hot/cold wall temperatures drive the extremal faces
/// for `RayleighBenard`.
pub fn apply(
    problem_type: ProblemType,
    grid: &GridMetrics,
    layout: VariableLayout,
    atom: &mut StencilTensor,
    lid_velocity: f64,
) -> Vec<f64> {
    let bc = BoundaryConditions::new(grid, layout);
    let dof = layout.dof();
    let mut forcing = vec![0.0; grid.nx * grid.ny * grid.nz * dof];
    let mut add = |f: Vec<f64>| {
        for (total, v) in forcing.iter_mut().zip(f.iter()) {
            *total += v;
        }
    };

    match problem_type {
        ProblemType::LidDrivenCavity => {
            bc.dirichlet_east(atom);
            bc.dirichlet_west(atom);
            bc.dirichlet_south(atom);
            if layout.w().is_some() {
                add(bc.moving_lid_top(atom, lid_velocity));
                bc.dirichlet_bottom(atom);
            } else {
                add(bc.moving_lid_north(atom, lid_velocity));
            }
        }
        ProblemType::RayleighBenard => {
            bc.dirichlet_east(atom);
            bc.dirichlet_west(atom);
            add(bc.heatflux_east(atom, 0.0));
            add(bc.heatflux_west(atom, 0.0));

            if layout.w().is_some() {
                bc.dirichlet_north(atom);
                bc.dirichlet_south(atom);
                add(bc.heatflux_north(atom, 0.0));
                add(bc.heatflux_south(atom, 0.0));

                bc.dirichlet_top(atom);
                bc.dirichlet_bottom(atom);
                add(bc.temperature_top(atom, 0.0));
                add(bc.temperature_bottom(atom, 1.0));
            } else {
                bc.dirichlet_north(atom);
                bc.dirichlet_south(atom);
                add(bc.temperature_north(atom, 0.0));
                add(bc.temperature_south(atom, 1.0));
            }
        }
    }

    forcing
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_grid::GridMetrics;

    fn grid() -> GridMetrics {
        GridMetrics::uniform_box(0.0, 1.0, 4, 0.0, 1.0, 4, 0.0, 1.0, 4)
    }

    #[test]
    fn dirichlet_east_replaces_normal_row_with_identity() {
        let g = grid();
        let layout = VariableLayout::new(3, false);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        atom.set(g.nx - 1, 1, 1, layout.u(), layout.u(), 2, 1, 1, 7.0);
        let bc = BoundaryConditions::new(&g, layout);
        bc.dirichlet_east(&mut atom);
        assert_eq!(atom.get(g.nx - 1, 1, 1, layout.u(), layout.u(), 1, 1, 1), -1.0);
        assert_eq!(atom.get(g.nx - 1, 1, 1, layout.u(), layout.u(), 2, 1, 1), 0.0);
    }

    #[test]
    fn dirichlet_east_folds_tangential_ghost_into_center() {
        let g = grid();
        let layout = VariableLayout::new(3, false);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        // v's own diffusion stencil touching the east ghost (tangential reflection)
        atom.set(g.nx - 1, 1, 1, layout.v(), layout.v(), 2, 1, 1, 5.0);
        atom.set(g.nx - 1, 1, 1, layout.v(), layout.v(), 1, 1, 1, -2.0);
        let bc = BoundaryConditions::new(&g, layout);
        bc.dirichlet_east(&mut atom);
        assert_eq!(atom.get(g.nx - 1, 1, 1, layout.v(), layout.v(), 1, 1, 1), -7.0);
        assert_eq!(atom.get(g.nx - 1, 1, 1, layout.v(), layout.v(), 2, 1, 1), 0.0);
    }

    #[test]
    fn dirichlet_west_has_no_identity_row() {
        let g = grid();
        let layout = VariableLayout::new(3, false);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        atom.set(0, 1, 1, layout.u(), layout.u(), 0, 1, 1, 9.0);
        atom.set(0, 1, 1, layout.u(), layout.u(), 1, 1, 1, -3.0);
        let bc = BoundaryConditions::new(&g, layout);
        bc.dirichlet_west(&mut atom);
        // u's own ghost column at the west face is dropped, not folded.
        assert_eq!(atom.get(0, 1, 1, layout.u(), layout.u(), 1, 1, 1), -3.0);
        assert_eq!(atom.get(0, 1, 1, layout.u(), layout.u(), 0, 1, 1), 0.0);
    }

    #[test]
    fn moving_lid_north_forces_only_u_rows_on_the_face() {
        let g = grid();
        let layout = VariableLayout::new(3, false);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        atom.set(1, g.ny - 1, 1, layout.u(), layout.u(), 1, 2, 1, 4.0);
        let bc = BoundaryConditions::new(&g, layout);
        let forcing = bc.moving_lid_north(&mut atom, 1.0);
        let idx = state_index(&g, layout.dof(), 1, g.ny - 1, 1, layout.u());
        assert!((forcing[idx] - 8.0).abs() < 1e-12);
        for (i, &f) in forcing.iter().enumerate() {
            if i != idx {
                assert_eq!(f, 0.0, "unexpected forcing at {i}");
            }
        }
    }

    #[test]
    fn problem_type_wiring_zeroes_ghost_columns_everywhere_on_boundary() {
        let g = GridMetrics::uniform_plane(0.0, 1.0, 4, 0.0, 1.0, 4);
        let layout = VariableLayout::new(2, false);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        for i in 0..g.nx {
            atom.set(i, g.ny - 1, 0, layout.u(), layout.u(), 1, 2, 1, 3.0);
        }
        let forcing = apply(ProblemType::LidDrivenCavity, &g, layout, &mut atom, 1.0);
        assert!(forcing.iter().any(|&v| v != 0.0));
        for i in 0..g.nx {
            assert_eq!(atom.get(i, g.ny - 1, 0, layout.u(), layout.u(), 1, 2, 1), 0.0);
        }
    }

    #[test]
    fn temperature_east_folds_without_replacing_the_t_row() {
        let g = grid();
        let layout = VariableLayout::new(3, true);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        let t = layout.t().unwrap();
        atom.set(g.nx - 1, 1, 1, t, t, 2, 1, 1, 6.0);
        atom.set(g.nx - 1, 1, 1, t, t, 1, 1, 1, -2.0);
        let bc = BoundaryConditions::new(&g, layout);
        bc.temperature_east(&mut atom, 0.5);
        // folded into the centre (-2 - 6 = -8), never replaced by an identity
        assert_eq!(atom.get(g.nx - 1, 1, 1, t, t, 1, 1, 1), -8.0);
        assert_eq!(atom.get(g.nx - 1, 1, 1, t, t, 2, 1, 1), 0.0);
    }

    #[test]
    fn rayleigh_benard_side_walls_stay_adiabatic_after_velocity_fold() {
        // dirichlet_east/west must not impose a Dirichlet T condition before
        // the adiabatic heat-flux handler runs.
        let g = GridMetrics::uniform_plane(0.0, 1.0, 4, 0.0, 1.0, 4);
        let layout = VariableLayout::new(2, true);
        let mut atom = StencilTensor::zeros(g.nx, g.ny, g.nz, layout.dof());
        let t = layout.t().unwrap();
        for j in 0..g.ny {
            atom.set(g.nx - 1, j, 0, t, t, 2, 1, 1, 4.0);
            atom.set(g.nx - 1, j, 0, t, t, 1, 1, 1, -1.0);
        }
        let forcing = apply(ProblemType::RayleighBenard, &g, layout, &mut atom, 0.0);
        assert!(forcing.iter().all(|&v| v == 0.0));
        for j in 0..g.ny {
            // heatflux_east (flux = 0) folds the ghost by addition and zeroes it;
            // the east wall must end up exactly T_xx's adiabatic form, -1 + 4 = 3,
            // not the Dirichlet reflection (-1 - 4 = -5) the velocity fold alone
            // would have produced.
            assert_eq!(atom.get(g.nx - 1, j, 0, t, t, 1, 1, 1), 3.0);
            assert_eq!(atom.get(g.nx - 1, j, 0, t, t, 2, 1, 1), 0.0);
        }
    }
}
