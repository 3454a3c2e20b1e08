//! Maps the physical unknowns (velocity components, pressure, temperature)
//! onto the degree-of-freedom slots carried by every grid cell.

/// Degree-of-freedom layout for a staggered-grid problem.
///
/// `p` always sits at slot `dim` and, when present, `T` always sits at slot
/// `dim + 1` — this holds regardless of whether the `w` velocity component
/// exists, since `dim` already accounts for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableLayout {
    dim: usize,
    has_temperature: bool,
}

impl VariableLayout {
    /// `dim` must be 2 or 3.
    pub fn new(dim: usize, has_temperature: bool) -> Self {
        assert!(dim == 2 || dim == 3, "dim must be 2 or 3, got {dim}");
        Self { dim, has_temperature }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn has_temperature(&self) -> bool {
        self.has_temperature
    }

    /// Number of degrees of freedom carried per cell.
    pub fn dof(&self) -> usize {
        self.dim + 1 + usize::from(self.has_temperature)
    }

    pub fn u(&self) -> usize {
        0
    }

    pub fn v(&self) -> usize {
        1
    }

    /// `Some` only for 3D layouts.
    pub fn w(&self) -> Option<usize> {
        (self.dim == 3).then_some(2)
    }

    pub fn p(&self) -> usize {
        self.dim
    }

    /// `Some` only when the layout carries a temperature degree of freedom.
    pub fn t(&self) -> Option<usize> {
        self.has_temperature.then_some(self.dim + 1)
    }

    /// Velocity component slots, in order: `u`, `v`, and `w` if present.
    pub fn velocity_slots(&self) -> Vec<usize> {
        let mut slots = vec![self.u(), self.v()];
        if let Some(w) = self.w() {
            slots.push(w);
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lid_driven_cavity_2d_layout() {
        let layout = VariableLayout::new(2, false);
        assert_eq!(layout.dof(), 3);
        assert_eq!(layout.u(), 0);
        assert_eq!(layout.v(), 1);
        assert_eq!(layout.w(), None);
        assert_eq!(layout.p(), 2);
        assert_eq!(layout.t(), None);
    }

    #[test]
    fn lid_driven_cavity_3d_layout() {
        let layout = VariableLayout::new(3, false);
        assert_eq!(layout.dof(), 4);
        assert_eq!(layout.w(), Some(2));
        assert_eq!(layout.p(), 3);
        assert_eq!(layout.t(), None);
    }

    #[test]
    fn rayleigh_benard_2d_layout() {
        let layout = VariableLayout::new(2, true);
        assert_eq!(layout.dof(), 4);
        assert_eq!(layout.p(), 2);
        assert_eq!(layout.t(), Some(3));
    }

    #[test]
    fn rayleigh_benard_3d_layout() {
        let layout = VariableLayout::new(3, true);
        assert_eq!(layout.dof(), 5);
        assert_eq!(layout.w(), Some(2));
        assert_eq!(layout.p(), 3);
        assert_eq!(layout.t(), Some(4));
    }
}
