//! Validated problem configuration: physical numbers, the problem family,
//! and the continuation solver's step-control knobs.

use crate::error::{DiscretizationError, DiscretizationResult};

/// Which family of boundary conditions the discretization wires up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemType {
    /// No-slip walls on every face except a moving lid (north in 2D, top in 3D).
    LidDrivenCavity,
    /// No-slip velocity walls, hot/cold horizontal extremal faces, adiabatic
    /// side walls.
    RayleighBenard,
}

/// A validated configuration record for a single solve.
///
/// Mirrors the teacher's `SteadyProblem::validate()` pattern: invalid or
/// incomplete combinations are rejected at construction time rather than
/// discovered mid-solve.
#[derive(Clone, Copy, Debug)]
pub struct Parameters {
    pub reynolds: f64,
    pub rayleigh: Option<f64>,
    pub prandtl: Option<f64>,
    pub problem_type: ProblemType,

    pub max_step_size: f64,
    pub min_step_size: f64,
    pub optimal_newton_iterations: usize,
    pub destination_tolerance: f64,
    pub newton_tolerance: f64,
    pub max_newton_iterations: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            reynolds: 0.0,
            rayleigh: None,
            prandtl: None,
            problem_type: ProblemType::LidDrivenCavity,
            max_step_size: 1.0,
            min_step_size: 1e-6,
            optimal_newton_iterations: 3,
            destination_tolerance: 1e-10,
            newton_tolerance: 1e-8,
            max_newton_iterations: 20,
        }
    }
}

impl Parameters {
    /// Validates the configuration, in particular that `rayleigh`/`prandtl`
    /// are supplied together whenever the problem couples a temperature
    /// field, and that the continuation step bounds are sane.
    pub fn validate(&self, has_temperature: bool) -> DiscretizationResult<()> {
        if self.reynolds < 0.0 {
            return Err(DiscretizationError::InvalidConfig {
                what: "reynolds must be >= 0",
            });
        }
        let needs_buoyancy = matches!(self.problem_type, ProblemType::RayleighBenard);
        if needs_buoyancy && !has_temperature {
            return Err(DiscretizationError::InvalidConfig {
                what: "RayleighBenard requires a layout with a temperature dof",
            });
        }
        if needs_buoyancy {
            if self.rayleigh.is_none() {
                return Err(DiscretizationError::MissingParameter { name: "rayleigh" });
            }
            if self.prandtl.is_none() {
                return Err(DiscretizationError::MissingParameter { name: "prandtl" });
            }
        }
        if let Some(pr) = self.prandtl {
            if pr <= 0.0 {
                return Err(DiscretizationError::InvalidConfig {
                    what: "prandtl must be > 0",
                });
            }
        }
        if self.min_step_size <= 0.0 || self.max_step_size < self.min_step_size {
            return Err(DiscretizationError::InvalidConfig {
                what: "min_step_size must be > 0 and <= max_step_size",
            });
        }
        if self.max_newton_iterations == 0 {
            return Err(DiscretizationError::InvalidConfig {
                what: "max_newton_iterations must be > 0",
            });
        }
        Ok(())
    }

    /// The buoyancy coupling coefficient applied to `T` in the vertical
    /// momentum equation, `Rayleigh / (Reynolds^2 * Prandtl)`.
    ///
    /// Only meaningful for `ProblemType::RayleighBenard`; callers must have
    /// already validated that `rayleigh`/`prandtl` are present.
    pub fn buoyancy_coefficient(&self) -> Option<f64> {
        let ra = self.rayleigh?;
        let pr = self.prandtl?;
        if self.reynolds == 0.0 {
            return None;
        }
        Some(ra / (self.reynolds * self.reynolds * pr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lid_driven_cavity_is_valid() {
        let p = Parameters::default();
        assert!(p.validate(false).is_ok());
    }

    #[test]
    fn rayleigh_benard_without_rayleigh_is_rejected() {
        let mut p = Parameters {
            problem_type: ProblemType::RayleighBenard,
            prandtl: Some(0.71),
            ..Parameters::default()
        };
        p.reynolds = 1.0;
        let err = p.validate(true).unwrap_err();
        assert!(matches!(err, DiscretizationError::MissingParameter { name: "rayleigh" }));
    }

    #[test]
    fn rayleigh_benard_without_temperature_layout_is_rejected() {
        let p = Parameters {
            problem_type: ProblemType::RayleighBenard,
            rayleigh: Some(1e4),
            prandtl: Some(0.71),
            reynolds: 1.0,
            ..Parameters::default()
        };
        let err = p.validate(false).unwrap_err();
        assert!(matches!(err, DiscretizationError::InvalidConfig { .. }));
    }

    #[test]
    fn negative_reynolds_is_rejected() {
        let p = Parameters {
            reynolds: -1.0,
            ..Parameters::default()
        };
        assert!(p.validate(false).is_err());
    }

    #[test]
    fn buoyancy_coefficient_matches_formula() {
        let p = Parameters {
            reynolds: 10.0,
            rayleigh: Some(2000.0),
            prandtl: Some(0.5),
            problem_type: ProblemType::RayleighBenard,
            ..Parameters::default()
        };
        let expected = 2000.0 / (10.0 * 10.0 * 0.5);
        assert!((p.buoyancy_coefficient().unwrap() - expected).abs() < 1e-12);
    }
}
