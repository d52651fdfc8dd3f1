//! Module for the Laplace Equation $Delta phi = 0$ with Dirichlet boundary conditions.
//!
//! The dimension specific entry points all delegate to [`solve_laplace`],
//! which treats every problem as a three dimensional one with degenerate axes.

use crate::{
  assemble,
  boundary::{BcConflict, DirichletFace, GridBoundary, DEFAULT_CONFLICT_TOL},
  error::{LaplaceError, LaplaceResult},
  grid::{Axis, GridShape, Spacing},
  project::{self, SolutionGrid},
  solver::{LinearSolver, SolverMethod, Tolerances, DEFAULT_MAX_ITERS, DEFAULT_SOR_OMEGA},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
  pub rel_tol: f64,
  pub abs_tol: f64,
  pub max_iters: usize,
  /// Boundary values closer than this on a shared point are not a conflict.
  pub conflict_tol: f64,
  pub sor_omega: f64,
}
impl SolveOptions {
  pub fn new(rel_tol: f64, abs_tol: f64) -> Self {
    Self {
      rel_tol,
      abs_tol,
      ..Self::default()
    }
  }
  pub fn tolerances(&self) -> Tolerances {
    Tolerances::new(self.rel_tol, self.abs_tol).with_max_iters(self.max_iters)
  }

  pub fn validate(&self) -> LaplaceResult<()> {
    let tols = [
      ("rel_tol", self.rel_tol),
      ("abs_tol", self.abs_tol),
      ("conflict_tol", self.conflict_tol),
    ];
    if let Some((name, value)) = tols.iter().find(|(_, v)| !(*v >= 0.0)) {
      return Err(LaplaceError::InvalidOption {
        reason: format!("{name} must be non-negative, got {value}"),
      });
    }
    if !(self.sor_omega > 0.0 && self.sor_omega < 2.0) {
      return Err(LaplaceError::InvalidOption {
        reason: format!("sor_omega must lie in (0, 2), got {}", self.sor_omega),
      });
    }
    Ok(())
  }
}
impl Default for SolveOptions {
  fn default() -> Self {
    let tols = Tolerances::default();
    Self {
      rel_tol: tols.rel_tol,
      abs_tol: tols.abs_tol,
      max_iters: DEFAULT_MAX_ITERS,
      conflict_tol: DEFAULT_CONFLICT_TOL,
      sor_omega: DEFAULT_SOR_OMEGA,
    }
  }
}

#[derive(Debug, Clone)]
pub struct LaplaceSolution {
  pub grid: SolutionGrid,
  /// Shared boundary points with inconsistent values. The first value was used.
  pub conflicts: Vec<BcConflict>,
  pub iterations: usize,
  pub residual: f64,
}

/// General Laplace solver.
///
/// The method name and the boundary faces are checked before anything is assembled.
pub fn solve_laplace(
  shape: &GridShape,
  spacing: &Spacing,
  boundary: &GridBoundary,
  method: &str,
  opts: &SolveOptions,
) -> LaplaceResult<LaplaceSolution> {
  let method: SolverMethod = method.parse()?;
  let solver = method.solver(opts.sor_omega)?;
  solve_laplace_with(shape, spacing, boundary, solver.as_ref(), opts)
}

/// General Laplace solver with a caller supplied linear solver.
///
/// The options are checked before anything is assembled.
pub fn solve_laplace_with(
  shape: &GridShape,
  spacing: &Spacing,
  boundary: &GridBoundary,
  solver: &dyn LinearSolver,
  opts: &SolveOptions,
) -> LaplaceResult<LaplaceSolution> {
  opts.validate()?;
  tracing::info!(
    "solving {}D Laplace equation on {} points with {}",
    shape.dim(),
    shape.npoints(),
    solver.name()
  );

  let lse = assemble::assemble_laplace_lse(shape, spacing, boundary, opts.conflict_tol)?;
  if !lse.registry.conflicts().is_empty() {
    tracing::warn!(
      "{} boundary points have inconsistent values",
      lse.registry.conflicts().len()
    );
  }

  let matrix = lse.matrix.to_nalgebra_csr();
  let report = solver.solve(&matrix, &lse.rhs, &opts.tolerances())?;
  let grid = project::project(shape, &report.solution);

  Ok(LaplaceSolution {
    grid,
    conflicts: lse.registry.into_conflicts(),
    iterations: report.iterations,
    residual: report.residual,
  })
}

pub fn solve_laplace_1d(
  nx: usize,
  dx: f64,
  v0x: f64,
  vnx: f64,
  method: &str,
  opts: &SolveOptions,
) -> LaplaceResult<LaplaceSolution> {
  let shape = GridShape::line(nx)?;
  let spacing = Spacing::new(dx, 1.0, 1.0);
  let boundary = GridBoundary::new().with_axis(Axis::X, v0x.into(), vnx.into());
  solve_laplace(&shape, &spacing, &boundary, method, opts)
}

/// `v0x`/`vnx` are indexed by `j`, `v0y`/`vny` by `i`.
#[allow(clippy::too_many_arguments)]
pub fn solve_laplace_2d(
  nx: usize,
  dx: f64,
  v0x: na::DVector<f64>,
  vnx: na::DVector<f64>,
  ny: usize,
  dy: f64,
  v0y: na::DVector<f64>,
  vny: na::DVector<f64>,
  method: &str,
  opts: &SolveOptions,
) -> LaplaceResult<LaplaceSolution> {
  let shape = GridShape::plane(nx, ny)?;
  let spacing = Spacing::new(dx, dy, 1.0);
  let boundary = GridBoundary::from_faces(
    vec![DirichletFace::line(v0x), DirichletFace::line(v0y)],
    vec![DirichletFace::line(vnx), DirichletFace::line(vny)],
  );
  solve_laplace(&shape, &spacing, &boundary, method, opts)
}

/// `v0x`/`vnx` are indexed by `(j, k)`, `v0y`/`vny` by `(i, k)` and `v0z`/`vnz` by `(i, j)`.
#[allow(clippy::too_many_arguments)]
pub fn solve_laplace_3d(
  nx: usize,
  dx: f64,
  v0x: na::DMatrix<f64>,
  vnx: na::DMatrix<f64>,
  ny: usize,
  dy: f64,
  v0y: na::DMatrix<f64>,
  vny: na::DMatrix<f64>,
  nz: usize,
  dz: f64,
  v0z: na::DMatrix<f64>,
  vnz: na::DMatrix<f64>,
  method: &str,
  opts: &SolveOptions,
) -> LaplaceResult<LaplaceSolution> {
  let shape = GridShape::volume(nx, ny, nz)?;
  let spacing = Spacing::new(dx, dy, dz);
  let boundary = GridBoundary::from_faces(
    vec![v0x.into(), v0y.into(), v0z.into()],
    vec![vnx.into(), vny.into(), vnz.into()],
  );
  solve_laplace(&shape, &spacing, &boundary, method, opts)
}
