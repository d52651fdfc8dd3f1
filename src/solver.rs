//! Linear solvers for the assembled system, selectable by name.
//!
//! Direct solves go through a sparse LU factorization from faer.
//! The iterative solvers are the classical stationary splittings
//! (Jacobi, Gauss-Seidel, SOR) working directly on the CSR matrix.
//! They stop once $norm(b - A x) <= max(tol_abs, tol_rel norm(b))$
//! and give up after a fixed number of sweeps.

use crate::error::{LaplaceError, LaplaceResult};

use faer::solvers::SpSolver;
use std::str::FromStr;

pub type SolverMatrix = nas::CsrMatrix<f64>;
pub type SolverVector = na::DVector<f64>;

pub const DEFAULT_MAX_ITERS: usize = 100_000;
pub const DEFAULT_SOR_OMEGA: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
  pub rel_tol: f64,
  pub abs_tol: f64,
  pub max_iters: usize,
}
impl Tolerances {
  pub fn new(rel_tol: f64, abs_tol: f64) -> Self {
    Self {
      rel_tol,
      abs_tol,
      max_iters: DEFAULT_MAX_ITERS,
    }
  }
  pub fn with_max_iters(mut self, max_iters: usize) -> Self {
    self.max_iters = max_iters;
    self
  }
  /// Residual norm below which an iterative solve counts as converged.
  pub fn target(&self, rhs_norm: f64) -> f64 {
    self.abs_tol.max(self.rel_tol * rhs_norm)
  }
}
impl Default for Tolerances {
  fn default() -> Self {
    Self::new(1e-10, 1e-12)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
  pub solution: SolverVector,
  /// Number of sweeps. Zero for direct solves.
  pub iterations: usize,
  pub residual: f64,
}

/// A strategy for solving $A x = b$.
pub trait LinearSolver {
  fn name(&self) -> &'static str;
  fn solve(
    &self,
    matrix: &SolverMatrix,
    rhs: &SolverVector,
    tols: &Tolerances,
  ) -> LaplaceResult<SolveReport>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMethod {
  Direct,
  Jacobi,
  GaussSeidel,
  Sor,
}
impl SolverMethod {
  /// `sor_omega` is only looked at for [`SolverMethod::Sor`].
  pub fn solver(self, sor_omega: f64) -> LaplaceResult<Box<dyn LinearSolver>> {
    Ok(match self {
      Self::Direct => Box::new(FaerLu),
      Self::Jacobi => Box::new(Jacobi),
      Self::GaussSeidel => Box::new(GaussSeidel),
      Self::Sor => Box::new(Sor::new(sor_omega)?),
    })
  }
  pub fn is_iterative(self) -> bool {
    !matches!(self, Self::Direct)
  }
}
impl FromStr for SolverMethod {
  type Err = LaplaceError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    match name {
      "direct" | "lu" => Ok(Self::Direct),
      "jacobi" => Ok(Self::Jacobi),
      "iterative" | "gaussSeidel" | "gauss-seidel" | "gauss_seidel" => Ok(Self::GaussSeidel),
      "sor" => Ok(Self::Sor),
      _ => Err(LaplaceError::InvalidSolverMethod { name: name.into() }),
    }
  }
}

/// Solves $A x = b$ with the solver registered under `method`.
pub fn solve(
  matrix: &SolverMatrix,
  rhs: &SolverVector,
  rel_tol: f64,
  abs_tol: f64,
  method: &str,
) -> LaplaceResult<SolveReport> {
  let method: SolverMethod = method.parse()?;
  let tols = Tolerances::new(rel_tol, abs_tol);
  method.solver(DEFAULT_SOR_OMEGA)?.solve(matrix, rhs, &tols)
}

pub fn residual_norm(matrix: &SolverMatrix, x: &SolverVector, rhs: &SolverVector) -> f64 {
  matrix
    .row_iter()
    .enumerate()
    .map(|(irow, row)| {
      let ax: f64 = row
        .col_indices()
        .iter()
        .zip(row.values())
        .map(|(&c, &v)| v * x[c])
        .sum();
      (rhs[irow] - ax).powi(2)
    })
    .sum::<f64>()
    .sqrt()
}

/// Sparse LU from faer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerLu;
impl LinearSolver for FaerLu {
  fn name(&self) -> &'static str {
    "direct"
  }

  fn solve(
    &self,
    matrix: &SolverMatrix,
    rhs: &SolverVector,
    _tols: &Tolerances,
  ) -> LaplaceResult<SolveReport> {
    let triplets: Vec<(usize, usize, f64)> = matrix
      .triplet_iter()
      .map(|(r, c, &v)| (r, c, v))
      .collect();
    let faer_mat = faer::sparse::SparseColMat::<usize, f64>::try_new_from_triplets(
      matrix.nrows(),
      matrix.ncols(),
      &triplets,
    )
    .map_err(|err| LaplaceError::SingularSystem {
      reason: format!("failed to build faer matrix: {err:?}"),
    })?;
    let lu = faer_mat
      .sp_lu()
      .map_err(|err| LaplaceError::SingularSystem {
        reason: format!("LU factorization failed: {err:?}"),
      })?;

    let b = faer::col::from_slice(rhs.as_slice());
    let solution = na::DVector::from_vec(lu.solve(b).as_slice().to_vec());
    let residual = residual_norm(matrix, &solution, rhs);
    tracing::debug!("direct solve finished with residual {residual:.3e}");

    Ok(SolveReport {
      solution,
      iterations: 0,
      residual,
    })
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Jacobi;
impl LinearSolver for Jacobi {
  fn name(&self) -> &'static str {
    "jacobi"
  }

  fn solve(
    &self,
    matrix: &SolverMatrix,
    rhs: &SolverVector,
    tols: &Tolerances,
  ) -> LaplaceResult<SolveReport> {
    let diag = diagonal(matrix)?;
    let mut prev = SolverVector::zeros(rhs.len());
    iterate(self.name(), matrix, rhs, tols, |x| {
      prev.copy_from(x);
      for (irow, row) in matrix.row_iter().enumerate() {
        let offdiag = offdiag_dot(irow, row.col_indices(), row.values(), &prev);
        x[irow] = (rhs[irow] - offdiag) / diag[irow];
      }
    })
  }
}

/// Gauss-Seidel, which is SOR with $omega = 1$.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussSeidel;
impl LinearSolver for GaussSeidel {
  fn name(&self) -> &'static str {
    "gauss-seidel"
  }

  fn solve(
    &self,
    matrix: &SolverMatrix,
    rhs: &SolverVector,
    tols: &Tolerances,
  ) -> LaplaceResult<SolveReport> {
    let diag = diagonal(matrix)?;
    iterate(self.name(), matrix, rhs, tols, |x| {
      sor_sweep(matrix, rhs, &diag, 1.0, x)
    })
  }
}

/// Successive over-relaxation.
#[derive(Debug, Clone, Copy)]
pub struct Sor {
  omega: f64,
}
impl Sor {
  /// Converges only for $0 < omega < 2$.
  pub fn new(omega: f64) -> LaplaceResult<Self> {
    if omega > 0.0 && omega < 2.0 {
      Ok(Self { omega })
    } else {
      Err(LaplaceError::InvalidOption {
        reason: format!("sor_omega must lie in (0, 2), got {omega}"),
      })
    }
  }
  pub fn omega(&self) -> f64 {
    self.omega
  }
}
impl Default for Sor {
  fn default() -> Self {
    Self {
      omega: DEFAULT_SOR_OMEGA,
    }
  }
}
impl LinearSolver for Sor {
  fn name(&self) -> &'static str {
    "sor"
  }

  fn solve(
    &self,
    matrix: &SolverMatrix,
    rhs: &SolverVector,
    tols: &Tolerances,
  ) -> LaplaceResult<SolveReport> {
    let diag = diagonal(matrix)?;
    iterate(self.name(), matrix, rhs, tols, |x| {
      sor_sweep(matrix, rhs, &diag, self.omega, x)
    })
  }
}

fn sor_sweep(
  matrix: &SolverMatrix,
  rhs: &SolverVector,
  diag: &[f64],
  omega: f64,
  x: &mut SolverVector,
) {
  for (irow, row) in matrix.row_iter().enumerate() {
    let offdiag = offdiag_dot(irow, row.col_indices(), row.values(), x);
    let gs = (rhs[irow] - offdiag) / diag[irow];
    x[irow] = (1.0 - omega) * x[irow] + omega * gs;
  }
}

fn offdiag_dot(irow: usize, cols: &[usize], vals: &[f64], x: &SolverVector) -> f64 {
  cols
    .iter()
    .zip(vals)
    .filter(|&(&c, _)| c != irow)
    .map(|(&c, &v)| v * x[c])
    .sum()
}

fn diagonal(matrix: &SolverMatrix) -> LaplaceResult<Vec<f64>> {
  matrix
    .row_iter()
    .enumerate()
    .map(|(irow, row)| {
      let d: f64 = row
        .col_indices()
        .iter()
        .zip(row.values())
        .filter(|&(&c, _)| c == irow)
        .map(|(_, &v)| v)
        .sum();
      if d == 0.0 {
        Err(LaplaceError::SingularSystem {
          reason: format!("zero diagonal entry in row {irow}"),
        })
      } else {
        Ok(d)
      }
    })
    .collect()
}

/// Runs `sweep` on an initial guess of zero until the residual meets the tolerances.
fn iterate<F>(
  method: &'static str,
  matrix: &SolverMatrix,
  rhs: &SolverVector,
  tols: &Tolerances,
  mut sweep: F,
) -> LaplaceResult<SolveReport>
where
  F: FnMut(&mut SolverVector),
{
  let target = tols.target(rhs.norm());
  let mut x = SolverVector::zeros(rhs.len());
  let mut residual = residual_norm(matrix, &x, rhs);

  let mut iterations = 0;
  while !(residual <= target) {
    if !residual.is_finite() || iterations == tols.max_iters {
      tracing::warn!("{method} stopped after {iterations} iterations, residual {residual:.3e}");
      return Err(LaplaceError::SolverNonConvergence {
        method,
        iterations,
        residual,
        target,
      });
    }
    sweep(&mut x);
    iterations += 1;
    residual = residual_norm(matrix, &x, rhs);
  }

  tracing::debug!("{method} converged after {iterations} iterations, residual {residual:.3e}");
  Ok(SolveReport {
    solution: x,
    iterations,
    residual,
  })
}
