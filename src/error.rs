use crate::{boundary::Face, grid::Axis};

pub type LaplaceResult<T> = Result<T, LaplaceError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LaplaceError {
  #[error("invalid solver method `{name}`")]
  InvalidSolverMethod { name: String },

  #[error(
    "{method} did not converge after {iterations} iterations \
     (residual {residual:.3e}, target {target:.3e})"
  )]
  SolverNonConvergence {
    method: &'static str,
    iterations: usize,
    residual: f64,
    target: f64,
  },

  #[error("boundary values on {face} face of axis {axis} have shape {found:?}, expected {expected:?}")]
  ShapeMismatch {
    axis: Axis,
    face: Face,
    expected: (usize, usize),
    found: (usize, usize),
  },

  #[error("no boundary values given for present axis {axis}")]
  MissingBoundary { axis: Axis },

  #[error("invalid grid: {reason}")]
  InvalidGrid { reason: String },

  #[error("invalid solver option: {reason}")]
  InvalidOption { reason: String },

  #[error("singular system: {reason}")]
  SingularSystem { reason: String },
}
