//! Finite-difference solver for the Laplace equation on uniform
//! rectilinear grids in one, two and three dimensions.

extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod boundary;
pub mod error;
pub mod grid;
pub mod laplace;
pub mod project;
pub mod solver;
pub mod sparse;

pub use error::{LaplaceError, LaplaceResult};
pub use laplace::{
  solve_laplace, solve_laplace_1d, solve_laplace_2d, solve_laplace_3d, solve_laplace_with,
  LaplaceSolution, SolveOptions,
};

pub type Dim = usize;
