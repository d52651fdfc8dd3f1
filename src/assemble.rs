//! Assembly of the finite-difference linear system for the Laplacian.
//!
//! Every lattice point gets one row. Fixed points get an identity row
//! with the prescribed potential on the RHS. Free points get the
//! 3/5/7-point stencil, scaled by the product of the squared spacings
//! of the other axes, so that no division by the spacing happens.
//! $(Dy Dz)^2 (u_(i+1) - 2 u_i + u_(i-1)) + (Dx Dz)^2 (...) + (Dx Dy)^2 (...) = 0$

use crate::{
  boundary::{BoundaryRegistry, GridBoundary},
  error::LaplaceResult,
  grid::{Axis, FlatIdx, GridShape, Spacing},
  sparse::SparseMatrix,
};

pub type LseMatrix = SparseMatrix;
pub type LseVector = na::DVector<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilCoeffs {
  /// Coupling to both neighbours along each axis. Zero for absent axes.
  pub neighbour: [f64; 3],
  pub center: f64,
}

pub fn stencil_coeffs(shape: &GridShape, spacing: &Spacing) -> StencilCoeffs {
  let h = spacing.effective(shape);
  let neighbour = Axis::ALL.map(|axis| {
    if !shape.is_present(axis) {
      return 0.0;
    }
    let [b, c] = axis.complement();
    (h[b.index()] * h[c.index()]).powi(2)
  });
  let center = -2.0 * neighbour.iter().sum::<f64>();
  StencilCoeffs { neighbour, center }
}

/// Assembled system together with the classification it was built from.
#[derive(Debug, Clone)]
pub struct LaplaceLse {
  pub matrix: LseMatrix,
  pub rhs: LseVector,
  pub registry: BoundaryRegistry,
}

/// Assembly algorithm for the Laplace LSE.
///
/// Boundary faces are checked against the shape before anything is built.
pub fn assemble_laplace_lse(
  shape: &GridShape,
  spacing: &Spacing,
  boundary: &GridBoundary,
  conflict_tol: f64,
) -> LaplaceResult<LaplaceLse> {
  spacing.validate(shape)?;
  boundary.validate(shape)?;

  let mut registry = BoundaryRegistry::new(*shape, conflict_tol);
  registry.apply_grid_boundary(boundary);

  let npoints = shape.npoints();
  let nnz_estimate = registry.nfixed() + registry.nfree() * (1 + 2 * shape.dim());
  let mut matrix = LseMatrix::with_capacity(npoints, npoints, nnz_estimate);
  let mut rhs = LseVector::zeros(npoints);

  for (idx, value) in registry.fixed_values() {
    matrix.push(idx, idx, 1.0);
    rhs[idx] = value;
  }

  let coeffs = stencil_coeffs(shape, spacing);
  let strides = shape.strides();
  for row in registry.free_indices() {
    push_stencil_row(&mut matrix, row, &coeffs, shape, &strides);
  }

  tracing::debug!(
    "assembled {npoints}x{npoints} LSE with {} nonzeros",
    matrix.nnz()
  );

  Ok(LaplaceLse {
    matrix,
    rhs,
    registry,
  })
}

fn push_stencil_row(
  matrix: &mut LseMatrix,
  row: FlatIdx,
  coeffs: &StencilCoeffs,
  shape: &GridShape,
  strides: &[usize; 3],
) {
  matrix.push(row, row, coeffs.center);
  for axis in shape.present_axes() {
    let stride = strides[axis.index()];
    let coeff = coeffs.neighbour[axis.index()];
    matrix.push(row, row - stride, coeff);
    matrix.push(row, row + stride, coeff);
  }
}

#[cfg(test)]
mod test {
  use super::{assemble_laplace_lse, stencil_coeffs};
  use crate::{
    boundary::{DirichletFace, GridBoundary, DEFAULT_CONFLICT_TOL},
    grid::{self, GridShape, Spacing},
  };

  use approx::assert_relative_eq;

  fn zero_boundary(shape: &GridShape) -> GridBoundary {
    let mut boundary = GridBoundary::new();
    for axis in shape.present_axes() {
      let (r, c) = GridBoundary::face_shape(shape, axis);
      boundary = boundary.with_axis(
        axis,
        DirichletFace::constant(r, c, 0.0),
        DirichletFace::constant(r, c, 1.0),
      );
    }
    boundary
  }

  #[test]
  fn coefficients() {
    let spacing = Spacing::new(0.5, 2.0, 4.0);

    let line = GridShape::line(4).unwrap();
    let c = stencil_coeffs(&line, &spacing);
    assert_eq!(c.neighbour, [1.0, 0.0, 0.0]);
    assert_eq!(c.center, -2.0);

    let plane = GridShape::plane(4, 4).unwrap();
    let c = stencil_coeffs(&plane, &spacing);
    assert_relative_eq!(c.neighbour[0], 4.0);
    assert_relative_eq!(c.neighbour[1], 0.25);
    assert_eq!(c.neighbour[2], 0.0);
    assert_relative_eq!(c.center, -8.5);

    let volume = GridShape::volume(4, 4, 4).unwrap();
    let c = stencil_coeffs(&volume, &spacing);
    assert_relative_eq!(c.neighbour[0], 64.0);
    assert_relative_eq!(c.neighbour[1], 4.0);
    assert_relative_eq!(c.neighbour[2], 1.0);
    assert_relative_eq!(c.center, -138.0);
  }

  #[test]
  fn stencil_degeneracy() {
    for ((nx, ny, nz), noffdiag) in [((4, 0, 0), 2), ((4, 3, 0), 4), ((4, 3, 2), 6)] {
      let shape = GridShape::new(nx, ny, nz).unwrap();
      let lse = assemble_laplace_lse(
        &shape,
        &Spacing::uniform(0.1),
        &zero_boundary(&shape),
        DEFAULT_CONFLICT_TOL,
      )
      .unwrap();

      assert!(lse.registry.nfree() > 0);
      for row in 0..shape.npoints() {
        let pattern = lse.matrix.row_pattern(row);
        if lse.registry.is_fixed(row) {
          assert_eq!(pattern, vec![row]);
          assert_eq!(lse.matrix.get(row, row), 1.0);
        } else {
          assert!(pattern.contains(&row));
          assert_eq!(pattern.len() - 1, noffdiag);
        }
      }
    }
  }

  #[test]
  fn stencil_rows_sum_to_zero() {
    let shape = GridShape::volume(3, 4, 2).unwrap();
    let lse = assemble_laplace_lse(
      &shape,
      &Spacing::new(0.3, 0.7, 1.1),
      &zero_boundary(&shape),
      DEFAULT_CONFLICT_TOL,
    )
    .unwrap();
    let dense = lse.matrix.to_nalgebra_dense();
    for row in lse.registry.free_indices() {
      assert_relative_eq!(dense.row(row).sum(), 0.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn neighbour_offsets_2d() {
    let shape = GridShape::plane(2, 2).unwrap();
    let lse = assemble_laplace_lse(
      &shape,
      &Spacing::new(1.0, 1.0, 1.0),
      &zero_boundary(&shape),
      DEFAULT_CONFLICT_TOL,
    )
    .unwrap();
    // only the center point (1,1) is free
    let center = grid::to_flat(&shape, [1, 1, 0]);
    assert_eq!(lse.registry.free_indices().collect::<Vec<_>>(), vec![center]);
    assert_eq!(lse.matrix.row_pattern(center), vec![1, 3, 4, 5, 7]);
    assert_eq!(lse.matrix.get(center, center), -4.0);
    assert_eq!(lse.rhs[center], 0.0);
  }

  #[test]
  fn rhs_holds_prescribed_values() {
    let shape = GridShape::line(4).unwrap();
    let boundary = GridBoundary::new().with_axis(
      grid::Axis::X,
      DirichletFace::scalar(-3.0),
      DirichletFace::scalar(7.5),
    );
    let lse =
      assemble_laplace_lse(&shape, &Spacing::uniform(0.25), &boundary, DEFAULT_CONFLICT_TOL)
        .unwrap();
    assert_eq!(lse.rhs.as_slice(), &[-3.0, 0.0, 0.0, 0.0, 7.5]);
    assert_eq!(lse.registry.nfixed(), 2);
  }
}
