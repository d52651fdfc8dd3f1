//! Reshaping of flat solution vectors onto the lattice.

use crate::grid::{self, Axis, GridShape};

/// Potential on the lattice, with rank equal to the problem dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionGrid {
  /// `phi[i]`
  Line(na::DVector<f64>),
  /// `phi[(i, j)]`
  Plane(na::DMatrix<f64>),
  /// `phi[i][(j, k)]`
  Volume(Vec<na::DMatrix<f64>>),
}

impl SolutionGrid {
  pub fn rank(&self) -> usize {
    match self {
      Self::Line(_) => 1,
      Self::Plane(_) => 2,
      Self::Volume(_) => 3,
    }
  }

  /// Value at `[i, j, k]`. Coordinates of absent axes must be zero.
  pub fn get(&self, [i, j, k]: grid::GridCoord) -> f64 {
    match self {
      Self::Line(phi) => {
        debug_assert!(j == 0 && k == 0);
        phi[i]
      }
      Self::Plane(phi) => {
        debug_assert!(k == 0);
        phi[(i, j)]
      }
      Self::Volume(phi) => phi[i][(j, k)],
    }
  }

  pub fn as_line(&self) -> Option<&na::DVector<f64>> {
    match self {
      Self::Line(phi) => Some(phi),
      _ => None,
    }
  }
  pub fn as_plane(&self) -> Option<&na::DMatrix<f64>> {
    match self {
      Self::Plane(phi) => Some(phi),
      _ => None,
    }
  }
  pub fn as_volume(&self) -> Option<&[na::DMatrix<f64>]> {
    match self {
      Self::Volume(phi) => Some(phi),
      _ => None,
    }
  }

  /// Inverse of [`project`].
  pub fn flatten(&self, shape: &GridShape) -> na::DVector<f64> {
    na::DVector::from_iterator(
      shape.npoints(),
      grid::coords(shape).map(|coord| self.get(coord)),
    )
  }
}

/// Puts a flat vector onto the lattice of `shape`.
pub fn project(shape: &GridShape, flat: &na::DVector<f64>) -> SolutionGrid {
  assert_eq!(flat.len(), shape.npoints(), "vector does not match {shape:?}");
  let nx = shape.extent(Axis::X);
  let ny = shape.extent(Axis::Y);
  let nz = shape.extent(Axis::Z);
  let at = |i: usize, j: usize, k: usize| flat[grid::to_flat(shape, [i, j, k])];

  match shape.dim() {
    1 => SolutionGrid::Line(na::DVector::from_fn(nx, |i, _| at(i, 0, 0))),
    2 => SolutionGrid::Plane(na::DMatrix::from_fn(nx, ny, |i, j| at(i, j, 0))),
    _ => SolutionGrid::Volume(
      (0..nx)
        .map(|i| na::DMatrix::from_fn(ny, nz, |j, k| at(i, j, k)))
        .collect(),
    ),
  }
}

#[cfg(test)]
mod test {
  use super::{project, SolutionGrid};
  use crate::grid::{self, GridShape};

  #[test]
  fn rank_follows_dimension() {
    for ((nx, ny, nz), rank) in [((3, 0, 0), 1), ((3, 4, 0), 2), ((3, 4, 2), 3)] {
      let shape = GridShape::new(nx, ny, nz).unwrap();
      let flat = na::DVector::from_fn(shape.npoints(), |i, _| i as f64);
      assert_eq!(project(&shape, &flat).rank(), rank);
    }
  }

  #[test]
  fn entries_match_flat_indices() {
    let shape = GridShape::volume(3, 4, 2).unwrap();
    let flat = na::DVector::from_fn(shape.npoints(), |i, _| (i * i) as f64);
    let phi = project(&shape, &flat);
    for coord in grid::coords(&shape) {
      assert_eq!(phi.get(coord), flat[grid::to_flat(&shape, coord)]);
    }
    let slices = phi.as_volume().unwrap();
    assert_eq!(slices.len(), 4);
    assert_eq!(slices[0].shape(), (5, 3));
  }

  #[test]
  fn reshape_round_trip() {
    for (nx, ny, nz) in [(3, 0, 0), (3, 4, 0), (3, 4, 2)] {
      let shape = GridShape::new(nx, ny, nz).unwrap();
      let flat = na::DVector::from_fn(shape.npoints(), |i, _| (i as f64).sin());
      assert_eq!(project(&shape, &flat).flatten(&shape), flat);
    }
  }

  #[test]
  fn plane_layout() {
    let shape = GridShape::plane(1, 2).unwrap();
    let flat = na::DVector::from_vec(vec![0., 1., 2., 3., 4., 5.]);
    #[rustfmt::skip]
    let expected = na::DMatrix::from_row_slice(2, 3, &[
      0., 1., 2.,
      3., 4., 5.,
    ]);
    assert_eq!(project(&shape, &flat), SolutionGrid::Plane(expected));
  }
}
