//! Uniform rectilinear lattice and the bijection between
//! lattice coordinates and flat (lexicographic) indices.
//!
//! All problems are treated as three dimensional.
//! A 1D or 2D problem simply has degenerate trailing axes
//! of extent one, where the only valid coordinate is zero.

use crate::{
  error::{LaplaceError, LaplaceResult},
  Dim,
};

/// Lattice coordinate `[i, j, k]`.
pub type GridCoord = [usize; 3];
pub type FlatIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
  X,
  Y,
  Z,
}
impl Axis {
  pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

  pub fn index(self) -> usize {
    self as usize
  }

  /// The two axes orthogonal to `self`, in ascending order.
  pub fn complement(self) -> [Axis; 2] {
    match self {
      Axis::X => [Axis::Y, Axis::Z],
      Axis::Y => [Axis::X, Axis::Z],
      Axis::Z => [Axis::X, Axis::Y],
    }
  }
}
impl std::fmt::Display for Axis {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Axis::X => "x",
      Axis::Y => "y",
      Axis::Z => "z",
    };
    write!(f, "{name}")
  }
}

/// Number of cells `(Nx, Ny, Nz)` along each axis.
///
/// An axis with zero cells is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
  ncells: [usize; 3],
}

// constructors
impl GridShape {
  pub fn new(nx: usize, ny: usize, nz: usize) -> LaplaceResult<Self> {
    if nx == 0 {
      return Err(LaplaceError::InvalidGrid {
        reason: "x axis needs at least one cell".into(),
      });
    }
    if ny == 0 && nz > 0 {
      return Err(LaplaceError::InvalidGrid {
        reason: format!("z axis has {nz} cells but y axis is absent"),
      });
    }
    let npoints = [nx, ny, nz]
      .into_iter()
      .try_fold(1usize, |acc, n| n.checked_add(1).and_then(|e| acc.checked_mul(e)));
    if npoints.is_none() {
      return Err(LaplaceError::InvalidGrid {
        reason: format!("number of lattice points of ({nx}, {ny}, {nz}) cells overflows"),
      });
    }
    Ok(Self {
      ncells: [nx, ny, nz],
    })
  }
  pub fn line(nx: usize) -> LaplaceResult<Self> {
    Self::new(nx, 0, 0)
  }
  pub fn plane(nx: usize, ny: usize) -> LaplaceResult<Self> {
    Self::new(nx, ny, 0)
  }
  pub fn volume(nx: usize, ny: usize, nz: usize) -> LaplaceResult<Self> {
    Self::new(nx, ny, nz)
  }
}

// getters
impl GridShape {
  pub fn ncells(&self, axis: Axis) -> usize {
    self.ncells[axis.index()]
  }
  /// Number of lattice points along `axis`.
  pub fn extent(&self, axis: Axis) -> usize {
    self.ncells(axis) + 1
  }
  pub fn is_present(&self, axis: Axis) -> bool {
    self.ncells(axis) > 0
  }
  pub fn present_axes(&self) -> impl Iterator<Item = Axis> + '_ {
    Axis::ALL.into_iter().filter(move |&a| self.is_present(a))
  }
  pub fn dim(&self) -> Dim {
    self.present_axes().count()
  }
  pub fn npoints(&self) -> usize {
    Axis::ALL.iter().map(|&a| self.extent(a)).product()
  }

  /// Flat index offset between neighbours along each axis.
  pub fn strides(&self) -> [usize; 3] {
    let nz = self.extent(Axis::Z);
    let ny = self.extent(Axis::Y);
    [ny * nz, nz, 1]
  }

  pub fn contains(&self, coord: GridCoord) -> bool {
    Axis::ALL
      .iter()
      .all(|&a| coord[a.index()] <= self.ncells(a))
  }
}

/// converts lattice coordinate to flat index
///
/// `(Nz+1)(Ny+1) i + (Nz+1) j + k`
pub fn to_flat(shape: &GridShape, [i, j, k]: GridCoord) -> FlatIdx {
  debug_assert!(
    shape.contains([i, j, k]),
    "coordinate {:?} outside of {shape:?}",
    [i, j, k]
  );
  let [si, sj, sk] = shape.strides();
  si * i + sj * j + sk * k
}

/// converts flat index to lattice coordinate
pub fn to_coord(shape: &GridShape, flat: FlatIdx) -> GridCoord {
  debug_assert!(flat < shape.npoints(), "flat index {flat} outside of {shape:?}");
  let [si, sj, _] = shape.strides();
  let i = flat / si;
  let rest = flat % si;
  [i, rest / sj, rest % sj]
}

/// All lattice coordinates in flat index order.
pub fn coords(shape: &GridShape) -> impl Iterator<Item = GridCoord> + '_ {
  (0..shape.npoints()).map(move |flat| to_coord(shape, flat))
}

/// Grid spacing `(Dx, Dy, Dz)`.
///
/// Entries of absent axes are placeholders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
  h: [f64; 3],
}
impl Spacing {
  pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
    Self { h: [dx, dy, dz] }
  }
  pub fn uniform(h: f64) -> Self {
    Self::new(h, h, h)
  }
  pub fn get(&self, axis: Axis) -> f64 {
    self.h[axis.index()]
  }

  /// Spacing as seen by the stencil: absent axes contribute a neutral factor of one.
  pub fn effective(&self, shape: &GridShape) -> [f64; 3] {
    Axis::ALL.map(|a| if shape.is_present(a) { self.get(a) } else { 1.0 })
  }

  pub fn validate(&self, shape: &GridShape) -> LaplaceResult<()> {
    for axis in shape.present_axes() {
      let h = self.get(axis);
      if !(h.is_finite() && h > 0.0) {
        return Err(LaplaceError::InvalidGrid {
          reason: format!("spacing along {axis} must be positive and finite, got {h}"),
        });
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::{coords, to_coord, to_flat, Axis, GridShape, Spacing};
  use crate::error::LaplaceError;

  #[test]
  fn flat_coord_bijection() {
    let shapes = [(3, 0, 0), (3, 4, 0), (3, 4, 2), (1, 1, 1)];
    for (nx, ny, nz) in shapes {
      let shape = GridShape::new(nx, ny, nz).unwrap();
      for i in 0..=nx {
        for j in 0..=ny {
          for k in 0..=nz {
            let flat = to_flat(&shape, [i, j, k]);
            assert!(flat < shape.npoints());
            assert_eq!(to_coord(&shape, flat), [i, j, k]);
          }
        }
      }
    }
  }

  #[test]
  fn flat_order_is_lexicographic() {
    let shape = GridShape::volume(2, 3, 1).unwrap();
    let flats: Vec<_> = coords(&shape).map(|c| to_flat(&shape, c)).collect();
    let expected: Vec<_> = (0..shape.npoints()).collect();
    assert_eq!(flats, expected);
    assert_eq!(to_flat(&shape, [1, 0, 0]), 8);
    assert_eq!(to_flat(&shape, [0, 1, 0]), 2);
    assert_eq!(to_flat(&shape, [0, 0, 1]), 1);
  }

  #[test]
  fn degenerate_axes() {
    let line = GridShape::line(5).unwrap();
    assert_eq!(line.dim(), 1);
    assert_eq!(line.npoints(), 6);
    assert_eq!(line.strides(), [1, 1, 1]);
    assert_eq!(to_flat(&line, [4, 0, 0]), 4);

    let plane = GridShape::plane(2, 3).unwrap();
    assert_eq!(plane.dim(), 2);
    assert_eq!(plane.npoints(), 12);
    assert_eq!(plane.strides(), [4, 1, 1]);
    assert!(!plane.is_present(Axis::Z));
  }

  #[test]
  fn invalid_shapes() {
    assert!(GridShape::new(0, 2, 2).is_err());
    assert!(GridShape::new(2, 0, 2).is_err());
  }

  #[test]
  fn point_count_overflow() {
    assert!(matches!(
      GridShape::line(usize::MAX),
      Err(LaplaceError::InvalidGrid { .. })
    ));
    let big = 1 << (usize::BITS / 2);
    assert!(matches!(
      GridShape::volume(big, big, 1),
      Err(LaplaceError::InvalidGrid { .. })
    ));
    let shape = GridShape::plane(big - 2, 0xff).unwrap();
    assert_eq!(shape.npoints(), (big - 1) * 0x100);
  }

  #[test]
  fn spacing_validation() {
    let shape = GridShape::plane(2, 2).unwrap();
    assert!(Spacing::new(0.5, 0.5, 1.0).validate(&shape).is_ok());
    assert!(Spacing::new(0.5, 0.0, 1.0).validate(&shape).is_err());
    // placeholder of an absent axis is never looked at
    assert!(Spacing::new(0.5, 0.5, -1.0).validate(&shape).is_ok());
    assert_eq!(Spacing::new(0.5, 0.25, 7.0).effective(&shape), [0.5, 0.25, 1.0]);
  }
}
