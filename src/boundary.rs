//! Dirichlet boundary conditions on the axis faces of the lattice.
//!
//! Applying the faces partitions all lattice points into fixed
//! (boundary) and free (interior) points. Points on edges and corners
//! are shared by several faces; the first face to claim a point wins
//! and any later, differing value is reported as a [`BcConflict`].

use crate::{
  error::{LaplaceError, LaplaceResult},
  grid::{self, Axis, FlatIdx, GridCoord, GridShape},
};

use itertools::iproduct;

pub const DEFAULT_CONFLICT_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
  Low,
  High,
}
impl std::fmt::Display for Face {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Face::Low => write!(f, "low"),
      Face::High => write!(f, "high"),
    }
  }
}

/// Prescribed potential on one face.
///
/// Indexed by the coordinates of the two complementary axes
/// in ascending axis order. Absent axes have extent one,
/// so a 1D face is a scalar and a 2D face is a line.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletFace {
  values: na::DMatrix<f64>,
}

// constructors
impl DirichletFace {
  pub fn new(values: na::DMatrix<f64>) -> Self {
    Self { values }
  }
  pub fn scalar(value: f64) -> Self {
    Self::constant(1, 1, value)
  }
  pub fn constant(nrows: usize, ncols: usize, value: f64) -> Self {
    Self::new(na::DMatrix::from_element(nrows, ncols, value))
  }
  pub fn line(values: na::DVector<f64>) -> Self {
    Self::new(na::DMatrix::from_iterator(values.len(), 1, values.iter().copied()))
  }
  pub fn plane(values: na::DMatrix<f64>) -> Self {
    Self::new(values)
  }
  pub fn from_fn<F>(nrows: usize, ncols: usize, f: F) -> Self
  where
    F: FnMut(usize, usize) -> f64,
  {
    Self::new(na::DMatrix::from_fn(nrows, ncols, f))
  }
}

// getters
impl DirichletFace {
  pub fn shape(&self) -> (usize, usize) {
    self.values.shape()
  }
  pub fn get(&self, p: usize, q: usize) -> f64 {
    self.values[(p, q)]
  }
  pub fn values(&self) -> &na::DMatrix<f64> {
    &self.values
  }
}

impl From<f64> for DirichletFace {
  fn from(value: f64) -> Self {
    Self::scalar(value)
  }
}
impl From<na::DVector<f64>> for DirichletFace {
  fn from(values: na::DVector<f64>) -> Self {
    Self::line(values)
  }
}
impl From<na::DMatrix<f64>> for DirichletFace {
  fn from(values: na::DMatrix<f64>) -> Self {
    Self::plane(values)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisBoundary {
  pub low: DirichletFace,
  pub high: DirichletFace,
}
impl AxisBoundary {
  pub fn new(low: DirichletFace, high: DirichletFace) -> Self {
    Self { low, high }
  }
  pub fn face(&self, face: Face) -> &DirichletFace {
    match face {
      Face::Low => &self.low,
      Face::High => &self.high,
    }
  }
}

/// Face values for every present axis of a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridBoundary {
  axes: [Option<AxisBoundary>; 3],
}
impl GridBoundary {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pairs up low and high faces per axis, starting at the x axis.
  pub fn from_faces(lows: Vec<DirichletFace>, highs: Vec<DirichletFace>) -> Self {
    let mut this = Self::new();
    for ((axis, low), high) in Axis::ALL.into_iter().zip(lows).zip(highs) {
      this.set(axis, AxisBoundary::new(low, high));
    }
    this
  }

  pub fn with_axis(mut self, axis: Axis, low: DirichletFace, high: DirichletFace) -> Self {
    self.set(axis, AxisBoundary::new(low, high));
    self
  }
  pub fn set(&mut self, axis: Axis, boundary: AxisBoundary) {
    self.axes[axis.index()] = Some(boundary);
  }
  pub fn axis(&self, axis: Axis) -> Option<&AxisBoundary> {
    self.axes[axis.index()].as_ref()
  }

  /// Expected face shape of `axis` on `shape`.
  pub fn face_shape(shape: &GridShape, axis: Axis) -> (usize, usize) {
    let [b, c] = axis.complement();
    (shape.extent(b), shape.extent(c))
  }

  /// Checks that every present axis has finite faces of exactly the right shape.
  pub fn validate(&self, shape: &GridShape) -> LaplaceResult<()> {
    for axis in shape.present_axes() {
      let boundary = self
        .axis(axis)
        .ok_or(LaplaceError::MissingBoundary { axis })?;
      let expected = Self::face_shape(shape, axis);
      for face in [Face::Low, Face::High] {
        let values = boundary.face(face).values();
        let found = values.shape();
        if found != expected {
          return Err(LaplaceError::ShapeMismatch {
            axis,
            face,
            expected,
            found,
          });
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
          return Err(LaplaceError::InvalidGrid {
            reason: format!("{face} {axis} face holds non-finite value {v}"),
          });
        }
      }
    }
    for axis in Axis::ALL {
      if !shape.is_present(axis) && self.axis(axis).is_some() {
        tracing::debug!("ignoring boundary values of absent axis {axis}");
      }
    }
    Ok(())
  }
}

/// Two faces prescribing different values on a shared lattice point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BcConflict {
  pub index: FlatIdx,
  pub coord: GridCoord,
  /// Value of the first face, which stays in effect.
  pub kept: f64,
  pub rejected: f64,
}
impl std::fmt::Display for BcConflict {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "inconsistent boundary values at {:?}: keeping {}, rejecting {}",
      self.coord, self.kept, self.rejected
    )
  }
}

/// Fixed/free classification of all lattice points.
#[derive(Debug, Clone)]
pub struct BoundaryRegistry {
  shape: GridShape,
  fixed: Vec<Option<f64>>,
  nfixed: usize,
  conflicted: Vec<bool>,
  conflicts: Vec<BcConflict>,
  conflict_tol: f64,
}

impl BoundaryRegistry {
  /// All points start out free.
  pub fn new(shape: GridShape, conflict_tol: f64) -> Self {
    let npoints = shape.npoints();
    Self {
      shape,
      fixed: vec![None; npoints],
      nfixed: 0,
      conflicted: vec![false; npoints],
      conflicts: Vec::new(),
      conflict_tol,
    }
  }

  pub fn shape(&self) -> &GridShape {
    &self.shape
  }
  pub fn npoints(&self) -> usize {
    self.fixed.len()
  }
  pub fn is_fixed(&self, idx: FlatIdx) -> bool {
    self.fixed[idx].is_some()
  }
  pub fn fixed_value(&self, idx: FlatIdx) -> Option<f64> {
    self.fixed[idx]
  }
  pub fn nfixed(&self) -> usize {
    self.nfixed
  }
  pub fn nfree(&self) -> usize {
    self.npoints() - self.nfixed
  }
  pub fn free_indices(&self) -> impl Iterator<Item = FlatIdx> + '_ {
    self
      .fixed
      .iter()
      .enumerate()
      .filter_map(|(idx, v)| v.is_none().then_some(idx))
  }
  pub fn fixed_values(&self) -> impl Iterator<Item = (FlatIdx, f64)> + '_ {
    self
      .fixed
      .iter()
      .enumerate()
      .filter_map(|(idx, v)| v.map(|v| (idx, v)))
  }
  pub fn conflicts(&self) -> &[BcConflict] {
    &self.conflicts
  }
  pub fn into_conflicts(self) -> Vec<BcConflict> {
    self.conflicts
  }

  /// Fixes one point to `value`.
  ///
  /// An already fixed point keeps its value. A differing value is
  /// recorded as conflict, at most once per point.
  pub fn fix(&mut self, idx: FlatIdx, value: f64) -> Option<BcConflict> {
    let Some(kept) = self.fixed[idx] else {
      self.fixed[idx] = Some(value);
      self.nfixed += 1;
      return None;
    };

    let consistent = approx::relative_eq!(
      kept,
      value,
      epsilon = self.conflict_tol,
      max_relative = self.conflict_tol
    );
    if consistent || self.conflicted[idx] {
      return None;
    }

    let conflict = BcConflict {
      index: idx,
      coord: grid::to_coord(&self.shape, idx),
      kept,
      rejected: value,
    };
    tracing::warn!("{conflict}");
    self.conflicted[idx] = true;
    self.conflicts.push(conflict);
    Some(conflict)
  }

  /// Fixes the opposing points of a low and a high face.
  pub fn apply_boundary(
    &mut self,
    idx_low: FlatIdx,
    idx_high: FlatIdx,
    value_low: f64,
    value_high: f64,
  ) {
    self.fix(idx_low, value_low);
    self.fix(idx_high, value_high);
  }

  /// Sweeps the faces of all present axes in x, y, z order.
  ///
  /// `boundary` must have been validated against the registry's shape.
  pub fn apply_grid_boundary(&mut self, boundary: &GridBoundary) {
    let shape = self.shape;
    for axis in shape.present_axes() {
      let Some(faces) = boundary.axis(axis) else {
        continue;
      };
      let [b, c] = axis.complement();
      let nlast = shape.ncells(axis);

      for (p, q) in iproduct!(0..shape.extent(b), 0..shape.extent(c)) {
        let mut coord = [0; 3];
        coord[b.index()] = p;
        coord[c.index()] = q;

        coord[axis.index()] = 0;
        let idx_low = grid::to_flat(&shape, coord);
        coord[axis.index()] = nlast;
        let idx_high = grid::to_flat(&shape, coord);

        self.apply_boundary(idx_low, idx_high, faces.low.get(p, q), faces.high.get(p, q));
      }
    }
    tracing::debug!(
      "classified {} fixed and {} free points",
      self.nfixed(),
      self.nfree()
    );
  }
}
