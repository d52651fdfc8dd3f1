/// Sparse matrix builder in triplet (COO) form.
///
/// Zero entries are never stored.
#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    Self {
      nrows,
      ncols,
      triplets,
    }
  }
  pub fn with_capacity(nrows: usize, ncols: usize, capacity: usize) -> Self {
    Self::new(nrows, ncols, Vec::with_capacity(capacity))
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn nnz(&self) -> usize {
    self.triplets.len()
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn into_parts(self) -> (usize, usize, Vec<(usize, usize, f64)>) {
    (self.nrows, self.ncols, self.triplets)
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows() && c < self.ncols());
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  /// Sum of all stored entries at `(r, c)`.
  pub fn get(&self, r: usize, c: usize) -> f64 {
    self
      .triplets
      .iter()
      .filter(|t| t.0 == r && t.1 == c)
      .map(|t| t.2)
      .sum()
  }

  /// Column indices of the stored entries of row `r`, sorted.
  pub fn row_pattern(&self, r: usize) -> Vec<usize> {
    let mut cols: Vec<_> = self
      .triplets
      .iter()
      .filter(|t| t.0 == r)
      .map(|t| t.1)
      .collect();
    cols.sort_unstable();
    cols.dedup();
    cols
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let rows = self.triplets.iter().map(|t| t.0).collect();
    let cols = self.triplets.iter().map(|t| t.1).collect();
    let vals = self.triplets.iter().map(|t| t.2).collect();
    nas::CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals)
      .expect("triplets are checked against the matrix size on push")
  }

  pub fn to_nalgebra_csr(&self) -> nas::CsrMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }
}

#[cfg(test)]
mod test {
  use super::SparseMatrix;

  #[test]
  fn zeros_are_dropped() {
    let mut mat = SparseMatrix::zeros(3, 3);
    mat.push(0, 0, 1.0);
    mat.push(0, 1, 0.0);
    mat.push(2, 1, -2.0);
    assert_eq!(mat.nnz(), 2);
    assert_eq!(mat.row_pattern(0), vec![0]);
    assert_eq!(mat.get(2, 1), -2.0);
    assert_eq!(mat.get(1, 1), 0.0);
  }

  #[test]
  fn conversions_agree() {
    let mut mat = SparseMatrix::zeros(2, 3);
    mat.push(0, 2, 4.0);
    mat.push(1, 0, -1.0);
    mat.push(1, 0, 0.5);

    #[rustfmt::skip]
    let expected = na::DMatrix::from_row_slice(2, 3, &[
      0.0, 0.0, 4.0,
      -0.5, 0.0, 0.0,
    ]);
    assert_eq!(mat.to_nalgebra_dense(), expected);

    let csr = mat.to_nalgebra_csr();
    assert_eq!(csr.nrows(), 2);
    assert_eq!(csr.ncols(), 3);
    assert_eq!(csr.nnz(), 2);
  }
}
