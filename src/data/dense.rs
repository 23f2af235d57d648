//! Dense row-major matrix storage.
//!
//! Rows are contiguous, which is the access pattern every engine component
//! relies on: per-patient row ranges become contiguous slices, and the
//! expanded output can be handed out as disjoint per-patient chunks.

/// Dense row-major matrix.
///
/// Stores all elements contiguously, row 0 first. Element type defaults to
/// `f64`, the interchange type at the engine boundary.
///
/// # Example
///
/// ```
/// use survbin::data::DenseMatrix;
///
/// let m = DenseMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
/// assert_eq!(m.row_slice(0), &[1.0, 2.0, 3.0]);
/// assert_eq!(m.get(1, 2), Some(6.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T = f64> {
    data: Box<[T]>,
    num_rows: usize,
    num_cols: usize,
}

impl<T> DenseMatrix<T> {
    /// Create a matrix from row-major data, taking ownership.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != num_rows * num_cols`.
    pub fn from_vec(data: Vec<T>, num_rows: usize, num_cols: usize) -> Self {
        assert_eq!(
            data.len(),
            num_rows * num_cols,
            "Data length {} does not match dimensions {}x{}",
            data.len(),
            num_rows,
            num_cols
        );
        Self {
            data: data.into_boxed_slice(),
            num_rows,
            num_cols,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// The underlying row-major data.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The underlying row-major data, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Row `i` as a contiguous slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_rows()`.
    #[inline]
    pub fn row_slice(&self, i: usize) -> &[T] {
        let start = i * self.num_cols;
        &self.data[start..start + self.num_cols]
    }

    /// Iterator over row slices in order.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.num_cols.max(1))
    }
}

impl<T: Copy> DenseMatrix<T> {
    /// Element at (row, col), or `None` if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.num_rows || col >= self.num_cols {
            return None;
        }
        Some(self.data[row * self.num_cols + col])
    }
}

impl DenseMatrix<f64> {
    /// Zero-filled matrix of the given shape.
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self {
            data: vec![0.0; num_rows * num_cols].into_boxed_slice(),
            num_rows,
            num_cols,
        }
    }

    /// Extract a subset of columns, preserving their order, into a new matrix.
    pub fn select_columns(&self, cols: &[usize]) -> DenseMatrix<f64> {
        let mut data = Vec::with_capacity(self.num_rows * cols.len());
        for row in self.rows() {
            for &c in cols {
                data.push(row[c]);
            }
        }
        DenseMatrix::from_vec(data, self.num_rows, cols.len())
    }

    /// Values of a single column, in row order.
    pub fn column_values(&self, col: usize) -> Vec<f64> {
        self.rows().map(|row| row[col]).collect()
    }
}
