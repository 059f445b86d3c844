//! LU factorization with partial pivoting.

use crate::cancel;
use crate::error::{ModelError, ModelResult};

use super::super::coefficient::Field;
use super::super::dense::Matrix;
use super::{permutation_matrix, Plu};

/// Packed `L\U` factors of a row-permuted matrix.
#[derive(Debug, Clone)]
pub(crate) struct LuFactors<T> {
    /// Column-major; `U` on and above the diagonal, the multipliers of `L` below.
    pub(crate) values: Vec<T>,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    /// Row `i` of `L·U` is row `perm[i]` of the input.
    pub(crate) perm: Vec<usize>,
    pub(crate) odd_permutation: bool,
    pub(crate) non_singular: bool,
}

/// Gaussian elimination with partial pivoting on a column-major array.
///
/// A pivot smaller in magnitude than `pivot_floor` is replaced by it, which
/// keeps shifted systems solvable during inverse iteration.
pub(crate) fn factor<T: Field>(
    mut values: Vec<T>,
    rows: usize,
    cols: usize,
    pivot_floor: Option<f64>,
) -> ModelResult<LuFactors<T>> {
    let mut perm: Vec<usize> = (0..rows).collect();
    let mut odd_permutation = false;
    let mut non_singular = true;

    for k in 0..rows.min(cols) {
        cancel::check()?;

        let mut pivot_row = k;
        let mut largest = values[k * rows + k].magnitude();
        for i in k + 1..rows {
            let magnitude = values[k * rows + i].magnitude();
            if magnitude > largest {
                largest = magnitude;
                pivot_row = i;
            }
        }
        if pivot_row != k {
            for j in 0..cols {
                values.swap(j * rows + k, j * rows + pivot_row);
            }
            perm.swap(k, pivot_row);
            odd_permutation = !odd_permutation;
        }

        if let Some(floor) = pivot_floor {
            if largest.is_nan() || largest < floor {
                values[k * rows + k] = T::from_real(floor);
                largest = floor;
            }
        }
        if largest == 0.0 || largest.is_nan() {
            non_singular = false;
            continue;
        }

        let pivot = values[k * rows + k].reciprocal();
        for i in k + 1..rows {
            values[k * rows + i] = values[k * rows + i].times(pivot);
        }
        for j in k + 1..cols {
            let factor = values[j * rows + k];
            if factor == T::ZERO {
                continue;
            }
            for i in k + 1..rows {
                let update = values[k * rows + i].times(factor);
                values[j * rows + i] = values[j * rows + i].minus(update);
            }
        }
    }

    Ok(LuFactors {
        values,
        rows,
        cols,
        perm,
        odd_permutation,
        non_singular,
    })
}

impl<T: Field> LuFactors<T> {
    fn at(&self, row: usize, col: usize) -> T {
        self.values[col * self.rows + row]
    }

    /// Solve `A·x = b` in place for a square factorization.
    pub(crate) fn solve_in_place(&self, rhs: &mut [T]) {
        let n = self.rows;
        let permuted: Vec<T> = self.perm.iter().map(|&i| rhs[i]).collect();
        rhs.copy_from_slice(&permuted);

        for i in 0..n {
            let mut sum = rhs[i];
            for j in 0..i {
                sum = sum.minus(self.at(i, j).times(rhs[j]));
            }
            rhs[i] = sum;
        }
        for i in (0..n).rev() {
            let mut sum = rhs[i];
            for j in i + 1..n {
                sum = sum.minus(self.at(i, j).times(rhs[j]));
            }
            rhs[i] = sum.times(self.at(i, i).reciprocal());
        }
    }

    /// Product of `U`'s diagonal, negated for an odd permutation.
    pub(crate) fn determinant(&self) -> T {
        let product = (0..self.rows.min(self.cols))
            .map(|i| self.at(i, i))
            .fold(T::ONE, T::times);
        if self.odd_permutation {
            product.negated()
        } else {
            product
        }
    }
}

impl<T: Field> Matrix<T> {
    pub(crate) fn lu_factors(&self) -> ModelResult<LuFactors<T>> {
        factor(self.as_column_major_vec(), self.rows(), self.cols(), None)
    }

    /// Partial-pivoting LU of an `m × n` matrix: `P` is `m × m`, `L` is
    /// `m × k` and `U` is `k × n` with `k = min(m, n)`.
    pub fn plu(&self) -> ModelResult<Plu<T>> {
        let (m, n) = self.shape();
        tracing::debug!(rows = m, cols = n, "plu");
        let lu = self.lu_factors()?;
        let k = m.min(n);
        let l = Matrix::from_fn(m, k, |r, c| match r.cmp(&c) {
            std::cmp::Ordering::Greater => lu.at(r, c),
            std::cmp::Ordering::Equal => T::ONE,
            std::cmp::Ordering::Less => T::ZERO,
        })?;
        let u = Matrix::from_fn(k, n, |r, c| if r <= c { lu.at(r, c) } else { T::ZERO })?;
        let p = permutation_matrix(&lu.perm)?;
        tracing::debug!(non_singular = lu.non_singular, "plu done");
        Ok(Plu {
            p,
            l,
            u,
            non_singular: lu.non_singular,
        })
    }

    /// Determinant through PLU; the sign comes from the permutation parity.
    pub fn determinant(&self) -> ModelResult<T> {
        if !self.is_square() {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.lu_factors()?.determinant())
    }
}
