//! Bunch-Kaufman factorization of symmetric indefinite matrices.
//!
//! Only one triangle of the input is read: the lower one for
//! `bunch_kaufman`, the upper one for `upper_bunch_kaufman`. The symmetry is
//! plain transposition, so complex symmetric (not Hermitian) matrices are
//! factored as such.

use crate::cancel;
use crate::error::{ModelError, ModelResult};

use super::super::coefficient::Field;
use super::super::dense::Matrix;
use super::{permutation_matrix, BunchKaufman};

/// Pivot threshold `(1 + √17) / 8` balancing element growth against 2×2 pivots.
pub const BUNCH_KAUFMAN_ALPHA: f64 = 0.640_388_203_202_208_0;

/// Dense symmetric working copy with the factors built alongside.
struct Workspace<T> {
    n: usize,
    a: Vec<T>,
    l: Vec<T>,
    d: Vec<T>,
    perm: Vec<usize>,
}

impl<T: Field> Workspace<T> {
    fn idx(&self, row: usize, col: usize) -> usize {
        col * self.n + row
    }

    fn a(&self, row: usize, col: usize) -> T {
        self.a[self.idx(row, col)]
    }

    fn set_a(&mut self, row: usize, col: usize, value: T) {
        let i = self.idx(row, col);
        self.a[i] = value;
    }

    /// Symmetric exchange of rows and columns `i` and `j` of the trailing
    /// block starting at `k`, carrying the finished rows of `L` along.
    fn interchange(&mut self, k: usize, i: usize, j: usize) {
        if i == j {
            return;
        }
        let n = self.n;
        for c in k..n {
            let (x, y) = (self.idx(i, c), self.idx(j, c));
            self.a.swap(x, y);
        }
        for r in k..n {
            let (x, y) = (self.idx(r, i), self.idx(r, j));
            self.a.swap(x, y);
        }
        for c in 0..k {
            let (x, y) = (self.idx(i, c), self.idx(j, c));
            self.l.swap(x, y);
        }
        self.perm.swap(i, j);
    }

    fn largest_off_diagonal_in_column(&self, k: usize) -> (f64, usize) {
        let mut best = (0.0, k);
        for i in k + 1..self.n {
            let magnitude = self.a(i, k).magnitude();
            if magnitude > best.0 {
                best = (magnitude, i);
            }
        }
        best
    }

    fn largest_off_diagonal_in_row(&self, k: usize, row: usize) -> f64 {
        (k..self.n)
            .filter(|&j| j != row)
            .map(|j| self.a(row, j).magnitude())
            .fold(0.0, f64::max)
    }
}

/// Lower factorization `A = P·L·D·Lᵀ·Pᵀ` of the lower triangle of `values`.
fn factor_lower<T: Field>(values: &[T], n: usize) -> ModelResult<(Vec<T>, Vec<T>, Vec<usize>, bool)> {
    let mut a = vec![T::ZERO; n * n];
    for c in 0..n {
        for r in 0..n {
            let (lo, hi) = if r >= c { (r, c) } else { (c, r) };
            a[c * n + r] = values[hi * n + lo];
        }
    }
    let mut ws = Workspace {
        n,
        a,
        l: vec![T::ZERO; n * n],
        d: vec![T::ZERO; n * n],
        perm: (0..n).collect(),
    };
    let mut non_singular = true;

    let mut k = 0;
    while k < n {
        cancel::check()?;
        let diagonal = ws.a(k, k).magnitude();
        let (column_max, imax) = ws.largest_off_diagonal_in_column(k);

        if diagonal.max(column_max) == 0.0 || diagonal.max(column_max).is_nan() {
            non_singular = false;
            let i = ws.idx(k, k);
            ws.l[i] = T::ONE;
            k += 1;
            continue;
        }

        let two_by_two = if diagonal >= BUNCH_KAUFMAN_ALPHA * column_max {
            false
        } else {
            let row_max = ws.largest_off_diagonal_in_row(k, imax);
            if diagonal * row_max >= BUNCH_KAUFMAN_ALPHA * column_max * column_max {
                false
            } else if ws.a(imax, imax).magnitude() >= BUNCH_KAUFMAN_ALPHA * row_max {
                ws.interchange(k, k, imax);
                false
            } else {
                true
            }
        };

        if !two_by_two {
            let pivot = ws.a(k, k);
            let inverse = pivot.reciprocal();
            let i = ws.idx(k, k);
            ws.d[i] = pivot;
            ws.l[i] = T::ONE;
            let multipliers: Vec<T> = (k + 1..n).map(|r| ws.a(r, k).times(inverse)).collect();
            for (offset, &m) in multipliers.iter().enumerate() {
                let idx = ws.idx(k + 1 + offset, k);
                ws.l[idx] = m;
            }
            for c in k + 1..n {
                let akc = ws.a(k, c);
                for r in k + 1..n {
                    let updated = ws.a(r, c).minus(multipliers[r - k - 1].times(akc));
                    ws.set_a(r, c, updated);
                }
            }
            k += 1;
        } else {
            ws.interchange(k, k + 1, imax);
            let (d11, d21, d22) = (ws.a(k, k), ws.a(k + 1, k), ws.a(k + 1, k + 1));
            let det = d11.times(d22).minus(d21.times(d21));
            if det == T::ZERO {
                non_singular = false;
            }
            let inv_det = det.reciprocal();
            // D⁻¹ = [d22, -d21; -d21, d11] / det
            let (e11, e21, e22) = (
                d22.times(inv_det),
                d21.negated().times(inv_det),
                d11.times(inv_det),
            );
            for (r, c, v) in [(k, k, d11), (k + 1, k, d21), (k, k + 1, d21), (k + 1, k + 1, d22)] {
                let i = ws.idx(r, c);
                ws.d[i] = v;
            }
            let (i0, i1) = (ws.idx(k, k), ws.idx(k + 1, k + 1));
            ws.l[i0] = T::ONE;
            ws.l[i1] = T::ONE;

            let mut multipliers = Vec::with_capacity(n.saturating_sub(k + 2));
            for r in k + 2..n {
                let (x, y) = (ws.a(r, k), ws.a(r, k + 1));
                let first = x.times(e11).plus(y.times(e21));
                let second = x.times(e21).plus(y.times(e22));
                multipliers.push((first, second));
            }
            for (offset, &(first, second)) in multipliers.iter().enumerate() {
                let r = k + 2 + offset;
                let (a, b) = (ws.idx(r, k), ws.idx(r, k + 1));
                ws.l[a] = first;
                ws.l[b] = second;
            }
            for c in k + 2..n {
                let (akc, ak1c) = (ws.a(k, c), ws.a(k + 1, c));
                for r in k + 2..n {
                    let (first, second) = multipliers[r - k - 2];
                    let update = first.times(akc).plus(second.times(ak1c));
                    let updated = ws.a(r, c).minus(update);
                    ws.set_a(r, c, updated);
                }
            }
            k += 2;
        }
    }

    Ok((ws.l, ws.d, ws.perm, non_singular))
}

impl<T: Field> Matrix<T> {
    fn require_square_for_bunch_kaufman(&self) -> ModelResult<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows(),
                cols: self.cols(),
            })
        }
    }

    /// `A = P·L·D·Lᵀ·Pᵀ` from the lower triangle of `A`.
    pub fn bunch_kaufman(&self) -> ModelResult<BunchKaufman<T>> {
        self.require_square_for_bunch_kaufman()?;
        let n = self.rows();
        tracing::debug!(n, "bunch-kaufman");
        let (l, d, perm, non_singular) = factor_lower(&self.as_column_major_vec(), n)?;
        tracing::debug!(non_singular, "bunch-kaufman done");
        Ok(BunchKaufman {
            factor: Matrix::from_column_major(n, n, &l)?,
            block_diagonal: Matrix::from_column_major(n, n, &d)?,
            p: permutation_matrix(&perm)?,
            non_singular,
        })
    }

    /// `A = P·U·D·Uᵀ·Pᵀ` from the upper triangle of `A`, with unit upper-triangular `U`.
    pub fn upper_bunch_kaufman(&self) -> ModelResult<BunchKaufman<T>> {
        self.require_square_for_bunch_kaufman()?;
        // With J the exchange matrix, J·A·J turns the upper triangle into the
        // lower one and J·X·J maps every lower factor back to upper form.
        let flip = |m: &Matrix<T>| -> ModelResult<Matrix<T>> { m.row_reverse()?.column_reverse() };
        let lower = flip(self)?.bunch_kaufman()?;
        Ok(BunchKaufman {
            factor: flip(&lower.factor)?,
            block_diagonal: flip(&lower.block_diagonal)?,
            p: flip(&lower.p)?,
            non_singular: lower.non_singular,
        })
    }
}
