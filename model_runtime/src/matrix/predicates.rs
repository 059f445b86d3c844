//! Structural predicates.

use crate::scalar::Complex;

use super::coefficient::{Coefficient, Numeric};
use super::dense::Matrix;

impl<T: Coefficient> Matrix<T> {
    fn all_pairs(&self, f: impl Fn(T, T) -> bool) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows();
        (0..n).all(|c| (0..=c).all(|r| f(self.element(r, c), self.element(c, r))))
    }

    /// `A = Aᵀ`
    pub fn is_symmetric(&self) -> bool {
        self.all_pairs(|upper, lower| upper == lower)
    }

    /// `A = Aᴴ`
    pub fn is_hermitian(&self) -> bool {
        self.all_pairs(|upper, lower| upper == lower.conjugate())
    }
}

impl<T: Numeric> Matrix<T> {
    /// `A = −Aᵀ`
    pub fn is_skew_symmetric(&self) -> bool {
        self.all_pairs(|upper, lower| upper == lower.negated())
    }

    /// `A = −Aᴴ`
    pub fn is_skew_hermitian(&self) -> bool {
        self.all_pairs(|upper, lower| upper == lower.conjugate().negated())
    }

    /// `A·Aᴴ = Aᴴ·A`, compared within `8 ε ‖A‖²`.
    pub fn is_normal(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows();
        let a: Vec<Complex> = self.iter().map(Coefficient::to_complex).collect();
        let at = |r: usize, c: usize| a[c * n + r];

        let mut scale = 0.0;
        for z in &a {
            scale += z.norm_sqr();
        }
        let mut difference = 0.0;
        for i in 0..n {
            for j in 0..n {
                let mut left = Complex::default();
                let mut right = Complex::default();
                for k in 0..n {
                    // (A Aᴴ)ᵢⱼ and (Aᴴ A)ᵢⱼ
                    left += at(i, k) * at(j, k).conj();
                    right += at(k, i).conj() * at(k, j);
                }
                difference += (left - right).norm_sqr();
            }
        }
        difference.sqrt() <= 8.0 * f64::EPSILON * scale
    }
}
