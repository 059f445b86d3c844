//! Reconstruction laws for the factorizations on random real and complex input.

mod common;

use common::{positive_definite, product, random_complex, random_real, relative_error};
use model_runtime::matrix::{Coefficient, Field};
use model_runtime::prelude::*;

const TOLERANCE: f64 = 1e-10;

fn assert_close<T: Field>(actual: &Matrix<T>, expected: &Matrix<T>, what: &str) {
    let error = relative_error(actual, expected);
    assert!(error < TOLERANCE, "{what}: relative error {error:e}");
}

fn assert_orthonormal_columns<T: Field>(q: &Matrix<T>, what: &str) {
    let gram = q.adjoint().unwrap().multiply(q).unwrap();
    assert_close(&gram, &Matrix::identity(q.cols()).unwrap(), what);
}

fn check_plu<T: Field>(a: &Matrix<T>) {
    let plu = a.plu().unwrap();
    assert!(plu.non_singular);
    assert_close(&product(&[&plu.p, &plu.l, &plu.u]), a, "P·L·U");
    for c in 1..=a.cols() as i64 {
        assert_eq!(plu.l.get(c, c).unwrap(), T::ONE);
        for r in 1..c {
            assert_eq!(plu.l.get(r, c).unwrap(), T::ZERO);
        }
        for r in c + 1..=a.rows() as i64 {
            assert_eq!(plu.u.get(r, c).unwrap(), T::ZERO);
        }
    }
}

fn check_svd<T: Field>(a: &Matrix<T>) {
    let svd = a.svd().unwrap();
    assert!(svd.ok);
    let s = svd.s.apply(T::from_real).unwrap();
    assert_close(&product(&[&svd.u, &s, &svd.v_adjoint]), a, "U·S·Vᴴ");
    assert_orthonormal_columns(&svd.u, "UᴴU");
    assert_orthonormal_columns(&svd.v_adjoint.adjoint().unwrap(), "VᴴV");
    let diagonal = svd.s.diagonal_entries().unwrap().as_column_major_vec();
    assert!(diagonal.windows(2).all(|pair| pair[0] >= pair[1]));
    assert!(diagonal.iter().all(|&sigma| sigma >= 0.0));
}

fn check_qr<T: Field>(a: &Matrix<T>) {
    let qr = a.qr().unwrap();
    assert!(qr.ok);
    assert_eq!(qr.q.shape(), a.shape());
    assert_close(&qr.q.multiply(&qr.r).unwrap(), a, "Q·R");
    assert_orthonormal_columns(&qr.q, "QᴴQ");
    for c in 1..=qr.r.cols() as i64 {
        for r in c + 1..=qr.r.rows() as i64 {
            assert_eq!(qr.r.get(r, c).unwrap(), T::ZERO);
        }
    }
}

fn check_lq<T: Field>(a: &Matrix<T>) {
    let lq = a.lq().unwrap();
    assert!(lq.ok);
    assert_close(&lq.l.multiply(&lq.q).unwrap(), a, "L·Q");
    assert_orthonormal_columns(&lq.q.adjoint().unwrap(), "Q·Qᴴ");
}

fn check_cholesky<T: Field>(a: &Matrix<T>) {
    let spd = positive_definite(a);
    let l = spd.cholesky().unwrap();
    assert_close(&l.multiply(&l.adjoint().unwrap()).unwrap(), &spd, "L·Lᴴ");
    let u = spd.upper_cholesky().unwrap();
    assert_close(&u.adjoint().unwrap().multiply(&u).unwrap(), &spd, "Uᴴ·U");
}

fn check_hessenberg_and_schur<T: Field>(a: &Matrix<T>) {
    let hess = a.hessenberg().unwrap();
    let q_adjoint = hess.q.adjoint().unwrap();
    assert_close(&product(&[&hess.q, &hess.h, &q_adjoint]), a, "Q·H·Qᴴ");
    for c in 1..=a.cols() as i64 {
        for r in c + 2..=a.rows() as i64 {
            assert_eq!(hess.h.get(r, c).unwrap(), T::ZERO);
        }
    }

    let schur = a.schur().unwrap();
    assert!(schur.ok);
    let q_adjoint = schur.q.adjoint().unwrap();
    assert_close(&product(&[&schur.q, &schur.u, &q_adjoint]), a, "Q·U·Qᴴ");
    assert_orthonormal_columns(&schur.q, "Schur QᴴQ");
}

fn check_eigenvectors<T: Field>(a: &Matrix<T>) {
    let eigen = a.eigenvectors().unwrap();
    assert!(eigen.ok);
    assert_eq!(eigen.vectors.len(), a.rows());
    let complex_a = a.apply(|x| x.to_complex()).unwrap();
    let scale = complex_a.euclidean_norm();
    for (lambda, v) in eigen.values.iter().zip(&eigen.vectors) {
        assert!((v.euclidean_norm() - 1.0).abs() < 1e-12);
        let residual = complex_a
            .multiply(v)
            .unwrap()
            .subtract(&v.scale(lambda).unwrap())
            .unwrap()
            .euclidean_norm();
        assert!(residual < 1e-8 * scale, "‖A·v − λ·v‖ = {residual:e} for λ = {lambda}");
    }
}

fn check_inverse_and_solve<T: Field>(a: &Matrix<T>, b: &Matrix<T>) {
    let inverse = a.inverse().unwrap();
    let identity = Matrix::identity(a.rows()).unwrap();
    assert_close(&a.multiply(&inverse).unwrap(), &identity, "A·A⁻¹");
    let x = a.solve(b).unwrap();
    assert_close(&a.multiply(&x).unwrap(), b, "A·X");
}

// ==================== Real ====================

#[test]
fn test_real_square_factorizations() {
    let a = random_real(7, 7, 1);
    check_plu(&a);
    check_svd(&a);
    check_qr(&a);
    check_lq(&a);
    check_cholesky(&a);
    check_hessenberg_and_schur(&a);
    check_eigenvectors(&a);
    check_inverse_and_solve(&a, &random_real(7, 3, 2));
}

#[test]
fn test_real_rectangular_factorizations() {
    let tall = random_real(9, 5, 3);
    check_svd(&tall);
    check_qr(&tall);
    let wide = random_real(4, 8, 4);
    check_svd(&wide);
    check_lq(&wide);
    assert!(matches!(
        wide.qr(),
        Err(ModelError::InvalidMatrixDimensions { rows: 4, cols: 8 })
    ));
}

#[test]
fn test_real_bunch_kaufman() {
    let a = random_real(6, 6, 5);
    let symmetric = a.add(&a.transpose().unwrap()).unwrap();
    for bk in [
        symmetric.bunch_kaufman().unwrap(),
        symmetric.upper_bunch_kaufman().unwrap(),
    ] {
        assert!(bk.non_singular);
        let rebuilt = product(&[
            &bk.p,
            &bk.factor,
            &bk.block_diagonal,
            &bk.factor.transpose().unwrap(),
            &bk.p.transpose().unwrap(),
        ]);
        assert_close(&rebuilt, &symmetric, "P·F·D·Fᵀ·Pᵀ");
    }
}

// ==================== Complex ====================

#[test]
fn test_complex_square_factorizations() {
    let a = random_complex(6, 6, 6);
    check_plu(&a);
    check_svd(&a);
    check_qr(&a);
    check_lq(&a);
    check_cholesky(&a);
    check_hessenberg_and_schur(&a);
    check_eigenvectors(&a);
    check_inverse_and_solve(&a, &random_complex(6, 2, 7));
}

#[test]
fn test_complex_rectangular_factorizations() {
    let tall = random_complex(8, 3, 8);
    check_svd(&tall);
    check_qr(&tall);
    let wide = random_complex(3, 7, 9);
    check_svd(&wide);
    check_lq(&wide);
}

// ==================== Transforms and rank ====================

#[test]
fn test_idft_inverts_dft() {
    let signal = random_complex(16, 3, 10);
    let round_trip = signal.dft().unwrap().idft().unwrap();
    assert_close(&round_trip, &signal, "idft(dft(x))");

    let odd = random_complex(7, 1, 11);
    assert_close(&odd.dft().unwrap().idft().unwrap(), &odd, "idft(dft(x)) odd length");
}

#[test]
fn test_dft_satisfies_parseval() {
    let x = random_complex(12, 1, 12);
    let energy = x.euclidean_norm().powi(2);
    let spectrum = x.dft().unwrap().euclidean_norm().powi(2);
    assert!((spectrum - 12.0 * energy).abs() < 1e-10 * spectrum);
}

#[test]
fn test_rank_and_least_squares() {
    let low_rank = random_real(6, 2, 13).multiply(&random_real(2, 5, 14)).unwrap();
    assert_eq!(low_rank.rank(1e-10).unwrap(), 2);
    assert!(low_rank.condition_number().unwrap() > 1e10);

    let a = random_real(10, 4, 15);
    let b = random_real(10, 1, 16);
    let x = a.least_squares(&b, 1e-12).unwrap();
    // The residual of a least-squares solution is orthogonal to the columns of A.
    let residual = a.multiply(&x).unwrap().subtract(&b).unwrap();
    let normal = a.transpose().unwrap().multiply(&residual).unwrap();
    assert!(normal.euclidean_norm() < 1e-10);
}

#[test]
fn test_equilibration_is_power_of_two_and_not_worse() {
    let a = Matrix::from_fn(5, 5, |r, c| {
        let base = random_real(5, 5, 17).get(r as i64 + 1, c as i64 + 1).unwrap_or(0.0);
        base * 10f64.powi(r as i32 * 3 - 6)
    })
    .unwrap();
    let eq = a.equilibrate().unwrap();
    assert!(eq.ok);
    let row = eq.row.diagonal_entries().unwrap();
    let col = eq.col.diagonal_entries().unwrap();
    for d in row.iter().chain(col.iter()) {
        assert_eq!(d.log2().fract(), 0.0, "{d} is not a power of two");
    }
    let scaled = product(&[&eq.row, &a, &eq.col]);
    let before = a.condition_number().unwrap();
    let after = scaled.condition_number().unwrap();
    assert!(after <= 1.10 * before, "{after} > 1.10 * {before}");
}

#[test]
fn test_singular_input_is_reported() {
    let a = Matrix::from_row_major(2, 2, &[1.0, 2.0, 2.0, 4.0]).unwrap();
    assert!(!a.plu().unwrap().non_singular);
    assert_eq!(a.determinant().unwrap(), 0.0);
    assert_eq!(a.solve(&random_real(2, 1, 18)).unwrap_err(), ModelError::MatrixIsSingular);
    let not_positive = Matrix::from_row_major(2, 2, &[1.0, 2.0, 2.0, 1.0]).unwrap();
    assert_eq!(not_positive.cholesky().unwrap_err(), ModelError::MatrixIsSingular);
}
