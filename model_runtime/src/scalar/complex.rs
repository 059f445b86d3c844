//! Complex number type.
//!
//! Division is Smith's ratio algorithm applied to a divisor that has first
//! been rescaled by a power of two, so that overflow or underflow in one
//! component does not contaminate the other. When both components of the
//! quotient come out NaN, the result is repaired from the signs of the
//! operands that encode infinities or zeros.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{check_real, ModelResult};

/// Complex number stored as (real, imaginary); 16 bytes, `#[repr(C)]` for matrix storage.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub real: f64,
    pub imag: f64,
}

impl Complex {
    pub const fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    pub const fn from_real(real: f64) -> Self {
        Self { real, imag: 0.0 }
    }

    pub const fn i() -> Self {
        Self {
            real: 0.0,
            imag: 1.0,
        }
    }

    pub fn conj(self) -> Self {
        Self {
            real: self.real,
            imag: -self.imag,
        }
    }

    /// Magnitude, computed without intermediate overflow.
    pub fn norm(self) -> f64 {
        self.real.hypot(self.imag)
    }

    pub fn norm_sqr(self) -> f64 {
        self.real * self.real + self.imag * self.imag
    }

    pub fn arg(self) -> f64 {
        self.imag.atan2(self.real)
    }

    pub fn is_nan(self) -> bool {
        self.real.is_nan() || self.imag.is_nan()
    }

    pub fn is_infinite(self) -> bool {
        !self.is_nan() && (self.real.is_infinite() || self.imag.is_infinite())
    }

    pub fn is_finite(self) -> bool {
        self.real.is_finite() && self.imag.is_finite()
    }

    pub fn is_real(self) -> bool {
        self.imag == 0.0
    }

    pub fn recip(self) -> Self {
        Complex::from_real(1.0) / self
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            real: self.real * factor,
            imag: self.imag * factor,
        }
    }

    /// `e^(iθ)`
    pub fn from_polar(magnitude: f64, phase: f64) -> Self {
        Self {
            real: magnitude * phase.cos(),
            imag: magnitude * phase.sin(),
        }
    }

    /// Principal square root.
    pub fn sqrt(self) -> Self {
        if self.imag == 0.0 && self.real >= 0.0 {
            return Complex::from_real(self.real.sqrt());
        }
        let magnitude = self.norm();
        let real = ((magnitude + self.real) / 2.0).sqrt();
        let imag = ((magnitude - self.real) / 2.0).sqrt().copysign(self.imag);
        Complex::new(real, imag)
    }

    /// Total order used for sorting: real part first, then imaginary part.
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.real
            .total_cmp(&other.real)
            .then_with(|| self.imag.total_cmp(&other.imag))
    }
}

/// Binary exponent of `x` as a float, following IEEE `logb`.
fn logb(x: f64) -> f64 {
    if x == 0.0 {
        return f64::NEG_INFINITY;
    }
    if !x.is_finite() {
        return x.abs();
    }
    let bits = x.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64;
    if exponent == 0 {
        // Subnormal: renormalise first.
        return logb(x * f64::from_bits(0x4350_0000_0000_0000)) - 54.0;
    }
    (exponent - 1023) as f64
}

/// `x · 2ⁿ` without spurious intermediate overflow.
fn scale_by_power_of_two(mut x: f64, mut n: i32) -> f64 {
    let up = f64::from_bits(0x7fe0_0000_0000_0000); // 2^1023
    let down = f64::from_bits(0x0010_0000_0000_0000); // 2^-1022
    while n > 1023 {
        x *= up;
        n -= 1023;
    }
    while n < -1022 {
        x *= down;
        n += 1022;
    }
    x * f64::from_bits(((n + 1023) as u64) << 52)
}

fn divide(lhs: Complex, rhs: Complex) -> Complex {
    let (mut a, mut b) = (lhs.real, lhs.imag);
    let (mut c, mut d) = (rhs.real, rhs.imag);

    let logbw = logb(c.abs().max(d.abs()));
    let mut ilogbw = 0;
    if logbw.is_finite() {
        ilogbw = logbw as i32;
        c = scale_by_power_of_two(c, -ilogbw);
        d = scale_by_power_of_two(d, -ilogbw);
    }

    let (x, y) = if c.abs() >= d.abs() {
        let ratio = d / c;
        let denominator = c + d * ratio;
        ((a + b * ratio) / denominator, (b - a * ratio) / denominator)
    } else {
        let ratio = c / d;
        let denominator = c * ratio + d;
        ((a * ratio + b) / denominator, (b * ratio - a) / denominator)
    };
    let mut x = scale_by_power_of_two(x, -ilogbw);
    let mut y = scale_by_power_of_two(y, -ilogbw);

    if x.is_nan() && y.is_nan() {
        let denominator = c * c + d * d;
        if denominator == 0.0 && (!a.is_nan() || !b.is_nan()) {
            let infinity = f64::INFINITY.copysign(c);
            x = infinity * a;
            y = infinity * b;
        } else if (a.is_infinite() || b.is_infinite()) && c.is_finite() && d.is_finite() {
            a = (if a.is_infinite() { 1.0_f64 } else { 0.0 }).copysign(a);
            b = (if b.is_infinite() { 1.0_f64 } else { 0.0 }).copysign(b);
            x = f64::INFINITY * (a * c + b * d);
            y = f64::INFINITY * (b * c - a * d);
        } else if logbw == f64::INFINITY && a.is_finite() && b.is_finite() {
            c = (if c.is_infinite() { 1.0_f64 } else { 0.0 }).copysign(c);
            d = (if d.is_infinite() { 1.0_f64 } else { 0.0 }).copysign(d);
            x = 0.0 * (a * c + b * d);
            y = 0.0 * (b * c - a * d);
        }
    }

    Complex::new(x, y)
}

/// Reject complex results with a NaN or infinite component when those classes are enabled.
pub fn check_complex(value: Complex) -> ModelResult<Complex> {
    if value.is_nan() || value.is_infinite() {
        check_real(if value.is_nan() { f64::NAN } else { f64::INFINITY })?;
    }
    Ok(value)
}

// ========== Operators ==========

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.real + rhs.real, self.imag + rhs.imag)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.real - rhs.real, self.imag - rhs.imag)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        // (a + bi)(c + di) = (ac - bd) + (ad + bc)i
        Complex::new(
            self.real * rhs.real - self.imag * rhs.imag,
            self.real * rhs.imag + self.imag * rhs.real,
        )
    }
}

impl Div for Complex {
    type Output = Complex;
    fn div(self, rhs: Complex) -> Complex {
        divide(self, rhs)
    }
}

impl Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex::new(-self.real, -self.imag)
    }
}

impl Add<f64> for Complex {
    type Output = Complex;
    fn add(self, rhs: f64) -> Complex {
        Complex::new(self.real + rhs, self.imag)
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;
    fn mul(self, rhs: f64) -> Complex {
        self.scale(rhs)
    }
}

impl Div<f64> for Complex {
    type Output = Complex;
    fn div(self, rhs: f64) -> Complex {
        Complex::new(self.real / rhs, self.imag / rhs)
    }
}

impl AddAssign for Complex {
    fn add_assign(&mut self, rhs: Complex) {
        *self = *self + rhs;
    }
}

impl SubAssign for Complex {
    fn sub_assign(&mut self, rhs: Complex) {
        *self = *self - rhs;
    }
}

impl MulAssign for Complex {
    fn mul_assign(&mut self, rhs: Complex) {
        *self = *self * rhs;
    }
}

impl DivAssign for Complex {
    fn div_assign(&mut self, rhs: Complex) {
        *self = *self / rhs;
    }
}

impl Zero for Complex {
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.real == 0.0 && self.imag == 0.0
    }
}

impl One for Complex {
    fn one() -> Self {
        Complex::from_real(1.0)
    }
}

impl From<f64> for Complex {
    fn from(real: f64) -> Self {
        Complex::from_real(real)
    }
}

impl From<nalgebra::Complex<f64>> for Complex {
    fn from(value: nalgebra::Complex<f64>) -> Self {
        Complex::new(value.re, value.im)
    }
}

impl From<Complex> for nalgebra::Complex<f64> {
    fn from(value: Complex) -> Self {
        nalgebra::Complex::new(value.real, value.imag)
    }
}

/// Reals print with a trailing `.0` when integral so they stay distinct from integers.
pub(crate) fn fmt_real(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_real(f, self.real)?;
        if self.imag.is_sign_negative() && !self.imag.is_nan() {
            write!(f, "-")?;
            fmt_real(f, -self.imag)?;
        } else {
            write!(f, "+")?;
            fmt_real(f, self.imag)?;
        }
        write!(f, "i")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Complex, b: Complex, tol: f64) -> bool {
        (a - b).norm() <= tol * b.norm().max(1.0)
    }

    #[test]
    fn test_complex_mul_pure_imaginary_squared_is_minus_one() {
        let i = Complex::i();
        assert_eq!(i * i, Complex::from_real(-1.0));
    }

    #[test]
    fn test_complex_div_standard() {
        // (1 + 2i) / (3 + 4i) = (11 + 2i) / 25
        let q = Complex::new(1.0, 2.0) / Complex::new(3.0, 4.0);
        assert!(close(q, Complex::new(0.44, 0.08), 1e-15), "{:?}", q);
    }

    #[test]
    fn test_complex_div_huge_operands_do_not_overflow() {
        let big = Complex::new(1e300, 1e300);
        let q = big / big;
        assert!(close(q, Complex::from_real(1.0), 1e-15), "{:?}", q);

        let q = Complex::new(1e-300, 3e-300) / Complex::new(1e-300, 0.0);
        assert!(close(q, Complex::new(1.0, 3.0), 1e-15), "{:?}", q);
    }

    #[test]
    fn test_complex_div_tiny_divisor_component() {
        // The small imaginary part of the divisor must not become NaN or zero the result.
        let q = Complex::new(1.0, 1.0) / Complex::new(1e-308, 1e-308);
        assert!(q.is_finite(), "{:?}", q);
        assert!((q.real - 1e308).abs() / 1e308 < 1e-12);
    }

    #[test]
    fn test_complex_div_by_zero_heals_to_infinity() {
        let q = Complex::new(1.0, 0.0) / Complex::new(0.0, 0.0);
        assert_eq!(q.real, f64::INFINITY);

        let q = Complex::new(0.0, 0.0) / Complex::new(0.0, 0.0);
        assert!(q.is_nan());
    }

    #[test]
    fn test_complex_div_infinite_numerator() {
        let q = Complex::new(f64::INFINITY, 0.0) / Complex::new(1.0, 1.0);
        assert!(q.real.is_infinite());
    }

    #[test]
    fn test_complex_div_infinite_divisor_gives_zero() {
        let q = Complex::new(1.0, 1.0) / Complex::new(f64::INFINITY, f64::INFINITY);
        assert_eq!(q.real, 0.0);
        assert_eq!(q.imag, 0.0);
    }

    #[test]
    fn test_complex_sqrt() {
        let root = Complex::from_real(-4.0).sqrt();
        assert!(close(root, Complex::new(0.0, 2.0), 1e-15));
        let z = Complex::new(3.0, -4.0);
        let root = z.sqrt();
        assert!(close(root * root, z, 1e-15));
    }

    #[test]
    fn test_complex_display() {
        assert_eq!(format!("{}", Complex::new(1.0, 2.0)), "1.0+2.0i");
        assert_eq!(format!("{}", Complex::new(0.5, -1.5)), "0.5-1.5i");
    }

    #[test]
    fn test_logb_and_scaling() {
        assert_eq!(logb(8.0), 3.0);
        assert_eq!(logb(0.75), -1.0);
        assert_eq!(logb(f64::MIN_POSITIVE / 4.0), -1024.0);
        assert_eq!(scale_by_power_of_two(1.0, 1100) , f64::INFINITY);
        assert_eq!(scale_by_power_of_two(3.0, -2), 0.75);
        assert_eq!(scale_by_power_of_two(scale_by_power_of_two(5.0, -1060), 1060), 5.0);
    }
}
