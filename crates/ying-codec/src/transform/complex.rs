//! 最小复数类型, 仅供 FFT 使用.

use std::ops::{Add, Mul, Sub};

/// 复数 re + i·im
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// 纯实数
    pub const fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    /// exp(i·theta) = cos(theta) + i·sin(theta)
    pub fn exp_i(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self { re: cos, im: sin }
    }

    /// 共轭
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    /// 数乘
    pub fn scale(self, k: f64) -> Self {
        Self {
            re: self.re * k,
            im: self.im * k,
        }
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_complex_mul() {
        let a = Complex::new(1.0, 2.0);
        let b = Complex::new(3.0, -1.0);
        assert_eq!(a * b, Complex::new(5.0, 5.0));
    }

    #[test]
    fn test_complex_exp_i() {
        let z = Complex::exp_i(PI / 2.0);
        assert!(z.re.abs() < 1e-12);
        assert!((z.im - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_complex_conj_scale() {
        let z = Complex::new(2.0, 3.0).conj().scale(0.5);
        assert_eq!(z, Complex::new(1.0, -1.5));
        assert_eq!(Complex::new(1.0, 1.0) - Complex::real(1.0), Complex::new(0.0, 1.0));
    }
}
