//! 基 2 递归 FFT (Cooley-Tukey).
//!
//! 输入长度必须是 2 的幂. 逆变换使用共轭技巧复用正变换:
//! `ifft(X) = conj(fft(conj(X))) / N`.

use std::f64::consts::PI;

use ying_core::{YingError, YingResult};

use super::complex::Complex;

/// 实序列的 FFT
pub fn fft(samples: &[f64]) -> YingResult<Vec<Complex>> {
    check_power_of_two(samples.len())?;
    let input: Vec<Complex> = samples.iter().map(|&s| Complex::real(s)).collect();
    Ok(transform(&input))
}

/// 复序列的 FFT
pub fn fft_complex(input: &[Complex]) -> YingResult<Vec<Complex>> {
    check_power_of_two(input.len())?;
    Ok(transform(input))
}

/// 逆 FFT
pub fn inverse_fft(spectrum: &[Complex]) -> YingResult<Vec<Complex>> {
    check_power_of_two(spectrum.len())?;
    Ok(inverse_transform(spectrum))
}

fn check_power_of_two(n: usize) -> YingResult<()> {
    if n.is_power_of_two() {
        Ok(())
    } else {
        Err(YingError::InvalidSize(n))
    }
}

/// 递归正变换, 调用方保证长度为 2 的幂
pub(crate) fn transform(input: &[Complex]) -> Vec<Complex> {
    let n = input.len();
    if n == 1 {
        return input.to_vec();
    }

    let half = n / 2;
    let even: Vec<Complex> = input.iter().step_by(2).copied().collect();
    let odd: Vec<Complex> = input.iter().skip(1).step_by(2).copied().collect();
    let even = transform(&even);
    let odd = transform(&odd);

    let mut out = vec![Complex::ZERO; n];
    for j in 0..half {
        // 旋转因子 exp(-2πi·j/N)
        let twiddle = Complex::exp_i(-2.0 * PI * j as f64 / n as f64) * odd[j];
        out[j] = even[j] + twiddle;
        out[j + half] = even[j] - twiddle;
    }
    out
}

/// 递归逆变换, 调用方保证长度为 2 的幂
pub(crate) fn inverse_transform(spectrum: &[Complex]) -> Vec<Complex> {
    let n = spectrum.len();
    let conjugated: Vec<Complex> = spectrum.iter().map(|z| z.conj()).collect();
    let inv_n = 1.0 / n as f64;
    transform(&conjugated)
        .into_iter()
        .map(|z| z.conj().scale(inv_n))
        .collect()
}
