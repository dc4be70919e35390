//! 基于 FFT 的 DCT-II / DCT-III.
//!
//! 一维 DCT 通过对称延拓 `(u[n-1], ..., u[0], u[0], ..., u[n-1])` 的 FFT 求得:
//! `X[k] = Re(FFT[k] · exp(-iπk/2n)) = 2·(-1)^k · Σ u[j]·cos(πk(2j+1)/2n)`.
//! 逆变换重建共轭对称的 2n 点频谱, 做逆 FFT 后取后 n 个采样.
//!
//! 当 2n 不是 2 的幂时退化为直接求和, 缩放与 FFT 路径完全一致.

use std::f64::consts::PI;

use rayon::prelude::*;
use ying_core::{CoeffMatrix, Grid, YingResult};

use super::complex::Complex;
use super::fft;

/// 一维 DCT
pub fn dct_1d(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    if !n.is_power_of_two() {
        return direct_dct(input);
    }

    let extension: Vec<Complex> = input
        .iter()
        .rev()
        .chain(input.iter())
        .map(|&u| Complex::real(u))
        .collect();
    let spectrum = fft::transform(&extension);

    (0..n)
        .map(|k| (spectrum[k] * Complex::exp_i(-PI * k as f64 / (2 * n) as f64)).re)
        .collect()
}

/// 一维逆 DCT
pub fn inverse_dct_1d(coeffs: &[f64]) -> Vec<f64> {
    let n = coeffs.len();
    if n == 0 {
        return Vec::new();
    }
    if !n.is_power_of_two() {
        return direct_inverse_dct(coeffs);
    }

    let mut spectrum = vec![Complex::ZERO; 2 * n];
    spectrum[0] = Complex::real(coeffs[0]);
    // spectrum[n] 保持为 0
    for k in 1..n {
        let rotated = Complex::real(coeffs[k]) * Complex::exp_i(PI * k as f64 / (2 * n) as f64);
        spectrum[k] = rotated;
        spectrum[2 * n - k] = rotated.conj();
    }

    let extension = fft::inverse_transform(&spectrum);
    extension[n..].iter().map(|z| z.re).collect()
}

/// 直接求和的 DCT, 与 FFT 路径同缩放
fn direct_dct(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    (0..n)
        .map(|k| {
            let sign = if k % 2 == 0 { 2.0 } else { -2.0 };
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(j, &u)| u * (PI * k as f64 * (2 * j + 1) as f64 / (2 * n) as f64).cos())
                .sum();
            sign * sum
        })
        .collect()
}

/// 直接求和的逆 DCT
fn direct_inverse_dct(coeffs: &[f64]) -> Vec<f64> {
    let n = coeffs.len();
    (0..n)
        .map(|j| {
            let mut acc = coeffs[0];
            for (k, &c) in coeffs.iter().enumerate().skip(1) {
                let sign = if k % 2 == 0 { 2.0 } else { -2.0 };
                acc += sign * c * (PI * k as f64 * (2 * j + 1) as f64 / (2 * n) as f64).cos();
            }
            acc / (2 * n) as f64
        })
        .collect()
}

/// 二维 DCT: 先逐行, 再逐列
pub fn dct_2d(matrix: &CoeffMatrix) -> CoeffMatrix {
    separable(matrix, dct_1d)
}

/// 二维逆 DCT
pub fn inverse_dct_2d(matrix: &CoeffMatrix) -> CoeffMatrix {
    separable(matrix, inverse_dct_1d)
}

fn separable(matrix: &CoeffMatrix, transform_1d: fn(&[f64]) -> Vec<f64>) -> CoeffMatrix {
    let (w, h) = (matrix.width(), matrix.height());
    let mut out = Grid::new(w, h);
    for y in 0..h {
        out.row_mut(y).copy_from_slice(&transform_1d(matrix.row(y)));
    }

    let mut column = vec![0.0; h];
    for x in 0..w {
        for (y, c) in column.iter_mut().enumerate() {
            *c = out.get(x, y);
        }
        for (y, v) in transform_1d(&column).into_iter().enumerate() {
            out.set(x, y, v);
        }
    }
    out
}

/// 分块二维 DCT, 各块独立变换后原地写回
///
/// 矩阵尺寸必须是块尺寸的整数倍, 否则返回 `InvalidBlockSize`.
pub fn block_dct_2d(matrix: &mut CoeffMatrix, block_w: usize, block_h: usize) -> YingResult<()> {
    per_block(matrix, block_w, block_h, dct_2d)
}

/// 分块二维逆 DCT
pub fn inverse_block_dct_2d(
    matrix: &mut CoeffMatrix,
    block_w: usize,
    block_h: usize,
) -> YingResult<()> {
    per_block(matrix, block_w, block_h, inverse_dct_2d)
}

fn per_block(
    matrix: &mut CoeffMatrix,
    block_w: usize,
    block_h: usize,
    transform_2d: fn(&CoeffMatrix) -> CoeffMatrix,
) -> YingResult<()> {
    let (cols, rows) = matrix.block_count(block_w, block_h)?;

    // 所有块变换完成后再统一写回
    let source = &*matrix;
    let blocks: Vec<(usize, usize, CoeffMatrix)> = (0..rows * cols)
        .into_par_iter()
        .map(|i| {
            let x0 = (i % cols) * block_w;
            let y0 = (i / cols) * block_h;
            let block = source.block(x0, y0, block_w, block_h);
            (x0, y0, transform_2d(&block))
        })
        .collect();

    for (x0, y0, block) in &blocks {
        matrix.put_block(*x0, *y0, block);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ying_core::YingError;

    /// 确定性伪随机序列 (LCG)
    fn lcg_values(seed: u64, count: usize) -> Vec<f64> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) % 512) as f64 - 256.0
            })
            .collect()
    }

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-8, "{x} != {y}");
        }
    }

    #[test]
    fn test_dct_constant_vector_energy_in_dc() {
        let v = [3.0; 8];
        let c = dct_1d(&v);
        // X[0] = 2 · Σ u = 48
        assert!((c[0] - 48.0).abs() < 1e-9);
        for &ac in &c[1..] {
            assert!(ac.abs() < 1e-9);
        }
    }

    #[test]
    fn test_dct_matches_direct_formula() {
        let v = lcg_values(7, 8);
        assert_close(&dct_1d(&v), &direct_dct(&v));
        assert_close(&inverse_dct_1d(&v), &direct_inverse_dct(&v));
    }

    #[test]
    fn test_dct_roundtrip_any_length() {
        for n in 1..=20 {
            let v = lcg_values(n as u64, n);
            let back = inverse_dct_1d(&dct_1d(&v));
            assert_close(&v, &back);
        }
    }

    #[test]
    fn test_dct_2d_roundtrip() {
        let m = Grid::from_vec(6, 4, lcg_values(11, 24)).unwrap();
        let back = inverse_dct_2d(&dct_2d(&m));
        assert_close(m.as_slice(), back.as_slice());

        let m = Grid::from_vec(8, 16, lcg_values(12, 128)).unwrap();
        let back = inverse_dct_2d(&dct_2d(&m));
        assert_close(m.as_slice(), back.as_slice());
    }

    #[test]
    fn test_block_dct_roundtrip() {
        let original = Grid::from_vec(16, 8, lcg_values(5, 128)).unwrap();
        let mut m = original.clone();
        block_dct_2d(&mut m, 4, 4).unwrap();
        inverse_block_dct_2d(&mut m, 4, 4).unwrap();
        assert_close(original.as_slice(), m.as_slice());
    }

    #[test]
    fn test_block_dct_transforms_tiles_independently() {
        // 左块常数 1, 右块常数 2: 各自仅有 DC 系数
        let m = Grid::from_fn(8, 4, |x, _| if x < 4 { 1.0 } else { 2.0 });
        let mut t = m.clone();
        block_dct_2d(&mut t, 4, 4).unwrap();
        // DC = 2·2·Σ = 4 · 16 · v
        assert!((t.get(0, 0) - 64.0).abs() < 1e-9);
        assert!((t.get(4, 0) - 128.0).abs() < 1e-9);
        assert!(t.get(1, 0).abs() < 1e-9);
        assert!(t.get(5, 2).abs() < 1e-9);
    }

    #[test]
    fn test_block_dct_rejects_bad_size() {
        let mut m = CoeffMatrix::new(10, 8);
        assert!(matches!(
            block_dct_2d(&mut m, 4, 4),
            Err(YingError::InvalidBlockSize { .. })
        ));
        assert!(inverse_block_dct_2d(&mut m, 5, 3).is_err());
    }
}
