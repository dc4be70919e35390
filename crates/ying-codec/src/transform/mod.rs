//! 变换引擎: 复数、FFT 与 DCT.
//!
//! 所有 DCT 都由递归 FFT 构建, 并扩展到二维与固定尺寸的分块变换.

pub mod complex;
pub mod dct;
pub mod fft;

pub use complex::Complex;
pub use dct::{
    block_dct_2d, dct_1d, dct_2d, inverse_block_dct_2d, inverse_dct_1d, inverse_dct_2d,
};
pub use fft::{fft, fft_complex, inverse_fft};
