//! 诊断统计: 熵与 PSNR.
//!
//! 纯观测用途, 不参与任何编码决策.

use std::collections::BTreeMap;

use ying_core::{CoeffMatrix, PixelGrid};

use crate::encoded_frame::EncodedFrame;
use crate::motion::MotionField;
use crate::quant::FrameType;

/// 整数符号序列的香农熵 (比特 / 符号)
///
/// 只统计出现过的符号, 值域跨度不影响内存占用.
pub fn entropy_of_symbols(symbols: &[i64]) -> f64 {
    if symbols.is_empty() {
        return 0.0;
    }

    let mut histogram: BTreeMap<i64, u64> = BTreeMap::new();
    for &s in symbols {
        *histogram.entry(s).or_insert(0) += 1;
    }

    let total = symbols.len() as f64;
    histogram
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            p * (1.0 / p).log2()
        })
        .sum()
}

/// 像素帧的熵
pub fn entropy_of_pixels(frame: &PixelGrid) -> f64 {
    let symbols: Vec<i64> = frame.as_slice().iter().map(|&p| p as i64).collect();
    entropy_of_symbols(&symbols)
}

/// 系数矩阵的熵 (先四舍五入到整数)
pub fn entropy_of_coefficients(matrix: &CoeffMatrix) -> f64 {
    let symbols: Vec<i64> = matrix.as_slice().iter().map(|&c| c.round() as i64).collect();
    entropy_of_symbols(&symbols)
}

/// 运动向量场的熵 (两个分量合并为同一信源)
pub fn entropy_of_motion(field: &MotionField) -> f64 {
    let symbols: Vec<i64> = field
        .as_slice()
        .iter()
        .flat_map(|v| [v.dx as i64, v.dy as i64])
        .collect();
    entropy_of_symbols(&symbols)
}

/// 峰值信噪比 (dB), 两帧相同时为正无穷
pub fn psnr(original: &PixelGrid, reconstructed: &PixelGrid) -> f64 {
    let n = original.as_slice().len().min(reconstructed.as_slice().len());
    if n == 0 {
        return f64::INFINITY;
    }
    let mse = original
        .as_slice()
        .iter()
        .zip(reconstructed.as_slice())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum::<f64>()
        / n as f64;
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (255.0 * 255.0 / mse).log10()
    }
}

/// 单帧统计
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    /// 帧序号
    pub index: u64,
    pub frame_type: FrameType,
    /// 原始帧熵
    pub original_entropy: f64,
    /// 编码系数熵
    pub coefficient_entropy: f64,
    /// 编码运动场熵 (Intra 帧为 0)
    pub motion_entropy: f64,
}

impl FrameStats {
    pub fn measure(index: u64, original: &PixelGrid, encoded: &EncodedFrame) -> Self {
        Self {
            index,
            frame_type: encoded.frame_type(),
            original_entropy: entropy_of_pixels(original),
            coefficient_entropy: entropy_of_coefficients(encoded.coefficients()),
            motion_entropy: encoded.motion().map(entropy_of_motion).unwrap_or(0.0),
        }
    }

    /// 按熵估算的编码比特数 (系数 + 运动场)
    pub fn estimated_bits(&self, encoded: &EncodedFrame) -> f64 {
        let coeff_bits = self.coefficient_entropy * encoded.coefficients().as_slice().len() as f64;
        let motion_bits = encoded
            .motion()
            .map(|m| self.motion_entropy * 2.0 * m.as_slice().len() as f64)
            .unwrap_or(0.0);
        coeff_bits + motion_bits
    }
}
