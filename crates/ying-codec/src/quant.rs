//! 加权量化与反量化.
//!
//! 对残差做分块 DCT 后, 每个系数按其在块内位置 `(y % n, x % n)` 的感知权重量化:
//! - Intra: `round((c·16 / w) / (2·scale))`
//! - Predicted: `round((c·16 / w - sign(c)·scale) / (2·scale))`, 即残差系数的死区
//!
//! 反量化时的死区符号取自被反量化的量化值本身, 不重新计算.

use log::warn;
use ying_core::{CoeffMatrix, ResidualGrid, YingError, YingResult};

use crate::transform::{block_dct_2d, inverse_block_dct_2d};

/// 帧类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// 帧内编码, 不参考其他帧
    Intra,
    /// 相对前一重建帧的运动补偿预测
    Predicted,
}

impl FrameType {
    /// 单字母标记 (I/P)
    pub fn as_char(self) -> char {
        match self {
            FrameType::Intra => 'I',
            FrameType::Predicted => 'P',
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// sign(0) = 0 的符号函数
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// 校验量化权重矩阵与量化步长
pub(crate) fn check_quant_params(
    dct_block_size: usize,
    weights: &[Vec<u16>],
    scale: f64,
) -> YingResult<()> {
    if dct_block_size == 0 {
        warn!("DCT 块尺寸为 0");
        return Err(YingError::InvalidArgument("DCT 块尺寸不能为 0".into()));
    }
    if weights.len() != dct_block_size || weights.iter().any(|row| row.len() != dct_block_size) {
        warn!("量化权重矩阵尺寸与 DCT 块尺寸 {} 不符", dct_block_size);
        return Err(YingError::InvalidArgument(format!(
            "量化权重矩阵必须为 {0}x{0}",
            dct_block_size
        )));
    }
    if weights.iter().flatten().any(|&w| w == 0) {
        warn!("量化权重矩阵含有 0");
        return Err(YingError::InvalidArgument("量化权重必须为正数".into()));
    }
    if !(scale.is_finite() && scale > 0.0) {
        warn!("量化步长无效: {}", scale);
        return Err(YingError::InvalidArgument(format!(
            "量化步长必须为正数, 实际为 {scale}"
        )));
    }
    Ok(())
}

/// 量化: 分块 DCT + 加权量化
pub fn quantize(
    residual: &ResidualGrid,
    dct_block_size: usize,
    weights: &[Vec<u16>],
    scale: f64,
    frame_type: FrameType,
) -> YingResult<CoeffMatrix> {
    check_quant_params(dct_block_size, weights, scale)?;

    let mut coeffs = residual.to_real();
    block_dct_2d(&mut coeffs, dct_block_size, dct_block_size)?;

    let n = dct_block_size;
    for y in 0..coeffs.height() {
        let weight_row = &weights[y % n];
        for (x, c) in coeffs.row_mut(y).iter_mut().enumerate() {
            let weighted = *c * 16.0 / weight_row[x % n] as f64;
            *c = match frame_type {
                FrameType::Intra => (weighted / (2.0 * scale)).round(),
                FrameType::Predicted => ((weighted - sign(*c) * scale) / (2.0 * scale)).round(),
            };
        }
    }
    Ok(coeffs)
}

/// 反量化: 逆加权 + 分块逆 DCT + 截断取整
///
/// Intra 帧结果截断到 `[0, 255]`, Predicted 帧残差截断到 `[-255, 255]`.
pub fn dequantize(
    quantized: &CoeffMatrix,
    dct_block_size: usize,
    weights: &[Vec<u16>],
    scale: f64,
    frame_type: FrameType,
) -> YingResult<ResidualGrid> {
    check_quant_params(dct_block_size, weights, scale)?;

    let n = dct_block_size;
    let mut coeffs = quantized.clone();
    for y in 0..coeffs.height() {
        let weight_row = &weights[y % n];
        for (x, q) in coeffs.row_mut(y).iter_mut().enumerate() {
            let w = weight_row[x % n] as f64;
            *q = match frame_type {
                FrameType::Intra => *q * 2.0 * scale * w / 16.0,
                FrameType::Predicted => (*q * 2.0 * scale + sign(*q) * scale) * w / 16.0,
            };
        }
    }
    inverse_block_dct_2d(&mut coeffs, n, n)?;

    let (lo, hi) = match frame_type {
        FrameType::Intra => (0.0, 255.0),
        FrameType::Predicted => (-255.0, 255.0),
    };
    Ok(coeffs.map(|&v| v.clamp(lo, hi).round() as i32))
}
