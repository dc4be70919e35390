//! 编解码管线 (状态机).
//!
//! 编码器与解码器各自持有 "前一重建帧", 状态为
//! `AwaitingFirstFrame → Steady`, 处理完第一帧后转换, 不会回退 (除非显式 reset).
//!
//! 编码器重建时调用与解码器完全相同的逆链路 ([`reconstruct_intra`] /
//! [`reconstruct_predicted`]), 保证两端重建帧逐位一致 (闭环预测).

mod decoder;
mod encoder;

pub use decoder::{DecodeStream, DecodingPipeline, decode_sequence};
pub use encoder::{EncodeStream, EncodingPipeline, encode_sequence};

use ying_core::{CoeffMatrix, PixelGrid, YingError, YingResult};

use crate::dpcm::dpcm_decode;
use crate::motion::{MotionField, reconstruct};
use crate::params::EncoderParams;
use crate::quant::{FrameType, dequantize};

/// 管线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// 尚未处理任何帧, 下一帧为 Intra
    AwaitingFirstFrame,
    /// 已有重建帧, 后续帧为 Predicted
    Steady,
}

impl PipelineState {
    fn of(reconstructed: Option<&PixelGrid>) -> Self {
        match reconstructed {
            Some(_) => PipelineState::Steady,
            None => PipelineState::AwaitingFirstFrame,
        }
    }
}

/// 校验帧尺寸: 首帧校验块尺寸整除, 后续帧必须与已建立的尺寸一致
fn check_geometry(
    params: &EncoderParams,
    previous: Option<&PixelGrid>,
    width: usize,
    height: usize,
) -> YingResult<()> {
    match previous {
        Some(prev) if prev.width() != width || prev.height() != height => {
            Err(YingError::InvalidArgument(format!(
                "会话中途帧尺寸变化: {}x{} -> {}x{}",
                prev.width(),
                prev.height(),
                width,
                height
            )))
        }
        Some(_) => Ok(()),
        None => params.validate_frame(width, height),
    }
}

/// Intra 帧逆链路: DPCM 解码 → 反量化 → 截断到 [0, 255]
pub(crate) fn reconstruct_intra(
    coded: &CoeffMatrix,
    params: &EncoderParams,
) -> YingResult<PixelGrid> {
    let quantized = dpcm_decode(coded);
    let image = dequantize(
        &quantized,
        params.dct_block_size,
        &params.quant_weights,
        params.quant_scale,
        FrameType::Intra,
    )?;
    Ok(image.to_pixels())
}

/// Predicted 帧逆链路: DPCM 解码残差与运动场 → 反量化 → 运动补偿重建
pub(crate) fn reconstruct_predicted(
    previous: &PixelGrid,
    coded: &CoeffMatrix,
    coded_motion: &MotionField,
    params: &EncoderParams,
) -> YingResult<PixelGrid> {
    let field = dpcm_decode(coded_motion);
    let quantized = dpcm_decode(coded);
    let residual = dequantize(
        &quantized,
        params.dct_block_size,
        &params.quant_weights,
        params.quant_scale,
        FrameType::Predicted,
    )?;
    reconstruct(
        previous,
        &residual,
        &field,
        params.motion_block_size,
        params.motion_block_size,
    )
}
