//! 编码管线.

use std::borrow::Borrow;

use log::debug;
use ying_core::{FrameSource, PixelGrid, YingResult};

use super::{PipelineState, check_geometry, reconstruct_intra, reconstruct_predicted};
use crate::dpcm::dpcm_encode;
use crate::encoded_frame::EncodedFrame;
use crate::motion::{compute_residual, estimate_block_movement_map};
use crate::params::EncoderParams;
use crate::quant::{FrameType, quantize};

/// 编码管线
///
/// 逐帧调用 [`encode_next`](Self::encode_next): 第一帧编码为 Intra,
/// 之后每帧相对前一重建帧做运动补偿并编码为 Predicted.
#[derive(Debug, Clone)]
pub struct EncodingPipeline {
    /// 会话参数 (只读)
    params: EncoderParams,
    /// 前一重建帧
    reconstructed: Option<PixelGrid>,
    /// 已编码帧数
    frame_index: u64,
}

impl EncodingPipeline {
    /// 创建编码管线, 参数不合法时返回 `InvalidArgument`
    pub fn new(params: EncoderParams) -> YingResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            reconstructed: None,
            frame_index: 0,
        })
    }

    pub fn params(&self) -> &EncoderParams {
        &self.params
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::of(self.reconstructed.as_ref())
    }

    /// 当前重建帧 (与解码器输出一致)
    pub fn reconstructed(&self) -> Option<&PixelGrid> {
        self.reconstructed.as_ref()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// 回到初始状态, 开始新会话
    pub fn reset(&mut self) {
        self.reconstructed = None;
        self.frame_index = 0;
    }

    /// 编码下一帧
    ///
    /// 出错时管线状态保持不变.
    pub fn encode_next(&mut self, frame: &PixelGrid) -> YingResult<EncodedFrame> {
        check_geometry(
            &self.params,
            self.reconstructed.as_ref(),
            frame.width(),
            frame.height(),
        )?;

        let params = &self.params;
        let (encoded, rec) = match &self.reconstructed {
            None => {
                let quantized = quantize(
                    &frame.to_residual(),
                    params.dct_block_size,
                    &params.quant_weights,
                    params.quant_scale,
                    FrameType::Intra,
                )?;
                let coefficients = dpcm_encode(&quantized, params.dpcm_step);
                let rec = reconstruct_intra(&coefficients, params)?;
                (EncodedFrame::Intra { coefficients }, rec)
            }
            Some(prev) => {
                let block = params.motion_block_size;
                let field = estimate_block_movement_map(
                    prev,
                    frame,
                    block,
                    block,
                    params.effective_search_radius(),
                )?;
                let residual = compute_residual(prev, frame, &field, block, block)?;
                let energy: i64 = residual.as_slice().iter().map(|&r| r.abs() as i64).sum();
                debug!("帧 {} 残差能量 (SAD): {}", self.frame_index, energy);

                let quantized = quantize(
                    &residual,
                    params.dct_block_size,
                    &params.quant_weights,
                    params.quant_scale,
                    FrameType::Predicted,
                )?;
                let coefficients = dpcm_encode(&quantized, params.dpcm_step);
                let motion = dpcm_encode(&field, params.dpcm_step);
                let rec = reconstruct_predicted(prev, &coefficients, &motion, params)?;
                (
                    EncodedFrame::Predicted {
                        coefficients,
                        motion,
                    },
                    rec,
                )
            }
        };

        let nonzero = encoded
            .coefficients()
            .as_slice()
            .iter()
            .filter(|&&c| c != 0.0)
            .count();
        debug!(
            "编码帧 {}: 类型 {}, 非零系数 {}",
            self.frame_index,
            encoded.frame_type(),
            nonzero
        );

        // 整帧替换重建状态
        self.reconstructed = Some(rec);
        self.frame_index += 1;
        Ok(encoded)
    }

    /// 惰性编码帧序列
    pub fn encode_iter<I>(&mut self, frames: I) -> EncodeStream<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<PixelGrid>,
    {
        EncodeStream {
            pipeline: self,
            frames: frames.into_iter(),
            failed: false,
        }
    }

    /// 从外部帧来源读取并编码, 直到来源结束
    pub fn encode_source<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> YingResult<Vec<EncodedFrame>> {
        let mut encoded = Vec::new();
        while let Some(frame) = source.next_frame()? {
            encoded.push(self.encode_next(&frame)?);
        }
        Ok(encoded)
    }
}

/// 惰性编码迭代器, 首个错误之后结束
pub struct EncodeStream<'a, I> {
    pipeline: &'a mut EncodingPipeline,
    frames: I,
    failed: bool,
}

impl<I> Iterator for EncodeStream<'_, I>
where
    I: Iterator,
    I::Item: Borrow<PixelGrid>,
{
    type Item = YingResult<EncodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let frame = self.frames.next()?;
        let result = self.pipeline.encode_next(frame.borrow());
        self.failed = result.is_err();
        Some(result)
    }
}

/// 使用新会话编码整个帧序列
pub fn encode_sequence<I>(frames: I, params: EncoderParams) -> YingResult<Vec<EncodedFrame>>
where
    I: IntoIterator,
    I::Item: Borrow<PixelGrid>,
{
    let mut pipeline = EncodingPipeline::new(params)?;
    pipeline.encode_iter(frames).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ying_core::{Grid, IterSource, YingError};

    fn gradient(width: usize, height: usize, offset: usize) -> PixelGrid {
        Grid::from_fn(width, height, |x, y| ((x + offset) * 5 + y * 3) as u8)
    }

    #[test]
    fn test_first_frame_is_intra_then_predicted() {
        let mut enc = EncodingPipeline::new(EncoderParams::default()).unwrap();
        assert_eq!(enc.state(), PipelineState::AwaitingFirstFrame);
        assert!(enc.reconstructed().is_none());

        let first = enc.encode_next(&gradient(16, 16, 0)).unwrap();
        assert!(first.is_intra());
        assert!(first.motion().is_none());
        assert_eq!(enc.state(), PipelineState::Steady);

        let second = enc.encode_next(&gradient(16, 16, 1)).unwrap();
        assert_eq!(second.frame_type(), FrameType::Predicted);
        let motion = second.motion().unwrap();
        assert_eq!((motion.width(), motion.height()), (2, 2));
        assert_eq!(enc.frame_index(), 2);
    }

    #[test]
    fn test_reset_starts_new_session() {
        let mut enc = EncodingPipeline::new(EncoderParams::default()).unwrap();
        enc.encode_next(&gradient(8, 8, 0)).unwrap();
        enc.reset();
        assert_eq!(enc.state(), PipelineState::AwaitingFirstFrame);
        assert!(enc.encode_next(&gradient(16, 8, 0)).unwrap().is_intra());
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut enc = EncodingPipeline::new(EncoderParams::default()).unwrap();
        assert!(matches!(
            enc.encode_next(&gradient(12, 8, 0)),
            Err(YingError::InvalidBlockSize { .. })
        ));
        assert_eq!(enc.state(), PipelineState::AwaitingFirstFrame);

        enc.encode_next(&gradient(8, 8, 0)).unwrap();
        let before = enc.reconstructed().cloned();
        assert!(matches!(
            enc.encode_next(&gradient(16, 8, 0)),
            Err(YingError::InvalidArgument(_))
        ));
        assert_eq!(enc.reconstructed().cloned(), before);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = EncoderParams::default().with_quant_scale(0.0);
        assert!(matches!(
            EncodingPipeline::new(params),
            Err(YingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_encode_iter_stops_after_error() {
        let frames = vec![gradient(8, 8, 0), gradient(16, 8, 0), gradient(8, 8, 1)];
        let mut enc = EncodingPipeline::new(EncoderParams::default()).unwrap();
        let results: Vec<_> = enc.encode_iter(&frames).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_encode_source() {
        let frames = (0..3).map(|i| gradient(16, 16, i));
        let mut source = IterSource::new(frames);
        let mut enc = EncodingPipeline::new(EncoderParams::default()).unwrap();
        let encoded = enc.encode_source(&mut source).unwrap();
        assert_eq!(encoded.len(), 3);
        assert!(encoded[0].is_intra());
        assert!(!encoded[2].is_intra());
    }
}
