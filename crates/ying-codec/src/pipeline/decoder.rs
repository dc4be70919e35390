//! 解码管线.

use std::borrow::Borrow;

use log::debug;
use ying_core::{PixelGrid, YingError, YingResult};

use super::{PipelineState, check_geometry, reconstruct_intra, reconstruct_predicted};
use crate::encoded_frame::EncodedFrame;
use crate::params::EncoderParams;

/// 解码管线
///
/// 必须使用与编码端相同的参数, 并严格按编码顺序送入帧.
#[derive(Debug, Clone)]
pub struct DecodingPipeline {
    params: EncoderParams,
    reconstructed: Option<PixelGrid>,
    frame_index: u64,
}

impl DecodingPipeline {
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

    pub fn reconstructed(&self) -> Option<&PixelGrid> {
        self.reconstructed.as_ref()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn reset(&mut self) {
        self.reconstructed = None;
        self.frame_index = 0;
    }

    /// 解码下一帧
    ///
    /// 会话的第一帧为 Predicted 时返回 `SequenceError`. 出错时状态保持不变.
    pub fn decode_next(&mut self, encoded: &EncodedFrame) -> YingResult<PixelGrid> {
        let coefficients = encoded.coefficients();
        let rec = match encoded {
            EncodedFrame::Intra { coefficients } => {
                check_geometry(
                    &self.params,
                    self.reconstructed.as_ref(),
                    coefficients.width(),
                    coefficients.height(),
                )?;
                reconstruct_intra(coefficients, &self.params)?
            }
            EncodedFrame::Predicted {
                coefficients,
                motion,
            } => {
                let prev = self.reconstructed.as_ref().ok_or_else(|| {
                    YingError::SequenceError(format!(
                        "第 {} 帧为预测帧, 但尚无已重建的参考帧",
                        self.frame_index
                    ))
                })?;
                check_geometry(
                    &self.params,
                    Some(prev),
                    coefficients.width(),
                    coefficients.height(),
                )?;
                reconstruct_predicted(prev, coefficients, motion, &self.params)?
            }
        };

        debug!(
            "解码帧 {}: 类型 {}, {}x{}",
            self.frame_index,
            encoded.frame_type(),
            coefficients.width(),
            coefficients.height()
        );

        self.reconstructed = Some(rec.clone());
        self.frame_index += 1;
        Ok(rec)
    }

    /// 惰性解码编码帧序列
    pub fn decode_iter<I>(&mut self, frames: I) -> DecodeStream<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<EncodedFrame>,
    {
        DecodeStream {
            pipeline: self,
            frames: frames.into_iter(),
            failed: false,
        }
    }
}

/// 惰性解码迭代器, 首个错误之后结束
pub struct DecodeStream<'a, I> {
    pipeline: &'a mut DecodingPipeline,
    frames: I,
    failed: bool,
}

impl<I> Iterator for DecodeStream<'_, I>
where
    I: Iterator,
    I::Item: Borrow<EncodedFrame>,
{
    type Item = YingResult<PixelGrid>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let frame = self.frames.next()?;
        let result = self.pipeline.decode_next(frame.borrow());
        self.failed = result.is_err();
        Some(result)
    }
}

/// 使用新会话解码整个编码帧序列
pub fn decode_sequence<I>(frames: I, params: EncoderParams) -> YingResult<Vec<PixelGrid>>
where
    I: IntoIterator,
    I::Item: Borrow<EncodedFrame>,
{
    let mut pipeline = DecodingPipeline::new(params)?;
    pipeline.decode_iter(frames).collect()
}
