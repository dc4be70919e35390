//! # ying-codec
//!
//! Ying 视频编解码器库: 将灰度帧序列压缩为系数表示, 并重建其近似.
//!
//! ## 处理链路
//!
//! - **编码**: 运动估计 → 残差 → 分块 DCT → 加权量化 → DPCM
//! - **解码**: DPCM⁻¹ → 反量化 → 分块逆 DCT → 运动补偿重建
//!
//! 编码器在内部执行与解码器相同的逆链路, 以 *重建帧* 而非原始帧作为下一帧的参考,
//! 避免漂移.
//!
//! ## 使用示例
//!
//! ```rust
//! use ying_codec::{DecodingPipeline, EncoderParams, EncodingPipeline};
//! use ying_core::PixelGrid;
//!
//! let params = EncoderParams::default();
//! let mut encoder = EncodingPipeline::new(params.clone()).unwrap();
//! let mut decoder = DecodingPipeline::new(params).unwrap();
//!
//! let frame = PixelGrid::filled(16, 16, 128);
//! let encoded = encoder.encode_next(&frame).unwrap();
//! let decoded = decoder.decode_next(&encoded).unwrap();
//! assert_eq!(Some(&decoded), encoder.reconstructed());
//! ```

pub mod dpcm;
pub mod encoded_frame;
pub mod entropy;
pub mod motion;
pub mod params;
pub mod pipeline;
pub mod quant;
pub mod transform;

// 重导出常用类型
pub use encoded_frame::EncodedFrame;
pub use entropy::{FrameStats, psnr};
pub use motion::{MotionField, MotionVector, estimate_block_movement, estimate_block_movement_map};
pub use params::EncoderParams;
pub use pipeline::{
    DecodeStream, DecodingPipeline, EncodeStream, EncodingPipeline, PipelineState,
    decode_sequence, encode_sequence,
};
pub use quant::{FrameType, dequantize, quantize};
