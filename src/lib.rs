//! # Ying (影)
//!
//! 纯 Rust 实现的教学用运动补偿灰度视频编解码器.
//!
//! Ying 覆盖完整的编解码链路:
//! - **变换**: 基于递归 FFT 的 DCT-II / DCT-III, 二维与分块形式
//! - **运动估计**: 穷举块匹配 (SAD) 与运动补偿
//! - **量化**: 感知权重矩阵 + 帧类型相关的死区
//! - **DPCM**: 系数矩阵与运动向量场的行内差分编码
//! - **管线**: 闭环预测的编码 / 解码状态机
//!
//! # 快速开始
//!
//! ```rust
//! use ying::codec::{EncoderParams, decode_sequence, encode_sequence};
//! use ying::core::PixelGrid;
//!
//! let frames = vec![PixelGrid::filled(16, 16, 90), PixelGrid::filled(16, 16, 95)];
//! let encoded = encode_sequence(&frames, EncoderParams::default()).unwrap();
//! let decoded = decode_sequence(&encoded, EncoderParams::default()).unwrap();
//! assert_eq!(decoded.len(), 2);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `ying-core` | 错误类型、二维网格、帧来源 |
//! | `ying-codec` | 变换、运动估计、量化、DPCM、编解码管线 |

/// 核心类型与工具
pub use ying_core as core;

/// 编解码器
pub use ying_codec as codec;

/// 获取 Ying 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
