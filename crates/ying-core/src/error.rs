//! 统一错误类型定义.
//!
//! 所有 Ying crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// Ying 编解码器统一错误类型
#[derive(Debug, Error)]
pub enum YingError {
    /// FFT 输入长度不是 2 的幂
    #[error("无效长度: {0} 不是 2 的幂")]
    InvalidSize(usize),

    /// 矩阵尺寸不是块尺寸的整数倍 (或块尺寸为 0)
    #[error("无效块尺寸: {width}x{height} 无法被 {block_w}x{block_h} 整除")]
    InvalidBlockSize {
        width: usize,
        height: usize,
        block_w: usize,
        block_h: usize,
    },

    /// 帧序列错误 (预测帧缺少已重建的前一帧)
    #[error("帧序列错误: {0}")]
    SequenceError(String),

    /// 上游帧读取器产生的损坏输入
    #[error("输入损坏: {0}")]
    MalformedInput(String),

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// Ying 统一 Result 类型
pub type YingResult<T> = Result<T, YingError>;

impl YingError {
    /// 构造块尺寸错误
    pub fn block_size(width: usize, height: usize, block_w: usize, block_h: usize) -> Self {
        Self::InvalidBlockSize {
            width,
            height,
            block_w,
            block_h,
        }
    }
}
