//! # ying-core
//!
//! Ying 视频编解码器核心库, 提供错误类型、二维网格与帧来源抽象.
//!
//! 本 crate 为整个 Ying 工作区提供底层基础设施, 不依赖任何编解码细节.

pub mod error;
pub mod grid;
pub mod source;

// 重导出常用类型
pub use error::{YingError, YingResult};
pub use grid::{CoeffMatrix, Grid, PixelGrid, ResidualGrid};
pub use source::{FrameSource, IterSource};
