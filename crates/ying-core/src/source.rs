//! 帧来源 (FrameSource) 抽象.
//!
//! 编解码核心不做文件或路径处理, 像素帧由外部读取器按顺序提供.

use crate::error::YingResult;
use crate::grid::PixelGrid;

/// 按顺序提供像素帧的外部读取器
pub trait FrameSource {
    /// 读取下一帧
    ///
    /// # 返回
    /// - `Ok(Some(frame))`: 成功读取一帧
    /// - `Ok(None)`: 序列结束
    /// - `Err(YingError::MalformedInput)`: 读取器遇到损坏数据
    fn next_frame(&mut self) -> YingResult<Option<PixelGrid>>;
}

/// 将内存中的帧迭代器包装为 FrameSource
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = PixelGrid>,
{
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = PixelGrid>,
{
    fn next_frame(&mut self) -> YingResult<Option<PixelGrid>> {
        Ok(self.inner.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_source_yields_then_ends() {
        let frames = vec![PixelGrid::new(2, 2), PixelGrid::filled(2, 2, 9)];
        let mut source = IterSource::new(frames.into_iter());
        assert!(matches!(source.next_frame(), Ok(Some(_))));
        let second = source.next_frame().ok().flatten();
        assert_eq!(second.map(|f| f.get(1, 1)), Some(9));
        assert!(matches!(source.next_frame(), Ok(None)));
    }
}
