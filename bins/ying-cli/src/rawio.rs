//! 原始 Gray8 帧读写.
//!
//! 文件内容为连续的 `width * height` 字节帧, 无文件头.

use std::io::{ErrorKind, Read, Write};

use ying_core::{FrameSource, PixelGrid, YingError, YingResult};

/// 从字节流按帧读取 Gray8 图像
pub struct RawGray8Reader<R> {
    inner: R,
    width: usize,
    height: usize,
    frames_read: u64,
}

impl<R: Read> RawGray8Reader<R> {
    pub fn new(inner: R, width: usize, height: usize) -> YingResult<Self> {
        if width == 0 || height == 0 {
            return Err(YingError::InvalidArgument(format!(
                "帧尺寸不能为 0: {width}x{height}"
            )));
        }
        Ok(Self {
            inner,
            width,
            height,
            frames_read: 0,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// 尽量填满 buf, 返回实际读取字节数 (仅在 EOF 时少于 buf.len())
    fn fill(&mut self, buf: &mut [u8]) -> YingResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FrameSource for RawGray8Reader<R> {
    fn next_frame(&mut self) -> YingResult<Option<PixelGrid>> {
        let mut buf = vec![0u8; self.width * self.height];
        let got = self.fill(&mut buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < buf.len() {
            return Err(YingError::MalformedInput(format!(
                "第 {} 帧不完整: 需要 {} 字节, 实际 {got} 字节",
                self.frames_read,
                buf.len(),
            )));
        }
        self.frames_read += 1;
        PixelGrid::from_vec(self.width, self.height, buf).map(Some)
    }
}

/// 按帧写出 Gray8 图像
pub struct RawGray8Writer<W> {
    inner: W,
    frames_written: u64,
}

impl<W: Write> RawGray8Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames_written: 0,
        }
    }

    pub fn write_frame(&mut self, frame: &PixelGrid) -> YingResult<()> {
        self.inner.write_all(frame.as_slice())?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn finish(mut self) -> YingResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
