//! 合成测试序列: 渐变背景上匀速移动的方块.

use ying_core::{FrameSource, PixelGrid, YingResult};

pub struct SyntheticSequence {
    width: usize,
    height: usize,
    frames: u64,
    next: u64,
    /// 每帧位移 (像素)
    velocity: (usize, usize),
}

impl SyntheticSequence {
    pub fn new(width: usize, height: usize, frames: u64) -> Self {
        Self {
            width,
            height,
            frames,
            next: 0,
            velocity: (1, 0),
        }
    }

    pub fn with_velocity(mut self, dx: usize, dy: usize) -> Self {
        self.velocity = (dx, dy);
        self
    }

    fn render(&self, index: u64) -> PixelGrid {
        let side = (self.width.min(self.height) / 4).max(1);
        let index = index as usize;
        let x0 = (self.width / 8 + index * self.velocity.0) % self.width;
        let y0 = (self.height / 8 + index * self.velocity.1) % self.height;
        PixelGrid::from_fn(self.width, self.height, |x, y| {
            let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
            if inside {
                // 方块内带纹理, 便于运动搜索锁定
                200 + ((x * 3 + y * 5) % 40) as u8
            } else {
                ((x * 2 + y) % 128) as u8
            }
        })
    }
}

impl FrameSource for SyntheticSequence {
    fn next_frame(&mut self) -> YingResult<Option<PixelGrid>> {
        if self.next >= self.frames {
            return Ok(None);
        }
        let frame = self.render(self.next);
        self.next += 1;
        Ok(Some(frame))
    }
}
