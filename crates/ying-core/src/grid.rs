//! 二维网格 (Grid).
//!
//! 行优先存储的矩形网格, 用于像素帧、残差、DCT 系数矩阵和运动向量场.
//! 同一序列中所有帧的宽高固定.

use crate::error::{YingError, YingResult};

/// 行优先二维网格
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    /// 宽度 (列数)
    width: usize,
    /// 高度 (行数)
    height: usize,
    /// 行优先数据, 长度 = width * height
    data: Vec<T>,
}

/// 像素网格: 0..=255 的灰度值
pub type PixelGrid = Grid<u8>;

/// 残差网格: 预测误差, 取值 -255..=255
pub type ResidualGrid = Grid<i32>;

/// 系数矩阵: DCT 系数或量化 / DPCM 编码后的系数
pub type CoeffMatrix = Grid<f64>;

impl<T: Clone> Grid<T> {
    /// 创建所有元素均为 `value` 的网格
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T: Clone + Default> Grid<T> {
    /// 创建元素为默认值的网格
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T> Grid<T> {
    /// 由行优先数据构造网格
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> YingResult<Self> {
        if data.len() != width * height {
            return Err(YingError::InvalidArgument(format!(
                "网格数据长度 {} 与尺寸 {}x{} 不符",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// 由坐标函数 `f(x, y)` 构造网格
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 网格是否为空 (宽或高为 0)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 两个网格尺寸是否一致
    pub fn same_size<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// 第 y 行
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// 第 y 行 (可变)
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    /// 按行迭代
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // width 为 0 时 chunks 会 panic, 此时没有任何元素可迭代
        self.data.chunks(self.width.max(1))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// 设置 (x, y) 处的元素
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    /// 逐元素映射为新网格
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// 校验尺寸能被块尺寸整除, 返回 (横向块数, 纵向块数)
    pub fn block_count(&self, block_w: usize, block_h: usize) -> YingResult<(usize, usize)> {
        if block_w == 0
            || block_h == 0
            || self.width % block_w != 0
            || self.height % block_h != 0
        {
            return Err(YingError::block_size(
                self.width,
                self.height,
                block_w,
                block_h,
            ));
        }
        Ok((self.width / block_w, self.height / block_h))
    }
}

impl<T: Copy> Grid<T> {
    /// 获取 (x, y) 处的元素
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    /// 复制出以 (x0, y0) 为左上角的 block_w x block_h 子块
    pub fn block(&self, x0: usize, y0: usize, block_w: usize, block_h: usize) -> Grid<T> {
        let mut data = Vec::with_capacity(block_w * block_h);
        for y in y0..y0 + block_h {
            data.extend_from_slice(&self.row(y)[x0..x0 + block_w]);
        }
        Grid {
            width: block_w,
            height: block_h,
            data,
        }
    }

    /// 将子块写回以 (x0, y0) 为左上角的位置
    pub fn put_block(&mut self, x0: usize, y0: usize, block: &Grid<T>) {
        for y in 0..block.height {
            self.row_mut(y0 + y)[x0..x0 + block.width].copy_from_slice(block.row(y));
        }
    }
}

impl PixelGrid {
    /// 转换为残差网格 (i32)
    pub fn to_residual(&self) -> ResidualGrid {
        self.map(|&p| p as i32)
    }

    /// 转换为实数矩阵
    pub fn to_real(&self) -> CoeffMatrix {
        self.map(|&p| p as f64)
    }
}

impl ResidualGrid {
    /// 截断到 [0, 255] 转换为像素网格
    pub fn to_pixels(&self) -> PixelGrid {
        self.map(|&v| v.clamp(0, 255) as u8)
    }

    /// 转换为实数矩阵
    pub fn to_real(&self) -> CoeffMatrix {
        self.map(|&v| v as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_from_fn_row_major() {
        let g = Grid::from_fn(3, 2, |x, y| (y * 10 + x) as i32);
        assert_eq!(g.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(g.get(2, 1), 12);
        assert_eq!(g.row(1), &[10, 11, 12]);
    }

    #[test]
    fn test_grid_from_vec_length_mismatch() {
        let r = Grid::from_vec(2, 2, vec![1u8, 2, 3]);
        assert!(matches!(r, Err(YingError::InvalidArgument(_))));
    }

    #[test]
    fn test_grid_block_roundtrip() {
        let g = Grid::from_fn(4, 4, |x, y| (y * 4 + x) as u8);
        let b = g.block(2, 2, 2, 2);
        assert_eq!(b.as_slice(), &[10, 11, 14, 15]);

        let mut target = Grid::<u8>::new(4, 4);
        target.put_block(0, 0, &b);
        assert_eq!(target.row(0), &[10, 11, 0, 0]);
        assert_eq!(target.row(1), &[14, 15, 0, 0]);
    }

    #[test]
    fn test_grid_block_count() {
        let g = Grid::<f64>::new(16, 8);
        assert_eq!(g.block_count(8, 8).ok(), Some((2, 1)));
        assert!(matches!(
            g.block_count(3, 8),
            Err(YingError::InvalidBlockSize { .. })
        ));
        assert!(g.block_count(0, 8).is_err());
    }

    #[test]
    fn test_residual_to_pixels_clamps() {
        let r = Grid::from_vec(3, 1, vec![-7, 128, 300]).unwrap();
        assert_eq!(r.to_pixels().as_slice(), &[0, 128, 255]);
    }
}
