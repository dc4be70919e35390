//! 块匹配运动估计与运动补偿.
//!
//! 穷举搜索: 对每个候选位移 `(i, j)` 计算目标块与参考帧中平移 `(-i, -j)`
//! 后的块的绝对差之和 (SAD), 取 SAD 最小者. 搜索范围被限制在帧内,
//! 保证每个采样点都不越界.
//!
//! 向量 `(dx, dy)` 的含义: 预测像素 `(x, y)` 时读取参考帧的 `(x - dx, y - dy)`.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use log::trace;
use rayon::prelude::*;
use ying_core::{Grid, PixelGrid, ResidualGrid, YingError, YingResult};

/// 二维整数位移向量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MotionVector {
    pub dx: i32,
    pub dy: i32,
}

/// 运动向量场: 每个运动块一个向量
pub type MotionField = Grid<MotionVector>;

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

// 回绕运算: 损坏的运动场在 DPCM 解码时不会溢出, 越界向量由运动补偿拒绝
impl Add for MotionVector {
    type Output = MotionVector;

    fn add(self, rhs: MotionVector) -> MotionVector {
        MotionVector::new(self.dx.wrapping_add(rhs.dx), self.dy.wrapping_add(rhs.dy))
    }
}

impl Sub for MotionVector {
    type Output = MotionVector;

    fn sub(self, rhs: MotionVector) -> MotionVector {
        MotionVector::new(self.dx.wrapping_sub(rhs.dx), self.dy.wrapping_sub(rhs.dy))
    }
}

impl Neg for MotionVector {
    type Output = MotionVector;

    fn neg(self) -> MotionVector {
        MotionVector::new(self.dx.wrapping_neg(), self.dy.wrapping_neg())
    }
}

impl fmt::Display for MotionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

/// 目标块与参考帧中位移 (i, j) 后的块之间的 SAD
#[allow(clippy::too_many_arguments)]
fn block_sad(
    reference: &PixelGrid,
    target: &PixelGrid,
    bx: usize,
    by: usize,
    block_w: usize,
    block_h: usize,
    i: isize,
    j: isize,
) -> u64 {
    let mut sad = 0u64;
    for y in by..by + block_h {
        let ref_row = reference.row((y as isize - j) as usize);
        let target_row = &target.row(y)[bx..bx + block_w];
        let ref_start = (bx as isize - i) as usize;
        for (t, r) in target_row
            .iter()
            .zip(&ref_row[ref_start..ref_start + block_w])
        {
            sad += (*t as i32 - *r as i32).unsigned_abs() as u64;
        }
    }
    sad
}

/// 估计单个块的运动向量
///
/// - `(bx, by)`: 块左上角像素坐标
/// - `search_radius`: 最大位移 R, 实际范围再被帧边界收紧
///
/// 同 SAD 时保留先找到的向量 (先 i 后 j 的字典序); SAD 为 0 时立即结束.
/// 调用方保证块位于帧内且两帧尺寸一致.
pub fn estimate_block_movement(
    reference: &PixelGrid,
    target: &PixelGrid,
    bx: usize,
    by: usize,
    block_w: usize,
    block_h: usize,
    search_radius: usize,
) -> MotionVector {
    let (w, h) = (target.width() as isize, target.height() as isize);
    let r = search_radius as isize;

    // 同位块已完全匹配
    if block_sad(reference, target, bx, by, block_w, block_h, 0, 0) == 0 {
        return MotionVector::ZERO;
    }

    let min_i = (-r).max((bx + block_w) as isize - w);
    let max_i = r.min(bx as isize);
    let min_j = (-r).max((by + block_h) as isize - h);
    let max_j = r.min(by as isize);

    let mut best_sad = u64::MAX;
    let mut best = MotionVector::ZERO;
    for i in min_i..=max_i {
        for j in min_j..=max_j {
            let sad = block_sad(reference, target, bx, by, block_w, block_h, i, j);
            if sad < best_sad {
                best_sad = sad;
                best = MotionVector::new(i as i32, j as i32);
                if sad == 0 {
                    return best;
                }
            }
        }
    }
    best
}

/// 估计整帧的运动向量场
///
/// 按光栅顺序对每个不重叠的块调用 [`estimate_block_movement`], 各块并行搜索.
/// 输出尺寸为 `(width / block_w) x (height / block_h)`.
pub fn estimate_block_movement_map(
    reference: &PixelGrid,
    target: &PixelGrid,
    block_w: usize,
    block_h: usize,
    search_radius: usize,
) -> YingResult<MotionField> {
    check_same_size(reference, target)?;
    let (cols, rows) = target.block_count(block_w, block_h)?;

    let vectors: Vec<MotionVector> = (0..rows * cols)
        .into_par_iter()
        .map(|i| {
            let bx = (i % cols) * block_w;
            let by = (i / cols) * block_h;
            estimate_block_movement(reference, target, bx, by, block_w, block_h, search_radius)
        })
        .collect();

    let moving = vectors.iter().filter(|v| **v != MotionVector::ZERO).count();
    trace!(
        "运动估计完成: {}x{} 块, 非零向量 {}, 搜索半径 {}",
        cols, rows, moving, search_radius
    );

    Grid::from_vec(cols, rows, vectors)
}

/// 计算运动补偿后的预测误差 `R[y][x] = F[y][x] - ref[y - dy][x - dx]`
pub fn compute_residual(
    reference: &PixelGrid,
    frame: &PixelGrid,
    field: &MotionField,
    block_w: usize,
    block_h: usize,
) -> YingResult<ResidualGrid> {
    check_same_size(reference, frame)?;
    check_field(frame, field, block_w, block_h)?;

    let mut residual = ResidualGrid::new(frame.width(), frame.height());
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let predicted = displaced(reference, field, x, y, block_w, block_h)?;
            residual.set(x, y, frame.get(x, y) as i32 - predicted as i32);
        }
    }
    Ok(residual)
}

/// 运动补偿重建 `rec[y][x] = clamp(ref[y - dy][x - dx] + R[y][x], 0, 255)`
pub fn reconstruct(
    reference: &PixelGrid,
    residual: &ResidualGrid,
    field: &MotionField,
    block_w: usize,
    block_h: usize,
) -> YingResult<PixelGrid> {
    if !reference.same_size(residual) {
        return Err(YingError::InvalidArgument(format!(
            "残差尺寸 {}x{} 与参考帧 {}x{} 不一致",
            residual.width(),
            residual.height(),
            reference.width(),
            reference.height()
        )));
    }
    check_field(reference, field, block_w, block_h)?;

    let mut frame = PixelGrid::new(reference.width(), reference.height());
    for y in 0..reference.height() {
        for x in 0..reference.width() {
            let predicted = displaced(reference, field, x, y, block_w, block_h)? as i32;
            frame.set(x, y, (predicted + residual.get(x, y)).clamp(0, 255) as u8);
        }
    }
    Ok(frame)
}

/// 读取像素 (x, y) 所在块的位移参考像素
fn displaced(
    reference: &PixelGrid,
    field: &MotionField,
    x: usize,
    y: usize,
    block_w: usize,
    block_h: usize,
) -> YingResult<u8> {
    let mv = field.get(x / block_w, y / block_h);
    let sx = x as i64 - mv.dx as i64;
    let sy = y as i64 - mv.dy as i64;
    if sx < 0 || sy < 0 || sx >= reference.width() as i64 || sy >= reference.height() as i64 {
        return Err(YingError::MalformedInput(format!(
            "运动向量 {} 在像素 ({}, {}) 处越出参考帧",
            mv, x, y
        )));
    }
    Ok(reference.get(sx as usize, sy as usize))
}

fn check_same_size(a: &PixelGrid, b: &PixelGrid) -> YingResult<()> {
    if a.same_size(b) {
        Ok(())
    } else {
        Err(YingError::InvalidArgument(format!(
            "帧尺寸不一致: {}x{} 与 {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )))
    }
}

fn check_field(
    frame: &PixelGrid,
    field: &MotionField,
    block_w: usize,
    block_h: usize,
) -> YingResult<()> {
    let (cols, rows) = frame.block_count(block_w, block_h)?;
    if field.width() != cols || field.height() != rows {
        return Err(YingError::MalformedInput(format!(
            "运动向量场尺寸 {}x{} 与块布局 {}x{} 不符",
            field.width(),
            field.height(),
            cols,
            rows
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 无重复纹理的测试图像
    fn textured(width: usize, height: usize) -> PixelGrid {
        Grid::from_fn(width, height, |x, y| ((x * 7 + y * 13 + x * y * 3) % 251) as u8)
    }

    /// 整帧内容平移 (dx, dy), 越界处用边缘像素填充
    fn shifted(frame: &PixelGrid, dx: i32, dy: i32) -> PixelGrid {
        let (w, h) = (frame.width() as i32, frame.height() as i32);
        Grid::from_fn(frame.width(), frame.height(), |x, y| {
            let sx = (x as i32 - dx).clamp(0, w - 1) as usize;
            let sy = (y as i32 - dy).clamp(0, h - 1) as usize;
            frame.get(sx, sy)
        })
    }

    #[test]
    fn test_identical_frames_give_zero_field() {
        let f = textured(32, 32);
        let field = estimate_block_movement_map(&f, &f, 8, 8, 16).unwrap();
        assert_eq!(field.width(), 4);
        assert_eq!(field.height(), 4);
        assert!(field.as_slice().iter().all(|v| *v == MotionVector::ZERO));
    }

    #[test]
    fn test_interior_block_finds_known_shift() {
        let reference = textured(48, 48);
        let target = shifted(&reference, 3, -2);
        // 中心块不受边缘填充影响
        let mv = estimate_block_movement(&reference, &target, 16, 16, 8, 8, 16);
        assert_eq!(mv, MotionVector::new(3, -2));
    }

    #[test]
    fn test_map_recovers_shift_for_every_block() {
        // 目标帧的每个块都等于参考帧平移 (2, 1): 内容取自更大的画布
        let canvas = textured(40, 40);
        let reference = canvas.block(4, 4, 32, 32);
        let target = canvas.block(2, 3, 32, 32);
        let field = estimate_block_movement_map(&reference, &target, 8, 8, 16).unwrap();
        // 左上边缘的块无法向外搜索, 检查内部块
        for by in 1..4 {
            for bx in 1..4 {
                assert_eq!(field.get(bx, by), MotionVector::new(2, 1), "块 ({bx}, {by})");
            }
        }
    }

    #[test]
    fn test_search_window_stays_inside_frame() {
        // 单块帧: 搜索范围只有 (0, 0)
        let reference = textured(8, 8);
        let target = shifted(&reference, 1, 0);
        let mv = estimate_block_movement(&reference, &target, 0, 0, 8, 8, 16);
        assert_eq!(mv, MotionVector::ZERO);
    }

    #[test]
    fn test_map_rejects_bad_block_size() {
        let f = textured(20, 16);
        assert!(matches!(
            estimate_block_movement_map(&f, &f, 8, 8, 16),
            Err(YingError::InvalidBlockSize { .. })
        ));
        let g = textured(16, 16);
        assert!(matches!(
            estimate_block_movement_map(&f, &g, 4, 4, 16),
            Err(YingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_residual_and_reconstruct_are_inverse() {
        let reference = textured(32, 32);
        let target = shifted(&reference, 2, 2);
        let field = estimate_block_movement_map(&reference, &target, 8, 8, 16).unwrap();
        let residual = compute_residual(&reference, &target, &field, 8, 8).unwrap();
        let rec = reconstruct(&reference, &residual, &field, 8, 8).unwrap();
        assert_eq!(rec, target);
    }

    #[test]
    fn test_reconstruct_clamps_to_pixel_range() {
        let reference = PixelGrid::filled(8, 8, 250);
        let residual = ResidualGrid::filled(8, 8, 30);
        let field = MotionField::new(1, 1);
        let rec = reconstruct(&reference, &residual, &field, 8, 8).unwrap();
        assert!(rec.as_slice().iter().all(|&p| p == 255));

        let residual = ResidualGrid::filled(8, 8, -300);
        let rec = reconstruct(&reference, &residual, &field, 8, 8).unwrap();
        assert!(rec.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_reconstruct_rejects_out_of_frame_vector() {
        let reference = PixelGrid::filled(8, 8, 1);
        let residual = ResidualGrid::new(8, 8);
        let field = MotionField::filled(1, 1, MotionVector::new(1, 0));
        assert!(matches!(
            reconstruct(&reference, &residual, &field, 8, 8),
            Err(YingError::MalformedInput(_))
        ));
    }

    /// 12x12 帧, 目标块 (4, 4) 4x4 全为 100; 参考帧只在位移 (-1, 1) 与 (1, -1)
    /// 所读取的两个区域上为 `value`, 其余为 0
    fn two_candidate_frames(value: u8) -> (PixelGrid, PixelGrid) {
        let target = Grid::from_fn(12, 12, |x, y| {
            if (4..8).contains(&x) && (4..8).contains(&y) { 100 } else { 0 }
        });
        let reference = Grid::from_fn(12, 12, |x, y| {
            let a = (5..9).contains(&x) && (3..7).contains(&y);
            let b = (3..7).contains(&x) && (5..9).contains(&y);
            if a || b { value } else { 0 }
        });
        (reference, target)
    }

    #[test]
    fn test_equal_sad_keeps_first_in_i_then_j_order() {
        // 两个候选的 SAD 同为 16 * 10, 先遍历 i 时 (-1, 1) 在 (1, -1) 之前
        let (reference, target) = two_candidate_frames(90);
        let mv = estimate_block_movement(&reference, &target, 4, 4, 4, 4, 1);
        assert_eq!(mv, MotionVector::new(-1, 1));
    }

    #[test]
    fn test_first_exact_match_ends_search() {
        let (reference, target) = two_candidate_frames(100);
        let mv = estimate_block_movement(&reference, &target, 4, 4, 4, 4, 1);
        assert_eq!(mv, MotionVector::new(-1, 1));
    }

    #[test]
    fn test_motion_vector_ops_wrap() {
        let max = MotionVector::new(i32::MAX, 0);
        assert_eq!(max + MotionVector::new(1, 0), MotionVector::new(i32::MIN, 0));
        assert_eq!(MotionVector::new(i32::MIN, 0) - MotionVector::new(1, 0), max);
        assert_eq!(-MotionVector::new(i32::MIN, 0), MotionVector::new(i32::MIN, 0));
    }

    #[test]
    fn test_motion_vector_arithmetic() {
        let a = MotionVector::new(3, -1);
        let b = MotionVector::new(1, 2);
        assert_eq!(a + b, MotionVector::new(4, 1));
        assert_eq!(a - b, MotionVector::new(2, -3));
        assert_eq!(-a, MotionVector::new(-3, 1));
        assert_eq!(format!("{a}"), "(3, -1)");
    }
}
