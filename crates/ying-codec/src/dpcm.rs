//! 差分脉冲编码调制 (DPCM).
//!
//! 光栅扫描, 每行开始时预测值重置为零元, 预测值为左邻的重建值.
//! 同一算法同时用于量化系数矩阵 (f64) 和运动向量场 (MotionVector).

use std::ops::{Add, Sub};

use ying_core::Grid;

use crate::motion::MotionVector;

/// 可做 DPCM 的元素: 零元 (Default)、加法、减法
pub trait DpcmSample: Copy + Default + Add<Output = Self> + Sub<Output = Self> {}

impl<T> DpcmSample for T where T: Copy + Default + Add<Output = T> + Sub<Output = T> {}

/// 预测误差的再量化钩子
pub trait StepQuantizer<T> {
    fn quantize_step(&self, error: T, step: f64) -> T;
}

/// 恒等钩子: 忽略步长, DPCM 无损
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStep;

impl<T> StepQuantizer<T> for IdentityStep {
    fn quantize_step(&self, error: T, _step: f64) -> T {
        error
    }
}

/// 均匀再量化: `step · round(e / step)`, 有损
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformStep;

impl StepQuantizer<f64> for UniformStep {
    fn quantize_step(&self, error: f64, step: f64) -> f64 {
        if step <= 0.0 {
            return error;
        }
        step * (error / step).round()
    }
}

impl StepQuantizer<MotionVector> for UniformStep {
    fn quantize_step(&self, error: MotionVector, step: f64) -> MotionVector {
        if step <= 0.0 {
            return error;
        }
        let q = |v: i32| (step * (v as f64 / step).round()) as i32;
        MotionVector::new(q(error.dx), q(error.dy))
    }
}

/// DPCM 编码 (恒等再量化)
pub fn dpcm_encode<T: DpcmSample>(matrix: &Grid<T>, step: f64) -> Grid<T> {
    dpcm_encode_with(matrix, step, &IdentityStep)
}

/// 使用指定再量化钩子的 DPCM 编码
pub fn dpcm_encode_with<T, Q>(matrix: &Grid<T>, step: f64, quantizer: &Q) -> Grid<T>
where
    T: DpcmSample,
    Q: StepQuantizer<T>,
{
    let mut errors = matrix.clone();
    for y in 0..matrix.height() {
        let mut predictor = T::default();
        for e in errors.row_mut(y) {
            let error = quantizer.quantize_step(*e - predictor, step);
            predictor = predictor + error;
            *e = error;
        }
    }
    errors
}

/// DPCM 解码
pub fn dpcm_decode<T: DpcmSample>(errors: &Grid<T>) -> Grid<T> {
    let mut matrix = errors.clone();
    for y in 0..errors.height() {
        let mut predictor = T::default();
        for v in matrix.row_mut(y) {
            *v = *v + predictor;
            predictor = *v;
        }
    }
    matrix
}
