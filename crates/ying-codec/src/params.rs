//! 编码器参数.
//!
//! 一个编码 / 解码会话内只读: 管线构造后不可修改.
//! 支持 serde 反序列化, 缺省字段使用默认值.

use log::warn;
use serde::{Deserialize, Serialize};
use ying_core::{YingError, YingResult};

use crate::quant::check_quant_params;

/// 默认 8x8 感知量化权重表
const DEFAULT_WEIGHTS: [[u16; 8]; 8] = [
    [8, 17, 18, 19, 21, 23, 25, 27],
    [17, 18, 19, 21, 23, 25, 27, 28],
    [20, 21, 22, 23, 24, 26, 28, 30],
    [21, 22, 23, 24, 26, 28, 30, 32],
    [22, 23, 24, 26, 28, 30, 32, 35],
    [23, 24, 26, 28, 30, 32, 35, 38],
    [25, 26, 28, 30, 32, 35, 38, 41],
    [27, 28, 30, 32, 35, 38, 41, 45],
];

/// 默认权重表 (8x8)
pub fn default_weights() -> Vec<Vec<u16>> {
    DEFAULT_WEIGHTS.iter().map(|row| row.to_vec()).collect()
}

/// 将默认权重表按最近索引采样到 size x size
pub fn resampled_weights(size: usize) -> Vec<Vec<u16>> {
    (0..size)
        .map(|y| {
            (0..size)
                .map(|x| DEFAULT_WEIGHTS[y * 8 / size][x * 8 / size])
                .collect()
        })
        .collect()
}

fn default_block_size() -> usize {
    8
}

fn default_scale() -> f64 {
    3.0
}

fn default_dpcm_step() -> f64 {
    1.0
}

/// 编码器参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderParams {
    /// 运动补偿块尺寸
    pub motion_block_size: usize,
    /// DCT 块尺寸
    pub dct_block_size: usize,
    /// 量化权重矩阵 (dct_block_size x dct_block_size, 行优先)
    pub quant_weights: Vec<Vec<u16>>,
    /// 量化步长
    pub quant_scale: f64,
    /// 运动搜索半径, None 表示 2 x motion_block_size
    pub search_radius: Option<usize>,
    /// DPCM 再量化步长 (默认钩子下无效果)
    pub dpcm_step: f64,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            motion_block_size: default_block_size(),
            dct_block_size: default_block_size(),
            quant_weights: default_weights(),
            quant_scale: default_scale(),
            search_radius: None,
            dpcm_step: default_dpcm_step(),
        }
    }
}

impl EncoderParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_motion_block_size(mut self, size: usize) -> Self {
        self.motion_block_size = size;
        self
    }

    /// 设置 DCT 块尺寸, 权重表随之重采样
    pub fn with_dct_block_size(mut self, size: usize) -> Self {
        self.dct_block_size = size;
        self.quant_weights = resampled_weights(size);
        self
    }

    pub fn with_quant_weights(mut self, weights: Vec<Vec<u16>>) -> Self {
        self.quant_weights = weights;
        self
    }

    pub fn with_quant_scale(mut self, scale: f64) -> Self {
        self.quant_scale = scale;
        self
    }

    pub fn with_search_radius(mut self, radius: usize) -> Self {
        self.search_radius = Some(radius);
        self
    }

    pub fn with_dpcm_step(mut self, step: f64) -> Self {
        self.dpcm_step = step;
        self
    }

    /// 实际使用的运动搜索半径
    pub fn effective_search_radius(&self) -> usize {
        self.search_radius.unwrap_or(2 * self.motion_block_size)
    }

    /// 校验参数自身的一致性
    pub fn validate(&self) -> YingResult<()> {
        if self.motion_block_size == 0 {
            return Err(YingError::InvalidArgument("运动块尺寸不能为 0".into()));
        }
        check_quant_params(self.dct_block_size, &self.quant_weights, self.quant_scale)
    }

    /// 校验帧尺寸能被两种块尺寸整除
    pub fn validate_frame(&self, width: usize, height: usize) -> YingResult<()> {
        for block in [self.motion_block_size, self.dct_block_size] {
            if block == 0 || width % block != 0 || height % block != 0 {
                warn!("帧尺寸 {}x{} 无法被块尺寸 {} 整除", width, height, block);
                return Err(YingError::block_size(width, height, block, block));
            }
        }
        Ok(())
    }
}
