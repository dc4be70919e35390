//! 编码帧 (EncodedFrame).
//!
//! 内存中的结构化值, 不规定字节级封装. 每个输入帧产生一个, 解码器消费一次.

use ying_core::CoeffMatrix;

use crate::motion::MotionField;
use crate::quant::FrameType;

/// 编码帧
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedFrame {
    /// 帧内编码: 整幅图像的量化 + DPCM 编码系数
    Intra {
        coefficients: CoeffMatrix,
    },
    /// 预测编码: 残差的量化 + DPCM 编码系数, 以及 DPCM 编码的运动向量场
    Predicted {
        coefficients: CoeffMatrix,
        motion: MotionField,
    },
}

impl EncodedFrame {
    /// 帧类型
    pub fn frame_type(&self) -> FrameType {
        match self {
            EncodedFrame::Intra { .. } => FrameType::Intra,
            EncodedFrame::Predicted { .. } => FrameType::Predicted,
        }
    }

    /// DPCM 编码后的系数矩阵
    pub fn coefficients(&self) -> &CoeffMatrix {
        match self {
            EncodedFrame::Intra { coefficients } | EncodedFrame::Predicted { coefficients, .. } => {
                coefficients
            }
        }
    }

    /// DPCM 编码后的运动向量场 (仅 Predicted)
    pub fn motion(&self) -> Option<&MotionField> {
        match self {
            EncodedFrame::Intra { .. } => None,
            EncodedFrame::Predicted { motion, .. } => Some(motion),
        }
    }

    pub fn is_intra(&self) -> bool {
        matches!(self, EncodedFrame::Intra { .. })
    }
}
