//! 运行时错误.

use crate::Idx3d;
use thiserror::Error;

/// 体数据处理的运行时错误.
///
/// 所有核心操作要么返回值, 要么返回该错误之一, 不会两者兼有.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CalcError {
    /// 输入的 HU 值不在 `[-1024, 3071]` 内.
    #[error("HU value {0} is out of range [-1024, 3071]")]
    HuOutOfRange(i32),

    /// 窗位不在 `[-1024, 3071]` 内.
    #[error("window center {0} is out of range [-1024, 3071]")]
    CenterOutOfRange(i32),

    /// 窗宽不在 `[1, 4095]` 内.
    #[error("window width {0} is out of range [1, 4095]")]
    WidthOutOfRange(i32),

    /// 计算没有产生可用的输出 (例如分割结果中没有任何体素, 或输出缓冲为空).
    #[error("buffer is empty")]
    BufferEmpty,

    /// 三维索引越界. 参数为 `(z, y, x)`.
    #[error("index {0:?} is out of bounds")]
    IndexOutOfBounds(Idx3d),

    /// 数据长度与形状不符.
    #[error("expected {expected} samples, got {actual}")]
    ShapeMismatch {
        /// 形状要求的长度.
        expected: usize,
        /// 实际长度.
        actual: usize,
    },

    /// 着色步长不是有限正数.
    #[error("shading scale must be finite and positive")]
    InvalidScale,

    /// 源点集与目标点集个数不同.
    #[error("point count mismatch: {0} source points vs {1} target points")]
    PointCountMismatch(usize, usize),

    /// 点对不足.
    ///
    /// 参数为目前已有的点对个数.
    #[error("at least 3 correspondences are required, got {0}")]
    TooFewPoints(usize),

    /// 点集共线或重合, 无法确定旋转.
    #[error("degenerate (collinear or coincident) point configuration")]
    DegeneratePoints,

    /// 运行被调用方取消.
    #[error("operation cancelled")]
    Cancelled,
}

/// 体数据处理运行时错误.
pub type CalcResult<T> = Result<T, CalcError>;
