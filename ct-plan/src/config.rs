//! 渲染配置.
//!
//! 深度缓冲的 "未命中" 值和表面着色步长都属于可视化策略,
//! 因此以配置项而非算法内部常量的形式给出.

use crate::consts::DEFAULT_SHADING_SCALE;
use crate::error::{CalcError, CalcResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 某列体素全部低于阈值时, 深度缓冲记录的值.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NoHitDepth {
    /// 记录为层数 `L`. 这是默认策略.
    #[default]
    Layers,

    /// 记录为最后一层的索引 `L - 1`.
    LastLayer,
}

impl NoHitDepth {
    /// 在总层数为 `layers` 时对应的实际深度值.
    #[inline]
    pub fn resolve(&self, layers: usize) -> u32 {
        match self {
            NoHitDepth::Layers => layers as u32,
            NoHitDepth::LastLayer => layers.saturating_sub(1) as u32,
        }
    }
}

/// 深度提取与表面着色的配置.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    /// "未命中" 深度策略.
    pub no_hit: NoHitDepth,

    /// 着色核的步长 `s`.
    pub shading_scale: f64,
}

impl Default for RenderConfig {
    #[inline]
    fn default() -> Self {
        Self {
            no_hit: NoHitDepth::default(),
            shading_scale: DEFAULT_SHADING_SCALE,
        }
    }
}

impl RenderConfig {
    /// 以给定着色步长构建配置, 其余项取默认值.
    #[inline]
    pub fn with_scale(shading_scale: f64) -> Self {
        Self {
            shading_scale,
            ..Self::default()
        }
    }

    /// 检查着色步长是否为有限正数.
    pub(crate) fn checked_scale(&self) -> CalcResult<f64> {
        let s = self.shading_scale;
        if s.is_finite() && s > 0.0 {
            Ok(s)
        } else {
            Err(CalcError::InvalidScale)
        }
    }
}
