//! CT 窗口: 将 HU 值映射为 8-bit 灰度.

use crate::consts::hu::{is_hu, is_width};
use crate::consts::{DEFAULT_CENTER, DEFAULT_WIDTH};
use crate::error::{CalcError, CalcResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// CT 窗口, 包含窗位 (center) 和窗宽 (width), 均以 HU 为单位.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawWindow"))]
pub struct HuWindow {
    center: i32,
    width: i32,
}

/// 未经检查的窗口参数. 反序列化时先得到它, 再经 [`HuWindow::new`] 检查.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawWindow {
    center: i32,
    width: i32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawWindow> for HuWindow {
    type Error = CalcError;

    #[inline]
    fn try_from(raw: RawWindow) -> CalcResult<HuWindow> {
        HuWindow::new(raw.center, raw.width)
    }
}

impl Default for HuWindow {
    /// 窗位 0, 窗宽 1200.
    #[inline]
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            width: DEFAULT_WIDTH,
        }
    }
}

impl HuWindow {
    /// 构建 CT 窗.
    ///
    /// 先检查窗宽, 再检查窗位. 窗宽须在 `[1, 4095]` 内, 否则返回
    /// [`CalcError::WidthOutOfRange`]; 窗位须在 `[-1024, 3071]` 内, 否则返回
    /// [`CalcError::CenterOutOfRange`].
    pub fn new(center: i32, width: i32) -> CalcResult<HuWindow> {
        if !is_width(width) {
            return Err(CalcError::WidthOutOfRange(width));
        }
        if !is_hu(center) {
            return Err(CalcError::CenterOutOfRange(center));
        }
        Ok(Self { center, width })
    }

    /// 软组织窗. 窗位 40, 窗宽 400.
    #[inline]
    pub const fn soft_tissue() -> HuWindow {
        Self {
            center: 40,
            width: 400,
        }
    }

    /// 骨窗. 窗位 500, 窗宽 1000.
    #[inline]
    pub const fn bone() -> HuWindow {
        Self {
            center: 500,
            width: 1000,
        }
    }

    /// 窗位.
    #[inline]
    pub fn center(&self) -> i32 {
        self.center
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// 窗下限. 先以实数计算 `center - width / 2`, 再向零截断.
    #[inline]
    pub fn lower_bound(&self) -> i32 {
        (self.center as f64 - self.half_width()) as i32
    }

    /// 窗上限. 先以实数计算 `center + width / 2`, 再向零截断.
    #[inline]
    pub fn upper_bound(&self) -> i32 {
        (self.center as f64 + self.half_width()) as i32
    }

    #[inline]
    fn half_width(&self) -> f64 {
        0.5 * self.width as f64
    }

    /// 求在当前 CT 窗设置下, HU 值 `sample` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `sample` 不在 `[-1024, 3071]` 内, 则返回 [`CalcError::HuOutOfRange`].
    pub fn eval(&self, sample: i32) -> CalcResult<u8> {
        if !is_hu(sample) {
            return Err(CalcError::HuOutOfRange(sample));
        }
        Ok(self.eval_unchecked(sample))
    }

    /// 与 [`Self::eval`] 相同, 但不检查 `sample` 是否在 HU 定义域内.
    /// 定义域外的值同样被截断到 0 或 255.
    pub fn eval_unchecked(&self, sample: i32) -> u8 {
        let lb = self.lower_bound();
        if sample < lb {
            u8::MIN
        } else if sample > self.upper_bound() {
            u8::MAX
        } else {
            // 先乘后除. 255, not 256.
            let v = ((sample - lb) as f64 * 255.0 / self.width as f64).round();
            v.min(255.0) as u8
        }
    }
}

/// 对单个 HU 值 `sample` 做窗口映射.
///
/// 参数检查顺序固定为: `sample` ([`CalcError::HuOutOfRange`]), `width`
/// ([`CalcError::WidthOutOfRange`]), `center` ([`CalcError::CenterOutOfRange`]).
/// 多个参数同时非法时, 报告最先检查失败的那一个.
#[inline]
pub fn window(sample: i32, center: i32, width: i32) -> CalcResult<u8> {
    if !is_hu(sample) {
        return Err(CalcError::HuOutOfRange(sample));
    }
    HuWindow::new(center, width)?.eval(sample)
}
