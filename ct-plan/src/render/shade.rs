use super::{DepthBuffer, GraySlice};
use crate::config::RenderConfig;
use crate::error::{CalcError, CalcResult};
use ndarray::{s, Array2, ArrayView2, ArrayViewMut1, Axis};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 表面着色结果, 8-bit 灰度图像.
pub type ShadedImage = GraySlice;

/// 由深度梯度 `(tx, ty)` 和步长 `s` 计算着色亮度.
///
/// `I = round(255 * s^2 / sqrt(s^2 * tx^2 + s^2 * ty^2 + s^4))`.
/// 平坦表面 (梯度为 0) 得到 255, 梯度越大越暗.
#[inline]
pub fn intensity(tx: i64, ty: i64, s: f64) -> u8 {
    let s_sq = s * s;
    let (tx, ty) = (tx as f64, ty as f64);
    let denom = (s_sq * tx * tx + s_sq * ty * ty + s_sq * s_sq).sqrt();
    (255.0 * s_sq / denom).round().min(255.0) as u8
}

/// 计算内部像素 `(y, x)` 的亮度. 调用方保证 `(y, x)` 不在边缘上.
#[inline]
fn shade_pixel(depth: &ArrayView2<u32>, (y, x): (usize, usize), s: f64) -> u8 {
    let tx = depth[(y, x + 1)] as i64 - depth[(y, x - 1)] as i64;
    let ty = depth[(y + 1, x)] as i64 - depth[(y - 1, x)] as i64;
    intensity(tx, ty, s)
}

impl DepthBuffer {
    /// 以离散梯度估计表面法向, 渲染出带阴影的 8-bit 灰度图.
    ///
    /// 着色核只在内部像素上计算, 最外一圈像素保持为 0.
    /// 打开 `rayon` feature 时按行并行计算.
    ///
    /// # 错误
    ///
    /// 1. 深度缓冲为空时返回 [`CalcError::BufferEmpty`];
    /// 2. `config.shading_scale` 不是有限正数时返回 [`CalcError::InvalidScale`].
    pub fn shade(&self, config: &RenderConfig) -> CalcResult<ShadedImage> {
        let s = config.checked_scale()?;
        let (h, w) = self.shape();
        if h == 0 || w == 0 {
            return Err(CalcError::BufferEmpty);
        }
        let mut out = Array2::<u8>::zeros((h, w));
        if h < 3 || w < 3 {
            // 没有内部像素.
            return Ok(GraySlice::new(out));
        }

        let depth = self.array_view();
        let shade_row = |y: usize, mut row: ArrayViewMut1<u8>| {
            for x in 1..w - 1 {
                row[x] = shade_pixel(&depth, (y, x), s);
            }
        };

        let mut interior = out.slice_mut(s![1..h - 1, ..]);
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                interior
                    .axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .enumerate()
                    .for_each(|(i, row)| shade_row(i + 1, row));
            } else {
                interior
                    .axis_iter_mut(Axis(0))
                    .enumerate()
                    .for_each(|(i, row)| shade_row(i + 1, row));
            }
        }

        Ok(GraySlice::new(out))
    }
}
