use crate::align::{idx3d_to_point, point_to_idx3d, RigidTransform};
use crate::config::RenderConfig;
use crate::error::{CalcError, CalcResult};
use crate::{Idx2d, Idx3d, VoxelVolume};
use ndarray::{s, Array2, ArrayView2, ArrayViewMut1, Axis};
use std::ops::Index;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 深度缓冲. 对每个 `(y, x)` 记录第一个达到阈值的层索引.
///
/// 所有值都在 `[0, L]` 内. 没有任何一层达到阈值的列记录为配置给出的 "未命中" 值.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepthBuffer {
    data: Array2<u32>,
    layers: usize,
    no_hit: u32,
}

impl Index<Idx2d> for DepthBuffer {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl DepthBuffer {
    /// 由投影点集构建深度缓冲.
    ///
    /// 每个体素点先经 `transform` 变换, 再四舍五入到最近的体素.
    /// 落在 `(h, w)` 平面外或 `z` 不在 `[0, layers)` 内的点被忽略.
    /// 同一像素保留最小的 `z`; 没有任何点落入的像素记录为 "未命中" 值.
    ///
    /// 该操作用于在交互旋转时重新渲染已分割的表面, 而不必重新分割.
    pub fn from_points<I>(
        points: I,
        transform: &RigidTransform,
        (h, w): Idx2d,
        layers: usize,
        config: &RenderConfig,
    ) -> CalcResult<DepthBuffer>
    where
        I: IntoIterator<Item = Idx3d>,
    {
        if h == 0 || w == 0 {
            return Err(CalcError::BufferEmpty);
        }
        let no_hit = config.no_hit.resolve(layers);
        let mut data = Array2::from_elem((h, w), no_hit);
        let mut projected = 0usize;
        for pos in points {
            let q = transform.apply(&idx3d_to_point(pos));
            let Some((z, y, x)) = point_to_idx3d(&q, (layers, h, w)) else {
                continue;
            };
            let d = &mut data[(y, x)];
            *d = (*d).min(z as u32);
            projected += 1;
        }
        log::trace!("projected {projected} points onto a {h}x{w} depth buffer");
        Ok(Self {
            data,
            layers,
            no_hit,
        })
    }

    /// 深度缓冲的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 生成该缓冲的体数据层数 `L`.
    #[inline]
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// "未命中" 值.
    #[inline]
    pub fn no_hit(&self) -> u32 {
        self.no_hit
    }

    /// 获取给定位置 (高, 宽) 的深度. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<u32> {
        self.data.get(pos).copied()
    }

    /// 该像素是否为背景 (未命中)?
    ///
    /// 在 [`crate::config::NoHitDepth::LastLayer`] 策略下,
    /// 恰好在最后一层命中的像素与背景无法区分, 也会返回 `true`.
    #[inline]
    pub fn is_background(&self, pos: Idx2d) -> bool {
        self.get(pos).is_some_and(|d| d == self.no_hit)
    }

    /// 命中 (非背景) 像素的个数.
    #[inline]
    pub fn hit_count(&self) -> usize {
        self.data.iter().filter(|&&d| d != self.no_hit).count()
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<'_, u32> {
        self.data.view()
    }
}

impl VoxelVolume {
    /// 计算深度缓冲.
    ///
    /// 对每个 `(y, x)` 沿 z 轴从 0 开始扫描, 记录第一个满足 `hu >= threshold`
    /// 的层索引; 若不存在这样的层, 则记录 `config.no_hit` 对应的值.
    /// 各列之间相互独立, 打开 `rayon` feature 时按行并行计算.
    ///
    /// 若切片平面为空 (高或宽为 0), 则返回 [`CalcError::BufferEmpty`].
    pub fn depth_buffer(&self, threshold: i16, config: &RenderConfig) -> CalcResult<DepthBuffer> {
        let (layers, h, w) = self.shape();
        if h == 0 || w == 0 {
            return Err(CalcError::BufferEmpty);
        }
        let no_hit = config.no_hit.resolve(layers);
        let mut out = Array2::from_elem((h, w), no_hit);

        let data = self.data();
        // 逐层读取第 y 行 (内存连续), 只更新尚未命中的像素.
        let scan_row = |y: usize, mut row: ArrayViewMut1<u32>| {
            let mut hit = vec![false; w];
            let mut pending = w;
            for (z, src) in data.slice(s![.., y, ..]).outer_iter().enumerate() {
                if pending == 0 {
                    break;
                }
                for ((x, &hu), depth) in src.indexed_iter().zip(row.iter_mut()) {
                    if !hit[x] && hu >= threshold {
                        hit[x] = true;
                        *depth = z as u32;
                        pending -= 1;
                    }
                }
            }
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                out.axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .enumerate()
                    .for_each(|(y, row)| scan_row(y, row));
            } else {
                out.axis_iter_mut(Axis(0))
                    .enumerate()
                    .for_each(|(y, row)| scan_row(y, row));
            }
        }

        Ok(DepthBuffer {
            data: out,
            layers,
            no_hit,
        })
    }
}
