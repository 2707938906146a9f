//! 三维区域生长.
//!
//! 从种子体素出发, 沿 6-邻域 (菱形邻域) 扩张, 把所有与种子连通且 HU 不低于阈值的体素标记为区域成员.
//! 结果保存在与体数据同形状的 [`RegionMap`] 中, 供表面提取和质心计算使用.

use crate::consts::gray::{BLACK, DARK_GRAY, WHITE};
use crate::data::diamond_neighbours;
use crate::error::{CalcError, CalcResult};
use crate::render::GraySlice;
use crate::{Idx3d, VoxelVolume};
use ndarray::{Array3, ArrayView3, Axis};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

mod surface;

/// 体素在一次区域生长中的状态.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum RegionState {
    /// 尚未被访问.
    #[default]
    Unvisited = 0,

    /// 属于区域.
    Member = 1,

    /// 已访问, 但 HU 低于阈值. 一次运行中不会再被访问.
    Rejected = 2,
}

impl RegionState {
    /// 可视化友好的灰度: 成员为白色, 拒绝为暗灰色, 未访问为黑色.
    #[inline]
    pub const fn pretty(self) -> u8 {
        match self {
            RegionState::Unvisited => BLACK,
            RegionState::Member => WHITE,
            RegionState::Rejected => DARK_GRAY,
        }
    }
}

/// 区域生长结果, 与体数据同形状, 按 `(z, y, x)` 索引.
///
/// 同一个 `RegionMap` 可以通过 [`RegionMap::regrow`] 反复使用, 避免重新分配.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegionMap {
    state: Array3<RegionState>,
    members: usize,
    seed: Option<Idx3d>,
}

impl RegionMap {
    /// 创建全部为 [`RegionState::Unvisited`] 的结果缓冲.
    pub fn new(shape: Idx3d) -> Self {
        Self {
            state: Array3::from_elem(shape, RegionState::Unvisited),
            members: 0,
            seed: None,
        }
    }

    /// 清空所有状态.
    pub fn reset(&mut self) {
        self.state.fill(RegionState::Unvisited);
        self.members = 0;
        self.seed = None;
    }

    /// 形状 `(layers, height, width)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.state.dim()
    }

    /// 最近一次成功生长所用的种子.
    #[inline]
    pub fn seed(&self) -> Option<Idx3d> {
        self.seed
    }

    /// 成员体素个数.
    #[inline]
    pub fn member_count(&self) -> usize {
        self.members
    }

    /// `pos` 处的状态. 越界时返回 `None`.
    #[inline]
    pub fn state(&self, pos: Idx3d) -> Option<RegionState> {
        self.state.get(pos).copied()
    }

    /// `pos` 是否为区域成员. 越界时返回 `false`.
    #[inline]
    pub fn is_member(&self, pos: Idx3d) -> bool {
        self.state(pos) == Some(RegionState::Member)
    }

    /// 以行优先 (`z`, `y`, `x`) 顺序迭代所有成员体素.
    pub fn members(&self) -> impl Iterator<Item = Idx3d> + '_ {
        self.state
            .indexed_iter()
            .filter(|&(_, &s)| s == RegionState::Member)
            .map(|(pos, _)| pos)
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView3<'_, RegionState> {
        self.state.view()
    }

    /// 按 "x 最快" 的顺序导出状态码 (0/1/2).
    pub fn as_row_major_vec(&self) -> Vec<u8> {
        self.state.iter().map(|&s| s as u8).collect()
    }

    /// 第 `z` 层的可视化灰度切片. 越界时返回 [`CalcError::IndexOutOfBounds`].
    pub fn layer(&self, z: usize) -> CalcResult<GraySlice> {
        if z >= self.shape().0 {
            return Err(CalcError::IndexOutOfBounds((z, 0, 0)));
        }
        let sli = self.state.index_axis(Axis(0), z).map(|s| s.pretty());
        Ok(GraySlice::new(sli))
    }

    /// 清空并以 `seed` 为种子, 在 `volume` 上重新生长.
    ///
    /// 若 `volume` 与自身形状不同, 则按 `volume` 的形状重新分配.
    /// `seed` 越界时返回 [`CalcError::IndexOutOfBounds`], 此时自身保持不变.
    #[inline]
    pub fn regrow(&mut self, volume: &VoxelVolume, seed: Idx3d, threshold: i16) -> CalcResult<()> {
        self.grow(volume, seed, threshold, None)
    }

    /// 与 [`RegionMap::regrow`] 相同, 但每弹出一个体素就检查一次 `cancel`.
    /// 一旦被置位, 立刻清空自身并返回 [`CalcError::Cancelled`].
    #[inline]
    pub fn regrow_with_cancel(
        &mut self,
        volume: &VoxelVolume,
        seed: Idx3d,
        threshold: i16,
        cancel: &AtomicBool,
    ) -> CalcResult<()> {
        self.grow(volume, seed, threshold, Some(cancel))
    }

    fn grow(
        &mut self,
        volume: &VoxelVolume,
        seed: Idx3d,
        threshold: i16,
        cancel: Option<&AtomicBool>,
    ) -> CalcResult<()> {
        if !volume.check(seed) {
            return Err(CalcError::IndexOutOfBounds(seed));
        }
        let shape = volume.shape();
        if self.shape() != shape {
            *self = Self::new(shape);
        } else {
            self.reset();
        }
        log::debug!("region growing from {seed:?} with threshold {threshold} HU");
        let start = Instant::now();

        self.state[seed] = RegionState::Member;
        let mut members = 1;
        let mut stack = Vec::with_capacity(1024);
        stack.push(seed);

        while let Some(pos) = stack.pop() {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                self.reset();
                log::debug!("region growing from {seed:?} cancelled");
                return Err(CalcError::Cancelled);
            }
            for neigh in diamond_neighbours(pos, shape) {
                let slot = &mut self.state[neigh];
                if *slot != RegionState::Unvisited {
                    continue;
                }
                *slot = RegionState::Rejected;
                if volume[neigh] >= threshold {
                    *slot = RegionState::Member;
                    members += 1;
                    stack.push(neigh);
                }
            }
        }

        self.members = members;
        self.seed = Some(seed);
        log::debug!(
            "region grown: {members} voxels in {:.3} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }
}

impl VoxelVolume {
    /// 以 `seed` `(z, y, x)` 为种子, 生长出所有与其 6-连通且 HU 不低于 `threshold` 的体素.
    ///
    /// 种子本身无论 HU 如何都会被标记为成员.
    /// `seed` 越界时返回 [`CalcError::IndexOutOfBounds`].
    pub fn grow_region(&self, seed: Idx3d, threshold: i16) -> CalcResult<RegionMap> {
        let mut map = RegionMap::new(self.shape());
        map.regrow(self, seed, threshold)?;
        Ok(map)
    }

    /// 可取消的 [`VoxelVolume::grow_region`].
    pub fn grow_region_with_cancel(
        &self,
        seed: Idx3d,
        threshold: i16,
        cancel: &AtomicBool,
    ) -> CalcResult<RegionMap> {
        let mut map = RegionMap::new(self.shape());
        map.regrow_with_cancel(self, seed, threshold, cancel)?;
        Ok(map)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `(6, 7, 8)` 体数据, 其中 `z in 1..4, y in 2..5, x in 1..6` 的长方体为 1000 HU, 其余为 -1000 HU.
    pub(crate) fn cuboid() -> VoxelVolume {
        VoxelVolume::from_shape_fn((6, 7, 8), |(z, y, x)| {
            if (1..4).contains(&z) && (2..5).contains(&y) && (1..6).contains(&x) {
                1000
            } else {
                -1000
            }
        })
    }

    #[test]
    fn test_cuboid() {
        let v = cuboid();
        let map = v.grow_region((2, 3, 3), 500).unwrap();
        assert_eq!(map.member_count(), 3 * 3 * 5);
        assert_eq!(map.members().count(), 45);
        assert_eq!(map.seed(), Some((2, 3, 3)));
        assert!(map.is_member((1, 2, 1)));
        assert!(!map.is_member((0, 2, 1)));
        assert_eq!(map.state((0, 2, 1)), Some(RegionState::Rejected));
        assert_eq!(map.state((5, 6, 7)), Some(RegionState::Unvisited));
        assert_eq!(map.state((6, 0, 0)), None);
    }

    #[test]
    fn test_threshold_above_everything() {
        let v = cuboid();
        let map = v.grow_region((2, 3, 3), 2000).unwrap();
        assert_eq!(map.member_count(), 1);
        assert_eq!(map.members().collect::<Vec<_>>(), vec![(2, 3, 3)]);
        for n in diamond_neighbours((2, 3, 3), v.shape()) {
            assert_eq!(map.state(n), Some(RegionState::Rejected));
        }
    }

    #[test]
    fn test_seed_below_threshold_is_member() {
        let v = cuboid();
        // (0, 3, 3) 在长方体正上方, 本身低于阈值.
        let map = v.grow_region((0, 3, 3), 500).unwrap();
        assert!(map.is_member((0, 3, 3)));
        assert_eq!(map.member_count(), 1 + 45);
    }

    #[test]
    fn test_boundary_and_singleton() {
        let v = VoxelVolume::filled((3, 4, 5), 100);
        let map = v.grow_region((2, 3, 4), 0).unwrap();
        assert_eq!(map.member_count(), 60);

        let v = VoxelVolume::filled((1, 1, 1), -1000);
        let map = v.grow_region((0, 0, 0), 3000).unwrap();
        assert_eq!(map.member_count(), 1);
        assert_eq!(map.as_row_major_vec(), vec![1]);
    }

    #[test]
    fn test_seed_out_of_bounds() {
        let v = cuboid();
        assert_eq!(
            v.grow_region((6, 0, 0), 500),
            Err(CalcError::IndexOutOfBounds((6, 0, 0)))
        );
        assert_eq!(
            v.grow_region((0, 0, 8), 500),
            Err(CalcError::IndexOutOfBounds((0, 0, 8)))
        );
    }

    #[test]
    fn test_regrow_resets() {
        let v = cuboid();
        let mut map = v.grow_region((2, 3, 3), 500).unwrap();
        map.regrow(&v, (5, 6, 7), 500).unwrap();
        assert_eq!(map.member_count(), 1);
        assert!(!map.is_member((2, 3, 3)));
        assert_eq!(map.state((2, 3, 3)), Some(RegionState::Unvisited));

        let mut other = RegionMap::new((1, 1, 1));
        other.regrow(&v, (2, 3, 3), 500).unwrap();
        assert_eq!(other.shape(), v.shape());
        assert_eq!(other, v.grow_region((2, 3, 3), 500).unwrap());
    }

    #[test]
    fn test_cancel() {
        let v = cuboid();
        let flag = AtomicBool::new(true);
        assert_eq!(
            v.grow_region_with_cancel((2, 3, 3), 500, &flag),
            Err(CalcError::Cancelled)
        );

        let mut map = v.grow_region((2, 3, 3), 500).unwrap();
        assert_eq!(
            map.regrow_with_cancel(&v, (2, 3, 3), 500, &flag),
            Err(CalcError::Cancelled)
        );
        assert_eq!(map.member_count(), 0);
        assert!(map.as_row_major_vec().iter().all(|&c| c == 0));

        flag.store(false, Ordering::Relaxed);
        let map = v.grow_region_with_cancel((2, 3, 3), 500, &flag).unwrap();
        assert_eq!(map, v.grow_region((2, 3, 3), 500).unwrap());
    }

    #[test]
    fn test_layer() {
        let v = cuboid();
        let map = v.grow_region((2, 3, 3), 500).unwrap();
        let sli = map.layer(2).unwrap();
        assert_eq!(sli.shape(), (7, 8));
        assert_eq!(sli[(3, 3)], WHITE);
        assert_eq!(sli[(1, 3)], DARK_GRAY);
        assert_eq!(sli[(0, 0)], BLACK);
        assert_eq!(map.layer(6), Err(CalcError::IndexOutOfBounds((6, 0, 0))));
    }
}
