//! 区域表面与质心.

use super::RegionMap;
use crate::data::diamond_neighbours;
use crate::error::{CalcError, CalcResult};
use crate::Idx3d;
use nalgebra::Point3;

impl RegionMap {
    /// 提取区域的表面体素, 按行优先 `(z, y, x)` 顺序排列.
    ///
    /// 若一个成员体素的 6 个邻居中至少有一个不是成员, 则它是表面体素.
    /// 体数据之外的邻居视为非成员, 因此贴着体数据边界的成员总是表面体素.
    ///
    /// 区域为空时返回 [`CalcError::BufferEmpty`].
    pub fn surface_points(&self) -> CalcResult<Vec<Idx3d>> {
        if self.member_count() == 0 {
            return Err(CalcError::BufferEmpty);
        }
        let shape = self.shape();
        let points: Vec<Idx3d> = self
            .members()
            .filter(|&pos| {
                diamond_neighbours(pos, shape)
                    .filter(|&n| self.is_member(n))
                    .count()
                    < 6
            })
            .collect();
        log::debug!(
            "{} of {} region voxels lie on the surface",
            points.len(),
            self.member_count()
        );
        Ok(points)
    }

    /// 区域质心, 以 `(x, y, z)` 物理坐标给出.
    ///
    /// 先以整数累加各坐标分量, 最后再做一次除法.
    /// 区域为空时返回 [`CalcError::BufferEmpty`].
    pub fn centroid(&self) -> CalcResult<Point3<f64>> {
        let (mut sz, mut sy, mut sx, mut n) = (0u64, 0u64, 0u64, 0u64);
        for (z, y, x) in self.members() {
            sz += z as u64;
            sy += y as u64;
            sx += x as u64;
            n += 1;
        }
        if n == 0 {
            return Err(CalcError::BufferEmpty);
        }
        let n = n as f64;
        Ok(Point3::new(sx as f64 / n, sy as f64 / n, sz as f64 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::cuboid;
    use super::*;
    use crate::VoxelVolume;
    use approx::assert_relative_eq;
    use itertools::iproduct;

    #[test]
    fn test_cuboid_shell() {
        let map = cuboid().grow_region((2, 3, 3), 500).unwrap();
        let surface = map.surface_points().unwrap();
        // 长方体 z in 1..4, y in 2..5, x in 1..6 中, 落在任一面上的体素.
        let expected: Vec<Idx3d> = iproduct!(1..4, 2..5, 1..6)
            .filter(|&(z, y, x)| z == 1 || z == 3 || y == 2 || y == 4 || x == 1 || x == 5)
            .collect();
        assert_eq!(expected.len(), 45 - 3);
        assert_eq!(surface, expected);
        for interior in [(2, 3, 2), (2, 3, 3), (2, 3, 4)] {
            assert!(map.is_member(interior));
            assert!(!surface.contains(&interior));
        }
    }

    #[test]
    fn test_boundary_counts_as_outside() {
        let v = VoxelVolume::filled((3, 3, 3), 1000);
        let map = v.grow_region((1, 1, 1), 0).unwrap();
        let surface = map.surface_points().unwrap();
        assert_eq!(surface.len(), 26);
        assert!(!surface.contains(&(1, 1, 1)));

        let v = VoxelVolume::filled((1, 1, 1), 0);
        let map = v.grow_region((0, 0, 0), 0).unwrap();
        assert_eq!(map.surface_points().unwrap(), vec![(0, 0, 0)]);
    }

    #[test]
    fn test_centroid() {
        let map = cuboid().grow_region((2, 3, 3), 500).unwrap();
        assert_relative_eq!(map.centroid().unwrap(), Point3::new(3.0, 3.0, 2.0));

        let v = VoxelVolume::from_shape_fn((1, 1, 4), |(_, _, x)| if x < 2 { 100 } else { -100 });
        let map = v.grow_region((0, 0, 0), 0).unwrap();
        assert_relative_eq!(map.centroid().unwrap(), Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_empty_region() {
        let map = RegionMap::new((2, 2, 2));
        assert_eq!(map.surface_points(), Err(CalcError::BufferEmpty));
        assert_eq!(map.centroid(), Err(CalcError::BufferEmpty));
    }
}
