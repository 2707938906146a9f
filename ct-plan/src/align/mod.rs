//! 刚体配准.
//!
//! 给定一一对应的两组三维点 (例如图像空间中的标记点和外部跟踪设备坐标系中的同一组标记点),
//! 以 Kabsch 算法求出使 `R * source + t` 与 `target` 最接近 (最小二乘意义下) 的旋转与平移.
//!
//! 体素索引按 `(z, y, x)` 组织, 而本模块的浮点点集一律按物理坐标 `(x, y, z)` 组织.
//! 二者之间的转换只通过 [`idx3d_to_point`] 和 [`point_to_idx3d`] 进行.

use crate::consts::{DEGENERACY_EPS, MIN_CORRESPONDENCES};
use crate::error::{CalcError, CalcResult};
use crate::Idx3d;
use itertools::Itertools;
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 体素索引 `(z, y, x)` 转换为物理坐标点 `(x, y, z)`.
#[inline]
pub fn idx3d_to_point((z, y, x): Idx3d) -> Point3<f64> {
    Point3::new(x as f64, y as f64, z as f64)
}

/// 物理坐标点四舍五入到最近的体素, 返回其 `(z, y, x)` 索引.
///
/// 若任一分量不是有限数, 或不在 `shape = (layers, height, width)` 的范围内, 则返回 `None`.
pub fn point_to_idx3d(p: &Point3<f64>, (lz, ly, lx): Idx3d) -> Option<Idx3d> {
    let round = |v: f64, len: usize| {
        let r = v.round();
        (r.is_finite() && r >= 0.0 && r < len as f64).then_some(r as usize)
    };
    Some((round(p.z, lz)?, round(p.y, ly)?, round(p.x, lx)?))
}

/// 刚体变换 `p -> R * p + t`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidTransform {
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
}

impl Default for RigidTransform {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// 恒等变换.
    #[inline]
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// 直接初始化.
    #[inline]
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// 绕 `pivot` 点旋转的变换. 角度为弧度, 旋转顺序与
    /// [`Rotation3::from_euler_angles`] 一致 (先 roll, 再 pitch, 最后 yaw).
    ///
    /// 交互式旋转已分割的区域时, 通常以区域质心为 `pivot`.
    pub fn from_euler_about(roll: f64, pitch: f64, yaw: f64, pivot: &Point3<f64>) -> Self {
        let rotation = Rotation3::from_euler_angles(roll, pitch, yaw);
        let translation = pivot.coords - rotation * pivot.coords;
        Self {
            rotation,
            translation,
        }
    }

    /// 旋转部分.
    #[inline]
    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// 平移部分.
    #[inline]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// 将变换作用于点 `p`.
    #[inline]
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation * p + self.translation
    }

    /// 复合变换: 先应用 `self`, 再应用 `other`.
    pub fn then(&self, other: &RigidTransform) -> RigidTransform {
        Self {
            rotation: other.rotation * self.rotation,
            translation: other.rotation * self.translation + other.translation,
        }
    }

    /// 逆变换.
    pub fn inverse(&self) -> RigidTransform {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// 4x4 齐次矩阵.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut m = self.rotation.to_homogeneous();
        for i in 0..3 {
            m[(i, 3)] = self.translation[i];
        }
        m
    }

    /// 变换后的 `source` 与 `target` 之间的均方根距离, 可用于衡量配准质量.
    ///
    /// # 错误
    ///
    /// 1. 两组点个数不同时返回 [`CalcError::PointCountMismatch`];
    /// 2. 点集为空时返回 [`CalcError::TooFewPoints`].
    pub fn rms_error(&self, source: &[Point3<f64>], target: &[Point3<f64>]) -> CalcResult<f64> {
        if source.len() != target.len() {
            return Err(CalcError::PointCountMismatch(source.len(), target.len()));
        }
        if source.is_empty() {
            return Err(CalcError::TooFewPoints(0));
        }
        let sq_sum: f64 = source
            .iter()
            .zip_eq(target)
            .map(|(s, t)| (self.apply(s) - t).norm_squared())
            .sum();
        Ok((sq_sum / source.len() as f64).sqrt())
    }
}

/// 点集质心. 调用方保证 `points` 非空.
fn mean(points: &[Point3<f64>]) -> Vector3<f64> {
    points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f64
}

/// 求解使 `R * source[i] + t` 与 `target[i]` 的平方距离和最小的刚体变换.
///
/// 1. 两组点分别减去各自的质心 `s̄`, `t̄`;
/// 2. 构造协方差矩阵 `H = Σ (s - s̄)(t - t̄)^T`, 并做奇异值分解 `H = U Σ V^T`;
/// 3. `R = V U^T`. 若 `det(R) < 0` (得到的是反射), 则将 `V` 中对应最小奇异值的列取反后重新计算;
/// 4. `t = t̄ - R s̄`.
///
/// 返回的旋转矩阵总是满足 `det(R) = +1`.
///
/// # 错误
///
/// 1. 两组点个数不同时返回 [`CalcError::PointCountMismatch`];
/// 2. 点对少于 3 个时返回 [`CalcError::TooFewPoints`];
/// 3. 源点集共线或重合 (旋转不唯一) 时返回 [`CalcError::DegeneratePoints`].
pub fn estimate(source: &[Point3<f64>], target: &[Point3<f64>]) -> CalcResult<RigidTransform> {
    if source.len() != target.len() {
        return Err(CalcError::PointCountMismatch(source.len(), target.len()));
    }
    if source.len() < MIN_CORRESPONDENCES {
        return Err(CalcError::TooFewPoints(source.len()));
    }

    let s_bar = mean(source);
    let t_bar = mean(target);
    let h: Matrix3<f64> = source
        .iter()
        .zip_eq(target)
        .fold(Matrix3::zeros(), |acc, (s, t)| {
            acc + (s.coords - s_bar) * (t.coords - t_bar).transpose()
        });

    let svd = h.svd(true, true);
    let (Some(u), Some(mut v_t)) = (svd.u, svd.v_t) else {
        return Err(CalcError::DegeneratePoints);
    };

    // 奇异值按降序排列后再判断秩.
    let sigma = svd.singular_values;
    let order: Vec<usize> = (0..3)
        .sorted_by(|&a, &b| sigma[b].total_cmp(&sigma[a]))
        .collect();
    let (largest, second, smallest) = (sigma[order[0]], sigma[order[1]], order[2]);
    if !largest.is_finite() || largest <= f64::EPSILON || second <= DEGENERACY_EPS * largest {
        return Err(CalcError::DegeneratePoints);
    }

    let mut r = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        // V 的第 k 列即 V^T 的第 k 行.
        for j in 0..3 {
            v_t[(smallest, j)] = -v_t[(smallest, j)];
        }
        r = v_t.transpose() * u.transpose();
    }
    let rotation = Rotation3::from_matrix_unchecked(r);
    let translation = t_bar - rotation * s_bar;
    log::trace!("estimated rigid transform from {} correspondences", source.len());

    Ok(RigidTransform {
        rotation,
        translation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::FRAC_PI_2;

    fn markers() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 20.0, 0.0),
            Point3::new(0.0, 0.0, 30.0),
            Point3::new(5.0, 7.0, 11.0),
        ]
    }

    fn transformed(points: &[Point3<f64>], tf: &RigidTransform) -> Vec<Point3<f64>> {
        points.iter().map(|p| tf.apply(p)).collect()
    }

    #[test]
    fn test_idx_point_conversion() {
        let p = idx3d_to_point((1, 2, 3));
        assert_eq!(p, Point3::new(3.0, 2.0, 1.0));
        assert_eq!(point_to_idx3d(&p, (2, 3, 4)), Some((1, 2, 3)));
        assert_eq!(point_to_idx3d(&Point3::new(2.6, 0.4, -0.4), (2, 3, 4)), Some((0, 0, 3)));
        assert_eq!(point_to_idx3d(&Point3::new(3.6, 0.0, 0.0), (2, 3, 4)), None);
        assert_eq!(point_to_idx3d(&Point3::new(0.0, -0.6, 0.0), (2, 3, 4)), None);
        assert_eq!(point_to_idx3d(&Point3::new(f64::NAN, 0.0, 0.0), (2, 3, 4)), None);
    }

    #[test]
    fn test_recover_known_transform() {
        let truth = RigidTransform::new(
            Rotation3::from_euler_angles(0.3, -0.2, 1.1),
            Vector3::new(12.0, -4.5, 100.0),
        );
        let source = markers();
        let target = transformed(&source, &truth);

        let tf = estimate(&source, &target).unwrap();
        assert_relative_eq!(tf.rotation().matrix(), truth.rotation().matrix(), epsilon = 1e-9);
        assert_relative_eq!(tf.translation(), truth.translation(), epsilon = 1e-9);
        assert_abs_diff_eq!(tf.rotation().matrix().determinant(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tf.rms_error(&source, &target).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identity() {
        let source = markers();
        let tf = estimate(&source, &source).unwrap();
        assert_relative_eq!(tf.to_homogeneous(), Matrix4::identity(), epsilon = 1e-9);
    }

    #[test]
    fn test_coplanar_mirror_is_not_a_reflection() {
        // 平面点集, 最小奇异值为 0, 朴素的 V U^T 可能给出反射.
        let source = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(4.0, 3.0, 0.0),
        ];
        let truth = RigidTransform::new(
            Rotation3::from_euler_angles(0.0, 0.0, FRAC_PI_2),
            Vector3::new(1.0, 2.0, 3.0),
        );
        let target = transformed(&source, &truth);
        let tf = estimate(&source, &target).unwrap();
        assert_abs_diff_eq!(tf.rotation().matrix().determinant(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tf.rms_error(&source, &target).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reflected_target_still_gives_rotation() {
        let source = markers();
        let target: Vec<_> = source.iter().map(|p| Point3::new(-p.x, p.y, p.z)).collect();
        let tf = estimate(&source, &target).unwrap();
        assert_abs_diff_eq!(tf.rotation().matrix().determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        let source = markers();
        assert_eq!(
            estimate(&source, &source[..4]),
            Err(CalcError::PointCountMismatch(5, 4))
        );
        assert_eq!(
            estimate(&source[..2], &source[..2]),
            Err(CalcError::TooFewPoints(2))
        );

        let line: Vec<_> = (0..5).map(|i| Point3::new(i as f64, 2.0 * i as f64, 0.0)).collect();
        assert_eq!(estimate(&line, &line), Err(CalcError::DegeneratePoints));

        let same = vec![Point3::new(1.0, 1.0, 1.0); 4];
        assert_eq!(estimate(&same, &same), Err(CalcError::DegeneratePoints));
    }

    #[test]
    fn test_compose_and_inverse() {
        let a = RigidTransform::new(
            Rotation3::from_euler_angles(0.1, 0.2, 0.3),
            Vector3::new(1.0, 2.0, 3.0),
        );
        let b = RigidTransform::new(
            Rotation3::from_euler_angles(-0.4, 0.0, 0.9),
            Vector3::new(-5.0, 0.5, 0.0),
        );
        let p = Point3::new(3.0, -1.0, 7.0);
        assert_relative_eq!(a.then(&b).apply(&p), b.apply(&a.apply(&p)), epsilon = 1e-9);
        assert_relative_eq!(a.inverse().apply(&a.apply(&p)), p, epsilon = 1e-9);
        assert_relative_eq!(
            a.to_homogeneous() * a.inverse().to_homogeneous(),
            Matrix4::identity(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rotation_about_pivot() {
        let pivot = Point3::new(10.0, 10.0, 5.0);
        let tf = RigidTransform::from_euler_about(0.0, 0.0, FRAC_PI_2, &pivot);
        assert_relative_eq!(tf.apply(&pivot), pivot, epsilon = 1e-9);
        assert_relative_eq!(
            tf.apply(&Point3::new(11.0, 10.0, 5.0)),
            Point3::new(10.0, 11.0, 5.0),
            epsilon = 1e-9
        );
    }
}
