use std::borrow::Cow;
use std::ops::Index;

use ndarray::{Array2, Array3, ArrayView, ArrayView2, Axis, Ix3};

use crate::error::{CalcError, CalcResult};
use crate::render::GraySlice;
use crate::{Idx2d, Idx3d};

pub mod neighbour;
pub mod raw;
pub mod window;

pub use neighbour::{diamond_neighbours, Diamond};
pub use raw::OpenVolumeError;
pub use window::{window, HuWindow};

/// 3D CT 体数据. 每个体素保存一个 `i16` HU 值.
///
/// 数据以 `(z, y, x)` 形状的标准布局存储, 因此内存顺序就是
/// "x 最快, y 次之, z 最慢" 的扁平顺序. 以后均按照 `(z, y, x)` 模式访问.
#[derive(Debug, Clone)]
pub struct VoxelVolume {
    data: Array3<i16>,
}

impl Index<Idx3d> for VoxelVolume {
    type Output = i16;

    /// 越界时 panic. 不希望 panic 时请使用 [`VoxelVolume::get`].
    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl VoxelVolume {
    /// 由扁平的 HU 数组创建体数据. `shape` 为 `(layers, height, width)`,
    /// `samples` 按 "x 最快, y 次之, z 最慢" 的顺序排列.
    ///
    /// 若 `samples.len()` 与 `shape` 不符则返回 [`CalcError::ShapeMismatch`].
    /// 体素个数超出 `usize` 时, `expected` 记为 `usize::MAX`.
    pub fn from_raw_vec(shape: Idx3d, samples: Vec<i16>) -> CalcResult<Self> {
        let expected = voxel_count(shape).unwrap_or(usize::MAX);
        if expected != samples.len() {
            return Err(CalcError::ShapeMismatch {
                expected,
                actual: samples.len(),
            });
        }
        let data = Array3::from_shape_vec(shape, samples).map_err(|_| CalcError::ShapeMismatch {
            expected,
            actual: expected,
        })?;
        debug_assert!(data.is_standard_layout());
        Ok(Self { data })
    }

    /// 创建所有体素都为 `hu` 的体数据.
    #[inline]
    pub fn filled(shape: Idx3d, hu: i16) -> Self {
        Self {
            data: Array3::from_elem(shape, hu),
        }
    }

    /// 以 `f(z, y, x)` 为每个体素赋值.
    #[inline]
    pub fn from_shape_fn<F: FnMut(Idx3d) -> i16>(shape: Idx3d, f: F) -> Self {
        Self {
            data: Array3::from_shape_fn(shape, f),
        }
    }

    /// 数据形状 `(layers, height, width)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 水平切片形状 `(height, width)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 层数 `L`.
    #[inline]
    pub fn layers(&self) -> usize {
        self.shape().0
    }

    /// 高 `H`.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().1
    }

    /// 宽 `W`.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().2
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否没有任何体素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 检查索引是否合法.
    #[inline]
    pub fn check(&self, (z0, y0, x0): Idx3d) -> bool {
        let (z, y, x) = self.shape();
        z0 < z && y0 < y && x0 < x
    }

    /// 获取 `pos` 处的 HU 值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<i16> {
        self.data.get(pos).copied()
    }

    /// 获取 `pos` 处的 HU 值. 越界时返回 [`CalcError::IndexOutOfBounds`].
    #[inline]
    pub fn try_get(&self, pos: Idx3d) -> CalcResult<i16> {
        self.get(pos).ok_or(CalcError::IndexOutOfBounds(pos))
    }

    /// `pos` 在扁平数组中的线性索引 `x + y * W + z * W * H`.
    /// 越界时返回 `None`.
    ///
    /// 这是整个 crate 中唯一进行线性索引运算的地方.
    #[inline]
    pub fn linear_index(&self, pos: Idx3d) -> Option<usize> {
        linear_index(self.shape(), pos)
    }

    /// 获取第 `z` 层水平切片视图. 越界时返回 `None`.
    #[inline]
    pub fn slice_at(&self, z: usize) -> Option<ArrayView2<'_, i16>> {
        (z < self.layers()).then(|| self.data.index_axis(Axis(0), z))
    }

    /// 获取能按升序迭代水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, i16>> {
        self.data.axis_iter(Axis(0))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, i16, Ix3> {
        self.data.view()
    }

    /// 按 "x 最快" 的顺序获得扁平样本.
    /// 当原始数据本身就是标准布局时, 可以避免一次 deepcopy.
    pub fn as_row_major_slice(&self) -> Cow<'_, [i16]> {
        match self.data.as_slice() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(self.data.iter().copied().collect()),
        }
    }

    /// 以 `window` 对第 `z` 层做窗口映射, 得到 8-bit 灰度切片.
    ///
    /// HU 定义域外的样本 (例如扫描仪填充的 -2048 或 -3024) 同样是合法数据,
    /// 它们按 [`HuWindow::eval_unchecked`] 映射为 0 或 255.
    ///
    /// `z` 越界时返回 [`CalcError::IndexOutOfBounds`].
    pub fn windowed_slice(&self, z: usize, window: &HuWindow) -> CalcResult<GraySlice> {
        let sli = self
            .slice_at(z)
            .ok_or(CalcError::IndexOutOfBounds((z, 0, 0)))?;
        let out: Array2<u8> = sli.map(|&hu| window.eval_unchecked(hu as i32));
        Ok(GraySlice::new(out))
    }
}

/// 形状为 `shape` 的体数据的体素个数. 溢出时返回 `None`.
#[inline]
pub(crate) fn voxel_count((z, h, w): Idx3d) -> Option<usize> {
    z.checked_mul(h)?.checked_mul(w)
}

/// 形状为 `shape` 的体数据中 `pos` 的线性索引. 越界时返回 `None`.
#[inline]
pub(crate) fn linear_index((lz, ly, lx): Idx3d, (z, y, x): Idx3d) -> Option<usize> {
    (z < lz && y < ly && x < lx).then(|| x + y * lx + z * lx * ly)
}
