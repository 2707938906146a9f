//! 原始 `.raw` 体数据文件加载.
//!
//! 文件是没有任何头部的扁平 `i16` (小端序) 数组, 按 "x 最快, y 次之, z 最慢"
//! 的顺序排列.

use super::{voxel_count, VoxelVolume};
use crate::Idx3d;
use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// 打开 `.raw` 体数据文件错误.
#[derive(Error, Debug)]
pub enum OpenVolumeError {
    /// 打开或读取文件失败.
    #[error("cannot open or read volume file: {0}")]
    FileOpen(#[from] io::Error),

    /// 文件大小与给定形状不符.
    #[error("volume file holds {actual} bytes, shape requires {expected}")]
    ShapeMismatch {
        /// 形状要求的字节数.
        expected: u64,
        /// 文件实际的字节数.
        actual: u64,
    },
}

impl VoxelVolume {
    /// 打开 `.raw` 格式的 3D CT 扫描. `shape` 为 `(layers, height, width)`.
    ///
    /// 文件大小必须恰好为 `layers * height * width * 2` 字节,
    /// 否则返回 [`OpenVolumeError::ShapeMismatch`]. 形状大到字节数溢出时, `expected` 记为 `u64::MAX`.
    pub fn open_raw<P: AsRef<Path>>(path: P, shape: Idx3d) -> Result<Self, OpenVolumeError> {
        let file = File::open(path.as_ref())?;
        let actual = file.metadata()?.len();
        let Some((len, expected)) = byte_len(shape) else {
            return Err(OpenVolumeError::ShapeMismatch {
                expected: u64::MAX,
                actual,
            });
        };
        if actual != expected {
            return Err(OpenVolumeError::ShapeMismatch { expected, actual });
        }
        log::debug!("loading {len} voxels of shape {shape:?} from {:?}", path.as_ref());

        let samples = read_samples(BufReader::new(file), len)?;
        // 长度已经检查过, 不会失败.
        VoxelVolume::from_raw_vec(shape, samples).map_err(|_| OpenVolumeError::ShapeMismatch {
            expected,
            actual,
        })
    }
}

/// 形状 `shape` 对应的 (体素个数, 字节数). 溢出时返回 `None`.
fn byte_len(shape: Idx3d) -> Option<(usize, u64)> {
    let len = voxel_count(shape)?;
    let bytes = len.checked_mul(std::mem::size_of::<i16>())?;
    Some((len, u64::try_from(bytes).ok()?))
}

/// 从 `reader` 中读取 `len` 个小端序 `i16`.
pub fn read_samples<R: Read>(mut reader: R, len: usize) -> io::Result<Vec<i16>> {
    let mut samples = vec![0i16; len];
    reader.read_i16_into::<LittleEndian>(&mut samples)?;
    Ok(samples)
}
