#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为 CT 引导的手术规划提供体数据处理引擎.
//!
//! 该 crate 目前仅提供 `safe` 接口, 所有可能因输入而失败的操作都返回 [`CalcResult`].
//!
//! # 约定
//!
//! 1. 体素索引一律为 `(z, y, x)`, 即 `(层, 高, 宽)`, 与内存中 "x 最快, y 次之, z 最慢" 的
//!   扁平布局一致.
//! 2. 浮点点集 (质心, 配准) 一律为物理坐标 `(x, y, z)`, 由 [`align::idx3d_to_point`] 转换.
//!
//! # 功能
//!
//! ### CT window 视图 ✅
//!
//! 将 CT HU 值按窗位/窗宽线性映射为 8-bit 灰度值.
//!
//! 实现位于 `ct-plan/src/data/window.rs`.
//!
//! ### 深度缓冲与表面着色 ✅
//!
//! 沿 z 轴寻找第一个不低于阈值的体素, 得到深度图;
//! 再以离散梯度估计法向, 渲染出带阴影的表面.
//!
//! 实现位于 `ct-plan/src/render`.
//!
//! ### 三维区域生长 ✅
//!
//! 从种子出发的 6-连通洪泛填充, 以及区域表面体素和质心提取.
//!
//! 实现位于 `ct-plan/src/region`.
//!
//! ### 刚体配准 ✅
//!
//! 基于 SVD 的 Kabsch 算法, 求解两组对应点之间的旋转与平移.
//!
//! 实现位于 `ct-plan/src/align`.
//!
//! # Features
//!
//! - `rayon`: 深度提取与着色按行并行计算.
//! - `serde`: 配置与值类型可序列化.
//! - `full` (默认): 以上全部.

/// 二维索引 `(y, x)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, y, x)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT 体数据基础数据结构.
mod data;

pub use data::{diamond_neighbours, window, Diamond, HuWindow, OpenVolumeError, VoxelVolume};

pub mod align;
pub mod config;
pub mod consts;
pub mod error;
pub mod region;
pub mod render;

pub use align::{estimate, RigidTransform};
pub use config::{NoHitDepth, RenderConfig};
pub use error::{CalcError, CalcResult};
pub use region::{RegionMap, RegionState};
pub use render::{DepthBuffer, GraySlice, ImgWriteVis, ShadedImage};

pub mod prelude;
