//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{window, HuWindow, OpenVolumeError, VoxelVolume};

pub use crate::align::{estimate, idx3d_to_point, point_to_idx3d, RigidTransform};
pub use crate::config::{NoHitDepth, RenderConfig};
pub use crate::error::{CalcError, CalcResult};
pub use crate::region::{RegionMap, RegionState};
pub use crate::render::{DepthBuffer, GraySlice, ImgWriteVis, ShadedImage};

pub use crate::consts::{DEFAULT_CENTER, DEFAULT_THRESHOLD, DEFAULT_WIDTH};
