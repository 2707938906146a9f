//! 程序运行函数.

use crate::profile::Profile;
use crate::result::{RegionSummary, RenderResult};
use ct_plan::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use utils::loader::{self, EnvError};

/// 预览渲染时绕区域质心旋转的角度 (弧度).
const PREVIEW_YAW: f64 = std::f64::consts::FRAC_PI_6;

/// 运行错误.
#[derive(Error, Debug)]
pub enum RunError {
    /// 运行参数错误.
    #[error(transparent)]
    Env(#[from] EnvError),

    /// 加载体数据失败.
    #[error(transparent)]
    Open(#[from] OpenVolumeError),

    /// 计算失败.
    #[error(transparent)]
    Calc(#[from] CalcError),

    /// 写出图像失败.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// 创建输出目录失败.
    #[error("cannot create output directory: {0}")]
    Io(#[from] io::Error),
}

/// 保存 `img` 到 `dir/name`, 并记录输出路径.
fn save_into<I: ImgWriteVis>(
    img: &I,
    dir: &Path,
    name: &str,
    outputs: &mut Vec<PathBuf>,
) -> Result<(), RunError> {
    let path = dir.join(name);
    img.save(&path)?;
    log::info!("wrote {}", path.display());
    outputs.push(path);
    Ok(())
}

/// 实际运行.
pub fn run() -> Result<RenderResult, RunError> {
    let mut profile = Profile::new();
    let mut outputs = Vec::with_capacity(6);

    let path = loader::raw_path_from_env_or_home()?;
    let shape = loader::shape_from_env()?;
    let threshold = loader::threshold_from_env()?;
    let (center, width) = loader::window_from_env()?;
    let hu_window = HuWindow::new(center, width)?;
    let out_dir = loader::out_dir_from_env();
    fs::create_dir_all(&out_dir)?;

    log::info!("loading {} as {shape:?}", path.display());
    let volume = profile.time("load", || VoxelVolume::open_raw(&path, shape))?;
    let layers = volume.layers();

    let z = loader::slice_from_env(layers)?;
    let sli = profile.time("window", || volume.windowed_slice(z, &hu_window))?;
    save_into(&sli, &out_dir, &format!("slice_{z:03}.png"), &mut outputs)?;

    let config = RenderConfig::default();
    let depth = profile.time("depth", || volume.depth_buffer(threshold, &config))?;
    save_into(&depth, &out_dir, "depth.png", &mut outputs)?;
    let shaded = profile.time("shade", || depth.shade(&config))?;
    save_into(&shaded, &out_dir, "shaded.png", &mut outputs)?;

    let region = match loader::seed_from_env()? {
        Some(seed) => Some(grow_and_preview(
            &volume,
            seed,
            threshold,
            &config,
            &out_dir,
            &mut profile,
            &mut outputs,
        )?),
        None => {
            log::info!("CT_SEED not set, skipping region growing");
            None
        }
    };

    Ok(RenderResult {
        shape: volume.shape(),
        hits: depth.hit_count(),
        region,
        outputs,
        profile: profile.finish(),
    })
}

/// 区域生长, 表面提取, 以及绕质心旋转后的重新投影预览.
fn grow_and_preview(
    volume: &VoxelVolume,
    seed: Idx3d,
    threshold: i16,
    config: &RenderConfig,
    out_dir: &Path,
    profile: &mut Profile,
    outputs: &mut Vec<PathBuf>,
) -> Result<RegionSummary, RunError> {
    let region = profile.time("grow", || volume.grow_region(seed, threshold))?;
    let surface = profile.time("surface", || region.surface_points())?;
    let centroid = region.centroid()?;
    log::info!(
        "region from {seed:?}: {} voxels, {} on the surface",
        region.member_count(),
        surface.len()
    );

    let layer = region.layer(seed.0)?;
    save_into(&layer, out_dir, &format!("region_{:03}.png", seed.0), outputs)?;

    let spin = RigidTransform::from_euler_about(0.0, 0.0, PREVIEW_YAW, &centroid);
    let preview = profile.time("reproject", || {
        DepthBuffer::from_points(
            surface.iter().copied(),
            &spin,
            volume.slice_shape(),
            volume.layers(),
            config,
        )
        .and_then(|d| d.shade(config))
    })?;
    save_into(&preview, out_dir, "region_rotated.png", outputs)?;

    Ok(RegionSummary {
        seed,
        members: region.member_count(),
        surface: surface.len(),
        centroid: (centroid.x, centroid.y, centroid.z),
    })
}
