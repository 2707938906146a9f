//! 对 `ct-plan` 的更一层封装. 从环境变量读取体数据路径与运行参数.

use ct_plan::consts::{DEFAULT_CENTER, DEFAULT_THRESHOLD, DEFAULT_WIDTH};
use ct_plan::Idx3d;
use itertools::Itertools;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// 默认体数据形状 `(layers, height, width)`.
pub const DEFAULT_SHAPE: Idx3d = (130, 512, 512);

/// 环境变量解析错误.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// 变量存在但无法解析.
    #[error("cannot parse ${key}={value:?}")]
    Parse {
        /// 变量名.
        key: &'static str,
        /// 原始值.
        value: String,
    },

    /// 无法确定用户主目录.
    #[error("cannot determine the home directory")]
    NoHome,
}

/// 以 `$HOME` 为基准, 拼接 `$HOME/dataset/<..>` 路径.
pub fn home_dataset_dir_with<I, S>(segments: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::path::Path>,
{
    let mut p = dirs::home_dir()?.join("dataset");
    p.extend(segments);
    Some(p)
}

/// 获取 `.raw` 体数据路径.
///
/// 1. 若环境变量 `$CT_RAW_PATH` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/ct/volume.raw`.
pub fn raw_path_from_env_or_home() -> Result<PathBuf, EnvError> {
    match env::var("CT_RAW_PATH") {
        Ok(p) if !p.is_empty() => Ok(PathBuf::from(p)),
        _ => home_dataset_dir_with(["ct", "volume.raw"]).ok_or(EnvError::NoHome),
    }
}

/// 获取输出目录. 默认为当前目录下的 `out`.
pub fn out_dir_from_env() -> PathBuf {
    env::var_os("CT_OUT_DIR").map_or_else(|| PathBuf::from("out"), PathBuf::from)
}

/// 读取并解析环境变量 `key`. 变量不存在时返回 `None`.
fn parse_env<T, F>(key: &'static str, parse: F) -> Result<Option<T>, EnvError>
where
    F: FnOnce(&str) -> Option<T>,
{
    match env::var(key) {
        Ok(value) => parse(value.trim())
            .map(Some)
            .ok_or(EnvError::Parse { key, value }),
        Err(_) => Ok(None),
    }
}

#[inline]
fn scalar<T: FromStr>(s: &str) -> Option<T> {
    s.parse().ok()
}

/// 解析 `a<sep>b<sep>c` 形式的三元组.
fn parse_triple(s: &str, sep: char) -> Option<Idx3d> {
    s.split(sep)
        .map(|t| t.trim().parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .collect_tuple()
}

/// 解析 `LxHxW` 形式的形状.
pub fn parse_shape(s: &str) -> Option<Idx3d> {
    parse_triple(s, 'x')
}

/// 解析 `z,y,x` 形式的种子索引.
pub fn parse_seed(s: &str) -> Option<Idx3d> {
    parse_triple(s, ',')
}

/// 体数据形状. 读取 `$CT_SHAPE`, 默认为 [`DEFAULT_SHAPE`].
pub fn shape_from_env() -> Result<Idx3d, EnvError> {
    Ok(parse_env("CT_SHAPE", parse_shape)?.unwrap_or(DEFAULT_SHAPE))
}

/// 阈值. 读取 `$CT_THRESHOLD`, 默认为 300 HU.
pub fn threshold_from_env() -> Result<i16, EnvError> {
    Ok(parse_env("CT_THRESHOLD", scalar)?.unwrap_or(DEFAULT_THRESHOLD))
}

/// 窗位与窗宽. 读取 `$CT_CENTER` 与 `$CT_WIDTH`, 默认为 0 / 1200.
///
/// 这里只负责解析; 取值是否合法由 `HuWindow::new` 判断.
pub fn window_from_env() -> Result<(i32, i32), EnvError> {
    let center = parse_env("CT_CENTER", scalar)?.unwrap_or(DEFAULT_CENTER);
    let width = parse_env("CT_WIDTH", scalar)?.unwrap_or(DEFAULT_WIDTH);
    Ok((center, width))
}

/// 要输出的切片层. 读取 `$CT_SLICE`, 默认为中间层.
pub fn slice_from_env(layers: usize) -> Result<usize, EnvError> {
    Ok(parse_env("CT_SLICE", scalar)?.unwrap_or(layers / 2))
}

/// 区域生长种子. 读取 `$CT_SEED`, 未设置时不做区域生长.
pub fn seed_from_env() -> Result<Option<Idx3d>, EnvError> {
    parse_env("CT_SEED", parse_seed)
}
