//! 运行结果.

use crate::profile::Profile;
use std::io::{self, Write};
use std::path::PathBuf;

/// 区域生长的摘要.
#[derive(Clone, Debug)]
pub struct RegionSummary {
    /// 种子 `(z, y, x)`.
    pub seed: (usize, usize, usize),
    /// 成员体素个数.
    pub members: usize,
    /// 表面体素个数.
    pub surface: usize,
    /// 质心 `(x, y, z)`.
    pub centroid: (f64, f64, f64),
}

/// 一次渲染流程的最终结果.
#[derive(Debug)]
pub struct RenderResult {
    pub shape: (usize, usize, usize),
    pub hits: usize,
    pub region: Option<RegionSummary>,
    pub outputs: Vec<PathBuf>,
    pub profile: Profile,
}

/// 将 `r` 的结果写进 `w` 中.
fn describe_into<W: Write>(r: &RenderResult, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    let (l, h, wd) = r.shape;
    writeln!(w, "Volume: {l} layers of {h}x{wd}")?;
    writeln!(w, "{S4}Surface pixels in depth buffer: {} / {}", r.hits, h * wd)?;
    match &r.region {
        Some(reg) => {
            let (x, y, z) = reg.centroid;
            writeln!(w, "Region grown from {:?}:", reg.seed)?;
            writeln!(w, "{S4}Members: {}", reg.members)?;
            writeln!(w, "{S4}Surface voxels: {}", reg.surface)?;
            writeln!(w, "{S4}Centroid (x, y, z): ({x:.3}, {y:.3}, {z:.3})")?;
        }
        None => writeln!(w, "Region: / (set CT_SEED to grow one)")?,
    }
    writeln!(w, "Outputs:")?;
    for p in r.outputs.iter() {
        writeln!(w, "{S4}{}", p.display())?;
    }

    writeln!(w, "Timing:")?;
    for (name, d) in r.profile.stages() {
        writeln!(w, "{S4}{name}: {} us", d.as_micros())?;
    }
    writeln!(w, "{S4}Stage total: {} us", r.profile.get_stage_time_us())?;
    writeln!(w, "{S4}Total machine time: {} us", r.profile.get_real_time_us())?;
    match r.profile.get_most_time_consuming() {
        Some((name, d)) => write!(w, "{S4}Most time-consuming stage `{name}` costs {} us", d.as_micros()),
        None => write!(w, "{S4}Most time-consuming stage: /"),
    }
}

impl RenderResult {
    /// 打印运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        utils::sep_to(&mut lock)?;
        describe_into(self, &mut lock)?;
        writeln!(lock)?;
        utils::sep_to(&mut lock)
    }
}
