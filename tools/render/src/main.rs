//! 批量渲染工具.
//!
//! 读取 `.raw` 体数据, 输出窗口化切片, 深度图与着色图.
//! 设置 `CT_SEED` 后还会做区域生长, 并输出区域切片和旋转后的表面预览.

mod profile;
mod result;
mod runner;

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("cannot install logger: {e}");
    }

    let threads = utils::cpus();
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        log::warn!("cannot configure the global thread pool: {e}");
    }
    log::info!("running on {threads} threads");

    match runner::run() {
        Ok(r) => {
            if let Err(e) = r.analyze() {
                log::error!("cannot print the report: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
