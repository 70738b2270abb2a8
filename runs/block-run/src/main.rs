//! 对单个区块执行提取流程, 写出合并后的区域表和分析宿主输入表.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod result;
mod runner;

/// Extract device-well wedge regions for one block
#[derive(Parser, Debug)]
#[command(name = "block-run")]
#[command(about = "Extract wedge regions for one block of a project", long_about = None)]
pub struct Args {
    /// Project name
    pub project: String,

    /// Block name
    pub block: String,

    /// Projects root directory (defaults to $WEDGE_BASEPATH or ~/wedge-projects)
    #[arg(short, long)]
    pub base_path: Option<PathBuf>,

    /// Ignore the previously saved region table
    #[arg(long)]
    pub fresh: bool,

    /// Worker threads (defaults to the number of available cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let jobs = args.jobs.unwrap_or_else(utils::cpus);
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()?;
    log::debug!("使用 {jobs} 个工作线程");

    let summary = runner::run(&args)?;
    summary.analyze();

    if !summary.is_complete() {
        anyhow::bail!("{} extraction job(s) failed", summary.failed());
    }
    Ok(())
}
