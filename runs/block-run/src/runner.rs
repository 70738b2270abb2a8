//! 程序运行函数.

use crate::result::BlockSummary;
use crate::Args;
use anyhow::{Context, Result};
use utils::loader;
use wedge_berry::prelude::*;
use wedge_berry::table::{read_rows_path, write_rows_path};

/// 实际运行.
pub fn run(args: &Args) -> Result<BlockSummary> {
    let base = match &args.base_path {
        Some(p) => p.clone(),
        None => loader::base_path_from_env_or_home().context("无法确定项目根目录")?,
    };
    anyhow::ensure!(base.is_dir(), "项目根目录 {base:?} 不存在");
    let (project_name, block) = (args.project.as_str(), args.block.as_str());

    let config = loader::pipeline_config(&base)?;
    let project_path = loader::project_config_path(&base, project_name);
    let project = ProjectConfig::from_path(&project_path)
        .with_context(|| format!("读取项目配置 {project_path:?} 失败"))?;

    let coords_path = loader::slide_coords_path(&base, project_name, block);
    let coords: Vec<SlideCoord> = read_rows_path(&coords_path)
        .with_context(|| format!("读取装置中心表 {coords_path:?} 失败"))?;
    let angles_path = loader::angles_path(&base, project_name, block);
    let angles: Vec<SampleAngle> = read_rows_path(&angles_path)
        .with_context(|| format!("读取参考角度表 {angles_path:?} 失败"))?;

    let regions_path = loader::regions_path(&base, project_name, block);
    let previous = if !args.fresh && regions_path.is_file() {
        log::info!("沿用历史区域表 {regions_path:?}");
        Some(read_region_table_path(&regions_path)?)
    } else {
        None
    };

    println!("Running block `{block}` of project `{project_name}`...");
    let report = Pipeline::new(config).run_block(
        &project,
        block,
        &coords,
        &angles,
        previous.as_deref(),
    )?;

    write_region_table_path(&regions_path, &report.regions)?;
    let analysis_path = loader::analysis_input_path(&base, project_name, block);
    write_rows_path(&analysis_path, format_for_analysis(&report.regions))?;
    log::info!("已写出 {regions_path:?} 和 {analysis_path:?}");

    Ok(BlockSummary::new(block, report))
}
