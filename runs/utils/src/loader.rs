//! 项目目录约定. 提供更直接的配置与表格路径.
//!
//! ```text
//! {根目录}/{项目}/project.json
//! {根目录}/{项目}/{区块}/annotations/*.csv
//! ```

use std::env;
use std::path::{Path, PathBuf};
use wedge_berry::config::PipelineConfig;
use wedge_berry::error::TableResult;

/// 可选的流程配置文件名, 位于根目录下.
pub const PIPELINE_CONFIG: &str = "pipeline.json";

/// 获取项目根目录.
///
/// 1. 若环境变量 `$WEDGE_BASEPATH` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/wedge-projects`. 无法确定主目录时返回 `None`.
pub fn base_path_from_env_or_home() -> Option<PathBuf> {
    match env::var("WEDGE_BASEPATH") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dirs::home_dir().map(|h| h.join("wedge-projects")),
    }
}

/// 加载根目录 `base` 下的流程配置. 配置文件不存在时取默认值.
/// 无论配置文件如何填写, `base_path` 总是 `base`.
pub fn pipeline_config<P: AsRef<Path>>(base: P) -> TableResult<PipelineConfig> {
    let base = base.as_ref();
    let path = base.join(PIPELINE_CONFIG);
    let mut config = if path.is_file() {
        PipelineConfig::from_path(&path)?
    } else {
        PipelineConfig::default()
    };
    config.base_path = base.to_path_buf();
    Ok(config)
}

/// 项目配置文件路径.
#[inline]
pub fn project_config_path<P: AsRef<Path>>(base: P, project: &str) -> PathBuf {
    base.as_ref().join(project).join("project.json")
}

/// 区块的标注表所在目录.
#[inline]
pub fn annotations_dir<P: AsRef<Path>>(base: P, project: &str, block: &str) -> PathBuf {
    base.as_ref().join(project).join(block).join("annotations")
}

/// 整切片装置中心表.
#[inline]
pub fn slide_coords_path<P: AsRef<Path>>(base: P, project: &str, block: &str) -> PathBuf {
    annotations_dir(base, project, block).join("coords_slides.csv")
}

/// 样本参考角度表.
#[inline]
pub fn angles_path<P: AsRef<Path>>(base: P, project: &str, block: &str) -> PathBuf {
    annotations_dir(base, project, block).join("angles_coarse.csv")
}

/// 区域表.
#[inline]
pub fn regions_path<P: AsRef<Path>>(base: P, project: &str, block: &str) -> PathBuf {
    annotations_dir(base, project, block).join("coords_regions.csv")
}

/// 分析宿主输入表.
#[inline]
pub fn analysis_input_path<P: AsRef<Path>>(base: P, project: &str, block: &str) -> PathBuf {
    annotations_dir(base, project, block).join("analysis_input.csv")
}
